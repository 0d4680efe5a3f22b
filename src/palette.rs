// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use log::{debug, warn};
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::{Chunk, DecodeConfig, Error, IffFile, IffReader, RawRecord, Result, Tag};

/// 256 RGB colours, addressed by the one-byte indices of a `PXLS` chunk.
#[derive(Clone, PartialEq, Eq)]
pub struct Palette {
    entries: [[u8; 3]; 256],
}

impl Palette {
    /// Size of a complete `CMAP` payload.
    pub const CMAP_LEN: usize = 256 * 3;

    /// The fallback palette: entry `i` is `(i, i, i)`.
    pub const fn grayscale() -> Self {
        let mut entries = [[0u8; 3]; 256];
        let mut i = 0;
        while i < 256 {
            entries[i] = [i as u8; 3];
            i += 1;
        }
        Self { entries }
    }

    /// Palette from `CMAP` bytes. Entries past the end of a short map stay
    /// black; bytes past 768 are ignored.
    pub fn from_cmap(data: &[u8]) -> Self {
        if data.len() < Self::CMAP_LEN {
            warn!("CMAP holds {} bytes, expected {}", data.len(), Self::CMAP_LEN);
        }
        let mut entries = [[0u8; 3]; 256];
        for (entry, rgb) in entries.iter_mut().zip(data.chunks_exact(3)) {
            entry.copy_from_slice(rgb);
        }
        Self { entries }
    }

    pub fn entry(&self, index: u8) -> [u8; 3] {
        self.entries[usize::from(index)]
    }

    pub fn entries(&self) -> &[[u8; 3]; 256] {
        &self.entries
    }

    pub fn to_cmap(&self) -> Vec<u8> {
        self.entries.iter().flatten().copied().collect()
    }

    /// Parse a palette file: a `PAL ` form holding a `CMAP` chunk.
    pub fn read<T: Read>(src: T) -> Result<Self> {
        Self::read_with_config(src, &DecodeConfig::default())
    }

    pub fn read_with_config<T: Read>(src: T, config: &DecodeConfig) -> Result<Self> {
        let mut reader = IffReader::with_config(src, config);
        let header = match reader.read_header()? {
            Some(RawRecord::Form(h)) if h.tag == Tag::PAL => h,
            Some(other) => {
                return Err(Error::SchemaMismatch {
                    expected: "PAL form",
                    found: other.tag(),
                    offset: other.offset(),
                });
            },
            None => return Err(Error::TruncatedInput { offset: 0 }),
        };

        while reader.offset() < header.end() {
            match reader.read_header()?.ok_or(Error::TruncatedInput { offset: header.offset })? {
                RawRecord::Chunk(c) if c.tag == Tag::CMAP => return Ok(Self::from_cmap(c.data())),
                RawRecord::Form(child) => reader.skip_form_content(&child)?,
                RawRecord::Chunk(c) => debug!("chunk '{}' in palette file (skipped)", c.tag),
            }
        }

        Err(Error::SchemaMismatch { expected: "CMAP chunk", found: header.tag, offset: header.offset })
    }

    /// A palette file for this palette.
    pub fn to_iff(&self) -> IffFile {
        let mut file = IffFile::new(Tag::PAL);
        file.root_form_mut().add_member(self.cmap_chunk());
        file
    }

    pub(crate) fn cmap_chunk(&self) -> Chunk {
        Chunk::from_payload(Tag::CMAP, self.to_cmap())
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::grayscale()
    }
}

impl std::fmt::Debug for Palette {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if *self == Self::grayscale() {
            return f.write_str("Palette(grayscale)");
        }
        f.debug_struct("Palette").field("first", &self.entries[0]).field("last", &self.entries[255]).finish()
    }
}

/// Finds the file behind a `NAME` palette reference.
///
/// `image_path` is the MAT file being decoded and `file_name` the
/// lower-cased palette file name (e.g. `space.pal`).
pub trait PaletteLocator {
    fn locate(&self, image_path: &Path, file_name: &str) -> Option<PathBuf>;
}

impl<F> PaletteLocator for F
where
    F: Fn(&Path, &str) -> Option<PathBuf>,
{
    fn locate(&self, image_path: &Path, file_name: &str) -> Option<PathBuf> {
        self(image_path, file_name)
    }
}

/// Looks for palettes in a directory next to the image's own directory.
///
/// For `game/mat/ship.mat` and the default directory name this searches
/// `game/pal/`, matching both the directory and the file name without
/// regard to ASCII case. When no such directory exists, `game/` itself is
/// searched.
#[derive(Debug, Clone)]
pub struct SiblingPaletteDir {
    dir_name: String,
}

impl SiblingPaletteDir {
    pub fn new(dir_name: impl Into<String>) -> Self {
        Self { dir_name: dir_name.into() }
    }
}

impl Default for SiblingPaletteDir {
    fn default() -> Self {
        Self::new("pal")
    }
}

impl PaletteLocator for SiblingPaletteDir {
    fn locate(&self, image_path: &Path, file_name: &str) -> Option<PathBuf> {
        let image_dir = image_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let parent = image_dir.join("..");
        let search_dir = find_entry(&parent, &self.dir_name, true).unwrap_or(parent);
        debug!("looking for '{file_name}' in {}", search_dir.display());
        find_entry(&search_dir, file_name, false)
    }
}

/// Entry of `dir` named `name` ignoring ASCII case, if it is a directory
/// (`want_dir`) or a regular file.
fn find_entry(dir: &Path, name: &str, want_dir: bool) -> Option<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            debug!("cannot list {}: {err}", dir.display());
            return None;
        },
    };
    entries.filter_map(|e| e.ok()).find_map(|entry| {
        let matches = entry.file_name().to_str().is_some_and(|n| n.eq_ignore_ascii_case(name));
        let path = entry.path();
        let kind_ok = if want_dir { path.is_dir() } else { path.is_file() };
        (matches && kind_ok).then_some(path)
    })
}

#[test]
fn grayscale_ramp() {
    let gray = Palette::grayscale();
    assert_eq!(gray.entry(0), [0, 0, 0]);
    assert_eq!(gray.entry(128), [128, 128, 128]);
    assert_eq!(gray.entry(255), [255, 255, 255]);
    assert_eq!(gray, Palette::default());
}

#[test]
fn short_cmap_is_black_filled() {
    let pal = Palette::from_cmap(&[1, 2, 3, 4, 5, 6, 7]);
    assert_eq!(pal.entry(0), [1, 2, 3]);
    assert_eq!(pal.entry(1), [4, 5, 6]);
    assert_eq!(pal.entry(2), [0, 0, 0]);
}

#[test]
fn palette_file_round_trip() {
    let mut cmap = Palette::grayscale().to_cmap();
    cmap[3..6].copy_from_slice(&[255, 0, 0]);
    let pal = Palette::from_cmap(&cmap);
    let bytes = pal.to_iff().serialize().unwrap();
    assert_eq!(&bytes[..12], b"FORM\x00\x00\x03\x0cPAL ");
    assert_eq!(Palette::read(&bytes[..]).unwrap(), pal);
}

#[test]
fn palette_file_needs_pal_root() {
    let file = IffFile::new(Tag::BITM).serialize().unwrap();
    match Palette::read(&file[..]) {
        Err(Error::SchemaMismatch { found, offset, .. }) => {
            assert_eq!(found, Tag::BITM);
            assert_eq!(offset, 0);
        },
        other => panic!("unexpected {other:?}"),
    }
    let empty = IffFile::new(Tag::PAL).serialize().unwrap();
    assert!(matches!(Palette::read(&empty[..]), Err(Error::SchemaMismatch { expected: "CMAP chunk", .. })));
}

#[test]
fn closure_locator() {
    let locator = |_: &Path, name: &str| Some(PathBuf::from(format!("/palettes/{name}")));
    assert_eq!(
        locator.locate(Path::new("a/b.mat"), "space.pal"),
        Some(PathBuf::from("/palettes/space.pal"))
    );
}
