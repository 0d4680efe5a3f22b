//! MAT textures: palette images stored in an IFF container.
//!
//! ```text
//! FORM BITM
//!   FORM FRAM
//!     INFO   width: u32 LE, height: u32 LE
//!     FORM PAL
//!       CMAP 256 RGB triples, or
//!       NAME name of an external palette file
//!     PXLS   one palette index per pixel
//!     ALPH   one inverted alpha byte per pixel (optional)
//! ```

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use log::{debug, trace, warn};
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::palette::{Palette, PaletteLocator, SiblingPaletteDir};
use crate::reader::{FormHeader, IffReader, RawChunk, RawRecord};
use crate::{Chunk, DecodeConfig, Error, Form, IffFile, Result, Tag, ToU64, TryVec};

/// Where the colours of a decoded image came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaletteOrigin {
    /// A `CMAP` chunk inside the image.
    Inline,
    /// A palette file found through a `NAME` chunk.
    External(PathBuf),
    /// No usable palette; indices were used as gray levels.
    Grayscale,
}

/// A decoded MAT image: tightly packed RGBA rows, top row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    origin: PaletteOrigin,
}

impl MatImage {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// `width * height * 4` bytes of RGBA.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = (u64::from(y) * u64::from(self.width) + u64::from(x)) * 4;
        let start = usize::try_from(start).ok()?;
        self.pixels.get(start..start + 4)?.try_into().ok()
    }

    pub fn palette_origin(&self) -> &PaletteOrigin {
        &self.origin
    }

    /// The same image with its rows in reverse order.
    pub fn flip_vertical(&self) -> Self {
        let stride = self.pixels.len() / self.height.max(1) as usize;
        let pixels = if stride == 0 {
            self.pixels.clone()
        } else {
            self.pixels.chunks_exact(stride).rev().flatten().copied().collect()
        };
        Self { pixels, ..self.clone() }
    }
}

/// Configurable MAT decoder.
///
/// `NAME` palettes are resolved through the locator, relative to the
/// image path. Without an image path they cannot be resolved and the
/// image falls back to grayscale.
pub struct MatDecoder<'a> {
    config: DecodeConfig,
    locator: Box<dyn PaletteLocator + 'a>,
    image_path: Option<PathBuf>,
}

impl Default for MatDecoder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> MatDecoder<'a> {
    pub fn new() -> Self {
        Self {
            config: DecodeConfig::default(),
            locator: Box::new(SiblingPaletteDir::default()),
            image_path: None,
        }
    }

    pub fn with_config(mut self, config: DecodeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_locator(mut self, locator: impl PaletteLocator + 'a) -> Self {
        self.locator = Box::new(locator);
        self
    }

    /// Path of the image being decoded, used to find external palettes.
    pub fn with_image_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.image_path = Some(path.into());
        self
    }

    pub fn decode<T: Read>(&self, src: T) -> Result<MatImage> {
        self.decode_at(src, self.image_path.as_deref())
    }

    /// Read the whole file at `path`, close it, then decode it with `path`
    /// as the image path.
    pub fn decode_file<P: AsRef<Path>>(&self, path: P) -> Result<MatImage> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        debug!("decoding {} ({} bytes)", path.display(), bytes.len());
        self.decode_at(&bytes[..], Some(path))
    }

    fn decode_at<T: Read>(&self, src: T, image_path: Option<&Path>) -> Result<MatImage> {
        let mut reader = IffReader::with_config(src, &self.config);

        let bitm = match reader.read_header()? {
            Some(RawRecord::Form(h)) if h.tag == Tag::BITM => h,
            Some(other) => return Err(mismatch("BITM form", &other)),
            None => return Err(Error::TruncatedInput { offset: 0 }),
        };
        if reader.offset() >= bitm.end() {
            return Err(Error::SchemaMismatch { expected: "FRAM form", found: bitm.tag, offset: bitm.offset });
        }
        let fram = match reader.read_header()?.ok_or(Error::TruncatedInput { offset: bitm.offset })? {
            RawRecord::Form(h) if h.tag == Tag::FRAM => h,
            other => return Err(mismatch("FRAM form", &other)),
        };
        if fram.end() > bitm.end() {
            return Err(Error::InvalidData("child record overruns its form"));
        }

        let frame = self.scan_frame(&mut reader, &fram, image_path)?;

        if reader.offset() < bitm.end() {
            return Err(match reader.read_header()? {
                Some(other) => mismatch("end of BITM form", &other),
                None => Error::TruncatedInput { offset: bitm.offset },
            });
        }

        frame.compose(&self.config, &fram)
    }

    /// Collect the frame's records; decoding waits until all are seen.
    fn scan_frame<T: Read>(
        &self,
        reader: &mut IffReader<T>,
        fram: &FormHeader,
        image_path: Option<&Path>,
    ) -> Result<Frame> {
        let mut frame = Frame::default();
        while reader.offset() < fram.end() {
            let record = reader.read_header()?.ok_or(Error::TruncatedInput { offset: fram.offset })?;
            match record {
                RawRecord::Chunk(c) if c.tag == Tag::INFO => {
                    let mut values = c.values();
                    let (width, height) = (values.read_u32()?, values.read_u32()?);
                    self.config.validate_total_megapixels(width, height)?;
                    self.config.validate_allocation(pixel_bytes(width, height)?)?;
                    trace!("INFO {width}x{height}");
                    frame.dimensions = Some((width, height));
                },
                RawRecord::Chunk(c) if c.tag == Tag::PXLS => {
                    frame.indices = Some(self.plane(&frame, c, "one PXLS byte per pixel")?);
                },
                RawRecord::Chunk(c) if c.tag == Tag::ALPH => {
                    frame.alpha = Some(self.plane(&frame, c, "one ALPH byte per pixel")?);
                },
                RawRecord::Form(h) if h.tag == Tag::PAL => {
                    frame.palette = Some(self.read_palette(reader, &h, image_path)?);
                },
                RawRecord::Form(h) => {
                    debug!("form '{}' in FRAM (skipped)", h.tag);
                    reader.skip_form_content(&h)?;
                },
                RawRecord::Chunk(c) => debug!("chunk '{}' in FRAM (skipped)", c.tag),
            }
        }
        if reader.offset() > fram.end() {
            return Err(Error::InvalidData("child record overruns its form"));
        }
        Ok(frame)
    }

    /// Check a per-pixel chunk against the dimensions from `INFO`.
    fn plane(&self, frame: &Frame, chunk: RawChunk, expected: &'static str) -> Result<TryVec<u8>> {
        let Some((width, height)) = frame.dimensions else {
            return Err(Error::SchemaMismatch { expected: "INFO chunk", found: chunk.tag, offset: chunk.offset });
        };
        let count = u64::from(width) * u64::from(height);
        if u64::from(chunk.length) != count {
            if !self.config.lenient {
                return Err(Error::SchemaMismatch { expected, found: chunk.tag, offset: chunk.offset });
            }
            warn!("'{}' holds {} bytes for {count} pixels", chunk.tag, chunk.length);
        }
        Ok(chunk.data)
    }

    /// First resolvable `CMAP` or `NAME` child of a `PAL ` form, else grayscale.
    fn read_palette<T: Read>(
        &self,
        reader: &mut IffReader<T>,
        pal: &FormHeader,
        image_path: Option<&Path>,
    ) -> Result<(Palette, PaletteOrigin)> {
        let mut found = None;
        while reader.offset() < pal.end() {
            match reader.read_header()?.ok_or(Error::TruncatedInput { offset: pal.offset })? {
                RawRecord::Form(h) => reader.skip_form_content(&h)?,
                RawRecord::Chunk(_) if found.is_some() => {},
                RawRecord::Chunk(c) if c.tag == Tag::CMAP => {
                    found = Some((Palette::from_cmap(c.data()), PaletteOrigin::Inline));
                },
                RawRecord::Chunk(c) if c.tag == Tag::NAME => {
                    found = self.load_named(c.data(), image_path);
                },
                RawRecord::Chunk(c) => debug!("chunk '{}' in PAL (skipped)", c.tag),
            }
        }
        Ok(found.unwrap_or_else(|| {
            warn!("no usable palette in form at {}, using grayscale", pal.offset);
            (Palette::grayscale(), PaletteOrigin::Grayscale)
        }))
    }

    fn load_named(&self, name: &[u8], image_path: Option<&Path>) -> Option<(Palette, PaletteOrigin)> {
        let Some(file_name) = palette_file_name(name) else {
            warn!("unusable palette name {name:?}");
            return None;
        };
        let Some(image_path) = image_path else {
            warn!("no image path to resolve '{file_name}' against");
            return None;
        };
        let Some(path) = self.locator.locate(image_path, &file_name) else {
            warn!("palette '{file_name}' not found for {}", image_path.display());
            return None;
        };
        let palette = std::fs::read(&path)
            .map_err(Error::from)
            .and_then(|bytes| Palette::read_with_config(&bytes[..], &self.config));
        match palette {
            Ok(palette) => {
                debug!("palette '{file_name}' from {}", path.display());
                Some((palette, PaletteOrigin::External(path)))
            },
            Err(err) => {
                warn!("unreadable palette {}: {err}", path.display());
                None
            },
        }
    }
}

#[derive(Default)]
struct Frame {
    dimensions: Option<(u32, u32)>,
    palette: Option<(Palette, PaletteOrigin)>,
    indices: Option<TryVec<u8>>,
    alpha: Option<TryVec<u8>>,
}

impl Frame {
    fn compose(self, config: &DecodeConfig, fram: &FormHeader) -> Result<MatImage> {
        let (width, height) = self
            .dimensions
            .ok_or(Error::SchemaMismatch { expected: "INFO chunk", found: fram.tag, offset: fram.offset })?;
        let (palette, origin) = self.palette.unwrap_or_else(|| (Palette::grayscale(), PaletteOrigin::Grayscale));

        let len = pixel_bytes(width, height)?;
        config.validate_allocation(len)?;
        let len = usize::try_from(len)?;
        let mut pixels = std::vec::Vec::new();
        pixels.try_reserve_exact(len).map_err(|_| Error::OutOfMemory)?;
        pixels.resize(len, 0);

        if let Some(indices) = &self.indices {
            for (px, &index) in pixels.chunks_exact_mut(4).zip(indices.iter()) {
                px[..3].copy_from_slice(&palette.entry(index));
                px[3] = if index == 0 { 0 } else { 255 };
            }
        }
        if let Some(alpha) = &self.alpha {
            for (px, &a) in pixels.chunks_exact_mut(4).zip(alpha.iter()) {
                px[3] = 255 - a;
            }
        }

        Ok(MatImage { width, height, pixels, origin })
    }
}

fn pixel_bytes(width: u32, height: u32) -> Result<u64> {
    u64::from(width)
        .checked_mul(u64::from(height))
        .and_then(|n| n.checked_mul(4))
        .ok_or(Error::InvalidData("dimension overflow"))
}

fn mismatch(expected: &'static str, found: &RawRecord) -> Error {
    Error::SchemaMismatch { expected, found: found.tag(), offset: found.offset() }
}

/// `" Space\0"` becomes `space.pal`.
fn palette_file_name(name: &[u8]) -> Option<String> {
    let name = std::str::from_utf8(name).ok().filter(|s| s.is_ascii())?;
    let name = name.trim_matches(&[' ', '\0', '\t'][..]);
    if name.is_empty() {
        return None;
    }
    Some(format!("{}.pal", name.to_ascii_lowercase()))
}

/// Decode a MAT image with default limits and palette lookup.
///
/// A `NAME` palette cannot be found without a path; use
/// [`read_mat_file`] or [`MatDecoder::with_image_path`] for those.
pub fn read_mat<T: Read>(f: &mut T) -> Result<MatImage> {
    MatDecoder::new().decode(f)
}

/// Decode the MAT file at `path`, looking for named palettes next to it.
pub fn read_mat_file<P: AsRef<Path>>(path: P) -> Result<MatImage> {
    MatDecoder::new().decode_file(path)
}

/// Palette to store in an encoded MAT.
#[derive(Debug, Clone, Copy)]
pub enum MatPalette<'a> {
    /// Embed the colours as a `CMAP` chunk.
    Inline(&'a Palette),
    /// Refer to an external palette file by name.
    Named(&'a str),
}

/// Build a MAT file from palette indices and optional opacity values.
///
/// `alpha` holds plain opacity (255 is opaque); it is stored inverted.
pub fn build_mat(
    width: u32,
    height: u32,
    palette: MatPalette<'_>,
    indices: &[u8],
    alpha: Option<&[u8]>,
) -> Result<IffFile> {
    let count = u64::from(width) * u64::from(height);
    if indices.len().to_u64() != count {
        return Err(Error::InvalidData("pixel indices do not match the image size"));
    }
    if alpha.is_some_and(|a| a.len().to_u64() != count) {
        return Err(Error::InvalidData("alpha values do not match the image size"));
    }

    let mut pal = Form::new(Tag::PAL);
    match palette {
        MatPalette::Inline(colours) => pal.add_member(colours.cmap_chunk()),
        MatPalette::Named(name) => pal.add_member(Chunk::with_members(Tag::NAME, [name])?),
    }

    let mut fram = Form::new(Tag::FRAM);
    fram.add_member(Chunk::with_members(Tag::INFO, [width, height])?);
    fram.add_member(pal);
    fram.add_member(Chunk::from_payload(Tag::PXLS, indices.to_vec()));
    if let Some(alpha) = alpha {
        fram.add_member(Chunk::from_payload(Tag::ALPH, alpha.iter().map(|a| 255 - a).collect()));
    }

    let mut file = IffFile::new(Tag::BITM);
    file.root_form_mut().add_member(fram);
    Ok(file)
}

#[cfg(test)]
use crate::Record;

#[cfg(test)]
fn red_at_one() -> Palette {
    let mut cmap = Palette::grayscale().to_cmap();
    cmap[3..6].copy_from_slice(&[255, 0, 0]);
    Palette::from_cmap(&cmap)
}

#[cfg(test)]
fn mat_bytes(children: std::vec::Vec<Record>) -> std::vec::Vec<u8> {
    let fram = Form::with_members(Tag::FRAM, children);
    Form::with_members(Tag::BITM, [fram]).serialize().unwrap()
}

#[cfg(test)]
fn info(width: i32, height: i32) -> Record {
    Chunk::with_members(Tag::INFO, [width, height]).unwrap().into()
}

#[cfg(test)]
fn raw(tag: Tag, data: &[u8]) -> Record {
    Chunk::from_payload(tag, data.to_vec()).into()
}

#[cfg(test)]
fn inline_pal(palette: &Palette) -> Record {
    Form::with_members(Tag::PAL, [palette.cmap_chunk()]).into()
}

#[test]
fn two_pixel_image() {
    let data = mat_bytes(vec![info(2, 1), inline_pal(&red_at_one()), raw(Tag::PXLS, &[0, 1])]);
    let image = read_mat(&mut &data[..]).unwrap();
    assert_eq!((image.width(), image.height()), (2, 1));
    assert_eq!(image.pixels(), &[0, 0, 0, 0, 255, 0, 0, 255]);
    assert_eq!(image.palette_origin(), &PaletteOrigin::Inline);

    let data = mat_bytes(vec![
        info(2, 1),
        inline_pal(&red_at_one()),
        raw(Tag::PXLS, &[0, 1]),
        raw(Tag::ALPH, &[255, 0]),
    ]);
    let image = read_mat(&mut &data[..]).unwrap();
    assert_eq!(image.pixel(0, 0), Some([0, 0, 0, 0]));
    assert_eq!(image.pixel(1, 0), Some([255, 0, 0, 255]));
    assert_eq!(image.pixel(2, 0), None);
}

#[test]
fn alpha_wins_regardless_of_order() {
    let data = mat_bytes(vec![
        info(2, 1),
        raw(Tag::ALPH, &[0, 200]),
        inline_pal(&red_at_one()),
        raw(Tag::PXLS, &[0, 1]),
    ]);
    let image = read_mat(&mut &data[..]).unwrap();
    assert_eq!(image.pixels(), &[0, 0, 0, 255, 255, 0, 0, 55]);
}

#[test]
fn missing_palette_is_grayscale() {
    let data = mat_bytes(vec![info(1, 1), raw(Tag::PXLS, &[77])]);
    let image = read_mat(&mut &data[..]).unwrap();
    assert_eq!(image.pixels(), &[77, 77, 77, 255]);
    assert_eq!(image.palette_origin(), &PaletteOrigin::Grayscale);
}

#[test]
fn named_palette_without_path_is_grayscale() {
    let name = Chunk::with_members(Tag::NAME, ["space"]).unwrap();
    let pal = Form::with_members(Tag::PAL, [name]);
    let data = mat_bytes(vec![info(1, 1), pal.into(), raw(Tag::PXLS, &[9])]);
    let image = read_mat(&mut &data[..]).unwrap();
    assert_eq!(image.pixels(), &[9, 9, 9, 255]);
    assert_eq!(image.palette_origin(), &PaletteOrigin::Grayscale);
}

#[test]
fn named_palette_through_locator() {
    let dir = tempfile::tempdir().unwrap();
    let pal_path = dir.path().join("Space.PAL");
    red_at_one().to_iff().write_file(&pal_path).unwrap();
    let expected = pal_path.clone();
    let locator = move |_: &Path, name: &str| {
        assert_eq!(name, "space.pal");
        Some(expected.clone())
    };

    let name = Chunk::with_members(Tag::NAME, [" Space\t"]).unwrap();
    let pal = Form::with_members(Tag::PAL, [name]);
    let data = mat_bytes(vec![info(1, 1), pal.into(), raw(Tag::PXLS, &[1])]);
    let image = MatDecoder::new()
        .with_locator(locator)
        .with_image_path("textures/ship.mat")
        .decode(&data[..])
        .unwrap();
    assert_eq!(image.pixels(), &[255, 0, 0, 255]);
    assert_eq!(image.palette_origin(), &PaletteOrigin::External(pal_path));
}

#[test]
fn pixels_need_info_first() {
    let data = mat_bytes(vec![raw(Tag::PXLS, &[0, 1]), info(2, 1)]);
    match read_mat(&mut &data[..]) {
        Err(Error::SchemaMismatch { expected, found, offset }) => {
            assert_eq!(expected, "INFO chunk");
            assert_eq!(found, Tag::PXLS);
            assert_eq!(offset, 24);
        },
        other => panic!("unexpected {other:?}"),
    }
    let data = mat_bytes(vec![inline_pal(&red_at_one())]);
    assert!(matches!(
        read_mat(&mut &data[..]),
        Err(Error::SchemaMismatch { expected: "INFO chunk", found: Tag::FRAM, offset: 12 })
    ));
}

#[test]
fn alpha_needs_info_first() {
    let data = mat_bytes(vec![raw(Tag::ALPH, &[0, 0]), info(2, 1)]);
    assert!(matches!(
        read_mat(&mut &data[..]),
        Err(Error::SchemaMismatch { expected: "INFO chunk", found: Tag::ALPH, offset: 24 })
    ));
}

#[test]
fn frame_must_fit_in_bitmap() {
    let mut data = mat_bytes(vec![info(1, 1), raw(Tag::PXLS, &[1])]);
    // BITM now covers only the FRAM header.
    data[4..8].copy_from_slice(&16u32.to_be_bytes());
    assert!(matches!(read_mat(&mut &data[..]), Err(Error::InvalidData(_))));
}

#[test]
fn wrong_layout_is_rejected() {
    let data = Form::new(Tag::PAL).serialize().unwrap();
    assert!(matches!(
        read_mat(&mut &data[..]),
        Err(Error::SchemaMismatch { expected: "BITM form", found: Tag::PAL, offset: 0 })
    ));

    let data = Form::with_members(Tag::BITM, [Chunk::new(Tag::INFO)]).serialize().unwrap();
    assert!(matches!(
        read_mat(&mut &data[..]),
        Err(Error::SchemaMismatch { expected: "FRAM form", found: Tag::INFO, offset: 12 })
    ));

    let fram = Form::with_members(Tag::FRAM, [info(1, 1)]);
    let data = Form::with_members(Tag::BITM, [Record::from(fram), Chunk::new(Tag::NAME).into()])
        .serialize()
        .unwrap();
    assert!(matches!(
        read_mat(&mut &data[..]),
        Err(Error::SchemaMismatch { expected: "end of BITM form", found: Tag::NAME, .. })
    ));
}

#[test]
fn size_mismatch_strict_and_lenient() {
    let data = mat_bytes(vec![info(2, 2), raw(Tag::PXLS, &[1, 2, 3])]);
    assert!(matches!(
        read_mat(&mut &data[..]),
        Err(Error::SchemaMismatch { found: Tag::PXLS, .. })
    ));
    let lenient = MatDecoder::new().with_config(DecodeConfig::default().lenient(true));
    let image = lenient.decode(&data[..]).unwrap();
    assert_eq!(image.pixel(0, 1), Some([3, 3, 3, 255]));
    assert_eq!(image.pixel(1, 1), Some([0, 0, 0, 0]));
}

#[test]
fn dimensions_checked_against_limits() {
    let data = mat_bytes(vec![info(100_000, 100_000)]);
    assert!(matches!(read_mat(&mut &data[..]), Err(Error::ResourceLimitExceeded(_))));
    let small = MatDecoder::new().with_config(DecodeConfig::default().with_peak_memory_limit(15));
    let data = mat_bytes(vec![info(2, 2)]);
    assert!(matches!(small.decode(&data[..]), Err(Error::ResourceLimitExceeded(_))));
}

#[test]
fn flip_reverses_rows() {
    let data = mat_bytes(vec![info(1, 3), raw(Tag::PXLS, &[1, 2, 3])]);
    let image = read_mat(&mut &data[..]).unwrap();
    let flipped = image.flip_vertical();
    assert_eq!(flipped.pixel(0, 0), Some([3, 3, 3, 255]));
    assert_eq!(flipped.pixel(0, 2), Some([1, 1, 1, 255]));
    assert_eq!(flipped.flip_vertical(), image);

    let empty = mat_bytes(vec![info(0, 4)]);
    let image = read_mat(&mut &empty[..]).unwrap();
    assert_eq!(image.flip_vertical(), image);
}

#[test]
fn build_then_decode() {
    let palette = red_at_one();
    let file = build_mat(2, 2, MatPalette::Inline(&palette), &[1, 0, 2, 1], Some(&[255, 255, 128, 0])).unwrap();
    let image = read_mat(&mut &file.serialize().unwrap()[..]).unwrap();
    assert_eq!(image.pixels(), &[
        255, 0, 0, 255, //
        0, 0, 0, 255, //
        2, 2, 2, 128, //
        255, 0, 0, 0,
    ]);
    let alph = file.root_form().find_form(Tag::FRAM).unwrap().find_chunk(Tag::ALPH).unwrap();
    assert_eq!(alph.serialize().unwrap(), b"ALPH\x00\x00\x00\x04\x00\x00\x7f\xff");
}

#[test]
fn build_rejects_bad_input() {
    assert!(matches!(
        build_mat(2, 2, MatPalette::Named("space"), &[0; 3], None),
        Err(Error::InvalidData(_))
    ));
    assert!(matches!(
        build_mat(1, 1, MatPalette::Named("space"), &[0], Some(&[])),
        Err(Error::InvalidData(_))
    ));
    assert!(matches!(
        build_mat(1 << 31, 0, MatPalette::Named("space"), &[], None),
        Err(Error::TypeKind(_))
    ));
    assert!(matches!(
        build_mat(1, 1, MatPalette::Named("ç"), &[0], None),
        Err(Error::TypeKind(_))
    ));
}

#[test]
fn palette_names() {
    assert_eq!(palette_file_name(b"SPACE\0\0").as_deref(), Some("space.pal"));
    assert_eq!(palette_file_name(b" \t\0"), None);
    assert_eq!(palette_file_name(b"\xff"), None);
}
