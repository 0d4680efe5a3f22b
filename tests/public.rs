// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
use std::fs::{self, File};
use std::path::Path;

use wcp_iff::{
    Chunk, DecodeConfig, Error, Form, IffFile, IffReader, MatDecoder, MatPalette, Palette, PaletteOrigin,
    RawRecord, Record, Tag, build_mat, read_mat, read_mat_file,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).filter_level(log::LevelFilter::max()).try_init();
}

fn tag(name: &str) -> Tag {
    Tag::new(name).expect("valid tag")
}

fn red_at_one() -> Palette {
    let mut cmap = Palette::grayscale().to_cmap();
    cmap[3..6].copy_from_slice(&[255, 0, 0]);
    Palette::from_cmap(&cmap)
}

// ============================================================================
// Container encoding
// ============================================================================

#[test]
fn public_gone_chunk() {
    let gone = Chunk::with_members(tag("GONE"), [42]).unwrap();
    assert_eq!(gone.serialized_length(), 4);
    assert_eq!(gone.serialize().unwrap(), b"GONE\x00\x00\x00\x04\x2A\x00\x00\x00");
}

#[test]
fn public_fib_file() {
    let mut file = IffFile::new(tag("TEST"));
    let mut fib = Chunk::new(tag("FIB"));
    for n in [1, 1, 2, 3, 5, 8, 13] {
        fib.add_member(n).unwrap();
    }
    file.root_form_mut().add_member(fib);
    file.set_comment("first seven").unwrap();

    let bytes = file.serialize().unwrap();
    assert_eq!(&bytes[..20], b"FORM\x00\x00\x00(TESTFIB \x00\x00\x00\x1C");
    assert_eq!(bytes.len(), 8 + 40 + "first seven".len());
    assert!(bytes.ends_with(b"\x0D\x00\x00\x00first seven"));

    // The comment sits outside the root form and is never read back.
    let mut reader = IffReader::from_bytes(&bytes);
    let root = reader.read_form().unwrap().unwrap();
    assert_eq!(reader.offset(), 48);
    assert_eq!(root.serialize().unwrap(), &bytes[..48]);
}

#[test]
fn public_empty_form() {
    assert_eq!(Form::new(tag("EMPT")).serialize().unwrap(), b"FORM\x00\x00\x00\x04EMPT");
}

#[test]
fn public_mixed_padding() {
    let mut ponf = Chunk::new(tag("PONF"));
    ponf.add_member(12.345f32).unwrap();
    ponf.add_member("I am poncho man!").unwrap();
    ponf.add_member(12345).unwrap();
    let gone = Chunk::with_members(tag("GONE"), [42]).unwrap();
    let fong = Form::with_members(tag("FONG"), [Record::from(ponf), gone.into(), Form::new(tag("EMPT")).into()]);

    assert_eq!(fong.serialized_length(), 62);
    let bytes = fong.serialize().unwrap();
    assert_eq!(bytes.len() % 2, 0);
    // 25-byte PONF payload is followed by one pad byte before GONE.
    assert_eq!(&bytes[45..50], b"\x00GONE");
}

#[test]
fn public_rejects_bad_values() {
    assert!(matches!(Tag::new("TOOLONG"), Err(Error::InvalidTag)));
    assert!(matches!(Tag::new(""), Err(Error::InvalidTag)));
    let mut chunk = Chunk::new(tag("BAD"));
    assert!(matches!(chunk.add_member(u32::MAX), Err(Error::TypeKind(_))));
    assert!(matches!(chunk.add_member("snowman ☃"), Err(Error::TypeKind(_))));
    assert!(!chunk.has_members());
}

// ============================================================================
// Reader
// ============================================================================

#[test]
fn public_reader_walks_written_file() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tree.iff");

    let mut root = Form::new(tag("DETA"));
    root.add_member(Chunk::with_members(tag("NAME"), ["odds"]).unwrap());
    let mut geom = Form::new(tag("GEOM"));
    geom.add_member(Chunk::with_members(tag("VERT"), [1.0f32, 2.0, 3.0]).unwrap());
    root.add_member(geom);
    let mut file = IffFile::from_form(root);
    file.set_comment("trailer").unwrap();
    file.write_file(&path).unwrap();

    let mut reader = IffReader::new(File::open(&path).unwrap());
    let Some(RawRecord::Form(deta)) = reader.read_header().unwrap() else { panic!("no root") };
    assert_eq!(deta.tag, tag("DETA"));
    let Some(RawRecord::Chunk(name)) = reader.read_header().unwrap() else { panic!("no NAME") };
    assert_eq!(name.values().read_cstring().unwrap(), "odds");
    // Odd-sized NAME is padded, so GEOM starts on an even offset.
    assert_eq!(reader.offset(), 26);
    let Some(RawRecord::Form(geom)) = reader.read_header().unwrap() else { panic!("no GEOM") };
    let Some(RawRecord::Chunk(vert)) = reader.read_header().unwrap() else { panic!("no VERT") };
    let mut values = vert.values();
    assert_eq!(values.read_f32().unwrap(), 1.0);
    assert_eq!(values.read_f32().unwrap(), 2.0);
    assert_eq!(values.read_f32().unwrap(), 3.0);
    assert!(values.is_empty());
    assert_eq!(reader.offset(), geom.end());
    assert_eq!(reader.offset(), deta.end());
}

#[test]
fn public_reader_reports_truncation() {
    let bytes = Form::with_members(tag("ROOT"), [Chunk::with_members(tag("DATA"), [1, 2, 3]).unwrap()])
        .serialize()
        .unwrap();
    let records: Vec<_> = IffReader::from_bytes(&bytes[..bytes.len() - 2]).collect();
    assert_eq!(records.len(), 2);
    assert!(records[0].is_ok());
    assert!(matches!(records[1], Err(Error::TruncatedInput { offset: 12 })));
}

// ============================================================================
// MAT textures
// ============================================================================

#[test]
fn public_mat_round_trip() {
    init_logger();
    let palette = red_at_one();
    let file = build_mat(3, 2, MatPalette::Inline(&palette), &[1, 1, 1, 0, 5, 1], None).unwrap();
    let bytes = file.serialize().unwrap();
    let image = read_mat(&mut &bytes[..]).unwrap();
    assert_eq!(image.width(), 3);
    assert_eq!(image.height(), 2);
    assert_eq!(image.pixel(2, 0), Some([255, 0, 0, 255]));
    assert_eq!(image.pixel(0, 1), Some([0, 0, 0, 0]));
    assert_eq!(image.pixel(1, 1), Some([5, 5, 5, 255]));

    let flipped = image.flip_vertical();
    assert_eq!(flipped.pixel(1, 0), Some([5, 5, 5, 255]));
    assert_eq!(flipped.flip_vertical(), image);
}

/// Lays out `game/MAT/ship.mat` and `game/Pal/SPACE.PAL`.
fn named_palette_tree(root: &Path) -> std::path::PathBuf {
    let mat_dir = root.join("game").join("MAT");
    let pal_dir = root.join("game").join("Pal");
    fs::create_dir_all(&mat_dir).unwrap();
    fs::create_dir_all(&pal_dir).unwrap();
    red_at_one().to_iff().write_file(pal_dir.join("SPACE.PAL")).unwrap();

    let mat = mat_dir.join("ship.mat");
    build_mat(2, 1, MatPalette::Named("Space"), &[1, 0], Some(&[128, 255]))
        .unwrap()
        .write_file(&mat)
        .unwrap();
    mat
}

#[test]
fn public_mat_named_palette_in_sibling_dir() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let mat = named_palette_tree(dir.path());

    let image = read_mat_file(&mat).unwrap();
    assert_eq!(image.pixels(), &[255, 0, 0, 128, 0, 0, 0, 255]);
    match image.palette_origin() {
        PaletteOrigin::External(path) => assert!(path.ends_with("SPACE.PAL")),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn public_mat_palette_in_parent_dir() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let mat_dir = dir.path().join("textures");
    fs::create_dir_all(&mat_dir).unwrap();
    red_at_one().to_iff().write_file(dir.path().join("space.pal")).unwrap();
    let mat = mat_dir.join("hull.mat");
    build_mat(1, 1, MatPalette::Named("SPACE"), &[1], None).unwrap().write_file(&mat).unwrap();

    let image = read_mat_file(&mat).unwrap();
    assert_eq!(image.pixels(), &[255, 0, 0, 255]);
}

#[test]
fn public_mat_missing_palette_is_grayscale() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let mat = named_palette_tree(dir.path());
    fs::remove_file(dir.path().join("game").join("Pal").join("SPACE.PAL")).unwrap();

    let image = read_mat_file(&mat).unwrap();
    assert_eq!(image.palette_origin(), &PaletteOrigin::Grayscale);
    assert_eq!(image.pixels(), &[1, 1, 1, 128, 0, 0, 0, 255]);
}

#[test]
fn public_mat_corrupt_palette_is_grayscale() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let mat = named_palette_tree(dir.path());
    fs::write(dir.path().join("game").join("Pal").join("SPACE.PAL"), b"FORM\x00\x00").unwrap();

    let image = read_mat_file(&mat).unwrap();
    assert_eq!(image.palette_origin(), &PaletteOrigin::Grayscale);
}

#[test]
fn public_mat_custom_locator() {
    let dir = tempfile::tempdir().unwrap();
    let pal = dir.path().join("shared.pal");
    red_at_one().to_iff().write_file(&pal).unwrap();
    let bytes = build_mat(1, 1, MatPalette::Named("anything"), &[1], None).unwrap().serialize().unwrap();

    let image = MatDecoder::new()
        .with_locator(|_: &Path, _: &str| Some(pal.clone()))
        .with_image_path("virtual.mat")
        .decode(&bytes[..])
        .unwrap();
    assert_eq!(image.pixels(), &[255, 0, 0, 255]);
}

#[test]
fn public_mat_limits() {
    let bytes = build_mat(64, 64, MatPalette::Named("space"), &[0; 64 * 64], None).unwrap().serialize().unwrap();
    let strict = MatDecoder::new().with_config(DecodeConfig::default().with_peak_memory_limit(1024));
    assert!(matches!(strict.decode(&bytes[..]), Err(Error::ResourceLimitExceeded(_))));
    assert!(MatDecoder::new().with_config(DecodeConfig::unlimited()).decode(&bytes[..]).is_ok());
}

fn test_dir(dir: &Path) -> usize {
    init_logger();
    let mut decoded = 0;

    for entry in walkdir::WalkDir::new(dir) {
        let entry = entry.expect("MAT entry");
        let path = entry.path();
        let ext = path.extension().unwrap_or_default();
        if !path.is_file() || !ext.eq_ignore_ascii_case("mat") {
            continue;
        }
        log::debug!("decoding {:?}", path.display());
        let image = read_mat_file(path).unwrap_or_else(|err| panic!("{:?}: {err}", path.display()));
        assert_eq!(image.pixels().len(), image.width() as usize * image.height() as usize * 4);
        decoded += 1;
    }
    decoded
}

#[test]
fn public_mat_directory() {
    let dir = tempfile::tempdir().unwrap();
    named_palette_tree(dir.path());
    let palette = Palette::grayscale();
    for (i, (w, h)) in [(1, 1), (4, 3), (7, 5)].into_iter().enumerate() {
        let count = (w * h) as usize;
        let indices: Vec<u8> = (0..count).map(|n| n as u8).collect();
        let file = build_mat(w, h, MatPalette::Inline(&palette), &indices, None).unwrap();
        file.write_file(dir.path().join("game").join("MAT").join(format!("tex{i}.MAT"))).unwrap();
    }
    assert_eq!(test_dir(dir.path()), 4);
}
