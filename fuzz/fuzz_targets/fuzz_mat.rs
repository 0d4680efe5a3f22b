#![no_main]
use libfuzzer_sys::fuzz_target;
use wcp_iff::{DecodeConfig, MatDecoder};

fuzz_target!(|data: &[u8]| {
    let config = DecodeConfig::default()
        .with_peak_memory_limit(16 << 20)
        .with_total_megapixels_limit(4)
        .lenient(true);
    if let Ok(image) = MatDecoder::new().with_config(config).decode(data) {
        assert_eq!(image.pixels().len() as u64, u64::from(image.width()) * u64::from(image.height()) * 4);
        let _ = image.flip_vertical();
    }
});
