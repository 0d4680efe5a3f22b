#![no_main]
use libfuzzer_sys::fuzz_target;
use wcp_iff::{DecodeConfig, IffReader};

fuzz_target!(|data: &[u8]| {
    let config = DecodeConfig::default().with_peak_memory_limit(1 << 20);

    for record in IffReader::with_config(data, &config) {
        if record.is_err() {
            break;
        }
    }

    if let Ok(Some(form)) = IffReader::with_config(data, &config).read_form() {
        let _ = form.serialize();
    }
});
