#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = trio_crypto::parse_address(text);
        let _ = trio_crypto::import_secret(text);
        let _ = text.parse::<trio_types::NodeId>();
    }
});
