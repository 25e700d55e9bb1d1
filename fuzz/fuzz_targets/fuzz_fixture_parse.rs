#![no_main]

use libfuzzer_sys::fuzz_target;
use mockstage::store::Fixture;
use mockstage::store::fixtures::parse_fixture_file_name;

fuzz_target!(|data: &[u8]| {
    if let Ok(fixture) = serde_json::from_slice::<Fixture>(data) {
        let _ = fixture.effective_status();
    }

    if let Ok(name) = std::str::from_utf8(data) {
        let _ = parse_fixture_file_name(name);
    }
});
