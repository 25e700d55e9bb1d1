#![no_main]

use libfuzzer_sys::fuzz_target;
use mockstage::resolve::{collect_query, normalize};

fuzz_target!(|input: (&str, &str, Vec<(String, String)>)| {
    let (method, path, pairs) = input;
    let _ = normalize(method, path, &collect_query(pairs));
});
