#![no_main]
use libfuzzer_sys::fuzz_target;
use tapejson::{parse_lazy, ParserConfig};

const FIXTURE: &[u8] = br#"{"a":{"b":[1,2,{"c":"deep"}]},"x":null,"y":1.5}"#;

fuzz_target!(|data: &[u8]| {
    let Ok(doc) = parse_lazy(FIXTURE, ParserConfig::default()) else {
        return;
    };
    let pointer = String::from_utf8_lossy(data);
    // Must never panic, regardless of how malformed the pointer is.
    let _ = doc.root().pointer(pointer.as_ref());
});
