#![no_main]
use libfuzzer_sys::fuzz_target;
use tapejson::{parse_safe, serialize, ParserConfig};

fuzz_target!(|data: &[u8]| {
    if let Ok(value) = parse_safe(data, ParserConfig::default()) {
        let out = serialize(&value);
        let reparsed = parse_safe(&out, ParserConfig::default())
            .expect("serializer must emit a document our own parser accepts");
        assert_eq!(value, reparsed);
    }
});
