#![no_main]
use libfuzzer_sys::fuzz_target;
use tapejson::{build_tape, ParserConfig};

fuzz_target!(|data: &[u8]| {
    let _ = build_tape(data, ParserConfig::default());
});
