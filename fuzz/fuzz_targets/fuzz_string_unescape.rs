#![no_main]
use libfuzzer_sys::fuzz_target;
use tapejson::{build_tape, ParserConfig};

fuzz_target!(|data: &[u8]| {
    let mut doc = Vec::with_capacity(data.len() + 2);
    doc.push(b'"');
    doc.extend_from_slice(data);
    doc.push(b'"');
    let _ = build_tape(&doc, ParserConfig::default());
});
