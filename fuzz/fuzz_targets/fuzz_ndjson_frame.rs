#![no_main]
use libfuzzer_sys::fuzz_target;
use tapejson::{frame_lines, parse_ndjson, ParserConfig};

fuzz_target!(|data: &[u8]| {
    let spans = frame_lines(data);
    for w in spans.windows(2) {
        assert!(w[0].end <= w[1].begin);
    }
    let _ = parse_ndjson(data, ParserConfig::default());
});
