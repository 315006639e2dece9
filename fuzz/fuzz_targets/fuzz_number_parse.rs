#![no_main]
use libfuzzer_sys::fuzz_target;
use tapejson::number::parse_number;

fuzz_target!(|data: &[u8]| {
    let _ = parse_number(data, 0);
});
