//! Two-stage SIMD JSON decoder: a branchless structural indexer (Stage 1),
//! a linear tape builder (Stage 2), an owned value tree, a lazy navigator
//! over the tape, and an NDJSON framer.
//!
//! ```
//! let value = tapejson::parse_safe(br#"{"a":[1,2,3]}"#, Default::default()).unwrap();
//! assert_eq!(value.get_key("a").unwrap().get_index(1).unwrap().as_i64(), Some(2));
//! ```

#![feature(portable_simd)]

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[cfg(all(feature = "jemalloc", not(feature = "mimalloc")))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[cfg(all(feature = "snmalloc", not(feature = "mimalloc"), not(feature = "jemalloc")))]
#[global_allocator]
static GLOBAL: snmalloc_rs::SnMalloc = snmalloc_rs::SnMalloc;

pub mod config;
pub mod error;
pub mod lazy;
pub mod ndjson;
pub mod number;
pub mod serialize;
pub mod simd;
pub mod structural;
pub mod tape;
pub mod value;

pub use config::{ParserConfig, SerializerConfig};
pub use error::{ErrorKind, JsonError, Result};
pub use lazy::{parse_lazy, Document, LazyValue};
pub use ndjson::{frame_lines, parse_ndjson, parse_ndjson_lazy, LineSpan};
pub use serialize::{serialize, serialize_pretty, serialize_with};
pub use structural::{build_structural_index, StructuralIndex};
pub use tape::{build_tape, Tape};
pub use value::{parse, parse_recursive_descent, parse_safe, Map, Value};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_to_end_scenario_one() {
        let v = parse_safe(
            br#"{"name":"Alice","age":30,"active":true}"#,
            ParserConfig::default(),
        )
        .unwrap();
        let map = v.as_map().unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map.get("name").unwrap().as_str(), Some("Alice"));
        let doc = parse_lazy(
            br#"{"name":"Alice","age":30,"active":true}"#,
            ParserConfig::default(),
        )
        .unwrap();
        assert_eq!(doc.root().pointer("/name").as_str().unwrap(), "Alice");
    }

    #[test]
    fn end_to_end_scenario_six() {
        let err = parse_safe(br#"{"invalid": }"#, ParserConfig::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedChar);
        assert_eq!(err.locate(br#"{"invalid": }"#), (1, 13));
    }

    #[test]
    fn serialize_then_parse_is_identity() {
        let src = br#"{"a":1,"b":[true,false,null,"x"]}"#;
        let v = parse_safe(src, ParserConfig::default()).unwrap();
        let out = serialize(&v);
        let v2 = parse_safe(&out, ParserConfig::default()).unwrap();
        assert_eq!(v, v2);
    }
}
