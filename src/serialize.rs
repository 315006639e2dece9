//! Compact/pretty serializer. A `FormatOptions`-style context is threaded
//! through recursive writers, with string escaping following a
//! "bulk-copy the safe run, handle the escape-worthy byte, repeat" shape
//! driven by the SIMD escape finders in `simd.rs`.

use crate::config::SerializerConfig;
use crate::number::{format_f64, format_i64};
use crate::simd::{find_escape_json, find_escape_unicode};
use crate::value::{Map, Value};

/// Serialize `value` as compact JSON (no whitespace).
pub fn serialize(value: &Value) -> Vec<u8> {
    serialize_with(value, &SerializerConfig::compact())
}

/// Serialize `value` as pretty-printed JSON, indenting each nesting level
/// by `indent`.
pub fn serialize_pretty(value: &Value, indent: &str) -> Vec<u8> {
    serialize_with(value, &SerializerConfig::pretty(indent))
}

/// Serialize `value` under an explicit [`SerializerConfig`].
pub fn serialize_with(value: &Value, config: &SerializerConfig) -> Vec<u8> {
    let mut w = Writer {
        out: Vec::new(),
        config,
        depth: 0,
    };
    w.write_value(value);
    w.out
}

struct Writer<'a> {
    out: Vec<u8>,
    config: &'a SerializerConfig,
    depth: usize,
}

impl<'a> Writer<'a> {
    fn pretty(&self) -> bool {
        !self.config.indent.is_empty()
    }

    fn write_newline_indent(&mut self, depth: usize) {
        if self.pretty() {
            self.out.push(b'\n');
            for _ in 0..depth {
                self.out.extend_from_slice(self.config.indent.as_bytes());
            }
        }
    }

    fn write_value(&mut self, value: &Value) {
        match value {
            Value::Null => self.out.extend_from_slice(b"null"),
            Value::Bool(true) => self.out.extend_from_slice(b"true"),
            Value::Bool(false) => self.out.extend_from_slice(b"false"),
            Value::I64(v) => format_i64(*v, &mut self.out),
            Value::F64(v) => format_f64(*v, &mut self.out),
            Value::String(s) => self.write_string(s.as_bytes()),
            Value::Array(items) => self.write_array(items),
            Value::Map(map) => self.write_map(map),
        }
    }

    fn write_array(&mut self, items: &[Value]) {
        self.out.push(b'[');
        if items.is_empty() {
            self.out.push(b']');
            return;
        }
        self.depth += 1;
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.out.push(b',');
            }
            self.write_newline_indent(self.depth);
            self.write_value(item);
        }
        self.depth -= 1;
        self.write_newline_indent(self.depth);
        self.out.push(b']');
    }

    fn write_map(&mut self, map: &Map) {
        self.out.push(b'{');
        if map.is_empty() {
            self.out.push(b'}');
            return;
        }
        self.depth += 1;
        let mut entries: Vec<(&str, &Value)> = map.iter().collect();
        if self.config.sort_keys {
            entries.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
        }
        for (i, (key, value)) in entries.into_iter().enumerate() {
            if i > 0 {
                self.out.push(b',');
            }
            self.write_newline_indent(self.depth);
            self.write_string(key.as_bytes());
            self.out.push(b':');
            if self.pretty() {
                self.out.push(b' ');
            }
            self.write_value(value);
        }
        self.depth -= 1;
        self.write_newline_indent(self.depth);
        self.out.push(b'}');
    }

    /// Bulk-copy safe runs, handling one escape-worthy byte at a time,
    /// per the plain/unicode-escaped choice `SerializerConfig` exposes.
    fn write_string(&mut self, bytes: &[u8]) {
        self.out.push(b'"');
        let mut pos = 0;
        let finder = if self.config.escape_unicode {
            find_escape_unicode
        } else {
            find_escape_json
        };

        loop {
            let next = finder(bytes, pos);
            self.out.extend_from_slice(&bytes[pos..next]);
            if next >= bytes.len() {
                break;
            }
            let b = bytes[next];
            match b {
                b'"' => self.out.extend_from_slice(b"\\\""),
                b'\\' => self.out.extend_from_slice(b"\\\\"),
                b'/' if self.config.escape_forward_slash => self.out.extend_from_slice(b"\\/"),
                b'/' => self.out.push(b'/'),
                0x08 => self.out.extend_from_slice(b"\\b"),
                0x0c => self.out.extend_from_slice(b"\\f"),
                b'\n' => self.out.extend_from_slice(b"\\n"),
                b'\r' => self.out.extend_from_slice(b"\\r"),
                b'\t' => self.out.extend_from_slice(b"\\t"),
                0x00..=0x1f => {
                    self.write_unicode_escape(b as u32);
                }
                _ if self.config.escape_unicode && b >= 0x80 => {
                    // Decode the UTF-8 sequence starting here and escape
                    // its code point (surrogate-pairing above U+FFFF).
                    let rest = &bytes[next..];
                    let ch_len = utf8_len(b);
                    let s = std::str::from_utf8(&rest[..ch_len.min(rest.len())]).unwrap_or("\u{FFFD}");
                    if let Some(ch) = s.chars().next() {
                        let cp = ch as u32;
                        if cp > 0xFFFF {
                            let v = cp - 0x10000;
                            let high = 0xD800 + (v >> 10);
                            let low = 0xDC00 + (v & 0x3FF);
                            self.write_unicode_escape(high);
                            self.write_unicode_escape(low);
                        } else {
                            self.write_unicode_escape(cp);
                        }
                        pos = next + ch_len;
                        continue;
                    }
                }
                _ => self.out.push(b),
            }
            pos = next + 1;
        }
        self.out.push(b'"');
    }

    fn write_unicode_escape(&mut self, code_point: u32) {
        self.out.extend_from_slice(b"\\u");
        for shift in [12, 8, 4, 0] {
            let nibble = (code_point >> shift) & 0xf;
            self.out.push(hex_digit(nibble as u8));
        }
    }
}

fn hex_digit(n: u8) -> u8 {
    match n {
        0..=9 => b'0' + n,
        _ => b'a' + (n - 10),
    }
}

fn utf8_len(first_byte: u8) -> usize {
    if first_byte & 0x80 == 0 {
        1
    } else if first_byte & 0xE0 == 0xC0 {
        2
    } else if first_byte & 0xF0 == 0xE0 {
        3
    } else {
        4
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;
    use crate::value::parse_safe;

    fn roundtrip(src: &str) -> Value {
        let v = parse_safe(src.as_bytes(), ParserConfig::default()).unwrap();
        let out = serialize(&v);
        parse_safe(&out, ParserConfig::default()).unwrap()
    }

    #[test]
    fn compact_object() {
        let v = parse_safe(br#"{"a":1,"b":true}"#, ParserConfig::default()).unwrap();
        assert_eq!(serialize(&v), br#"{"a":1,"b":true}"#);
    }

    #[test]
    fn pretty_nested_array() {
        let v = parse_safe(b"[1,2]", ParserConfig::default()).unwrap();
        let out = serialize_pretty(&v, "  ");
        assert_eq!(out, b"[\n  1,\n  2\n]");
    }

    #[test]
    fn escapes_control_and_quote() {
        let v = Value::String("a\"b\nc".to_string());
        assert_eq!(serialize(&v), b"\"a\\\"b\\nc\"");
    }

    #[test]
    fn escape_unicode_mode_emits_surrogate_pair() {
        let v = Value::String("😊".to_string());
        let cfg = crate::config::SerializerConfig {
            escape_unicode: true,
            ..Default::default()
        };
        let out = serialize_with(&v, &cfg);
        assert_eq!(out, b"\"\\ud83d\\ude0a\"");
    }

    #[test]
    fn sort_keys_is_lexicographic() {
        let v = parse_safe(br#"{"b":1,"a":2}"#, ParserConfig::default()).unwrap();
        let cfg = crate::config::SerializerConfig {
            sort_keys: true,
            ..Default::default()
        };
        assert_eq!(serialize_with(&v, &cfg), br#"{"a":2,"b":1}"#);
    }

    #[test]
    fn round_trip_equal() {
        let src = r#"{"name":"Alice","tags":["x","y"],"n":3.5}"#;
        assert_eq!(roundtrip(src), roundtrip(src));
    }

    #[test]
    fn empty_containers_serialize_compactly() {
        assert_eq!(serialize(&Value::Array(vec![])), b"[]");
        assert_eq!(serialize(&Value::Map(Map::new())), b"{}");
    }
}
