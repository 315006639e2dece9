//! The owned value tree: a reference representation of JSON values usable
//! without a tape. Built either by walking a [`Tape`] in one pass or by a
//! recursive-descent fallback that reads the source directly.

use crate::config::ParserConfig;
use crate::error::{ErrorKind, JsonError, Result};
use crate::number::ParsedNumber;
use crate::tape::{self, tag, Tape};

/// An insertion-ordered map from owned string keys to values. Duplicate
/// keys overwrite in place at their original position (last write wins),
/// matching the tape builder's default behavior.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Map {
    entries: Vec<(String, Value)>,
}

impl Map {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn insert(&mut self, key: String, value: Value) {
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// A JSON value: null, bool, i64, f64, owned string, ordered array, or an
/// insertion-ordered map. Only String/Array/Map variants allocate.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    String(String),
    Array(Vec<Value>),
    Map(Map),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::I64(v) => Some(*v as f64),
            Value::F64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a.as_slice()),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Indexed access into an array; a type or range mismatch returns
    /// `None` rather than raising (mirrors lazy-navigation absence
    /// semantics for the eager tree).
    pub fn get_index(&self, i: usize) -> Option<&Value> {
        self.as_array().and_then(|a| a.get(i))
    }

    /// Key access into a map.
    pub fn get_key(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|m| m.get(key))
    }
}

/// Parse `source` into an owned [`Value`] via the tape path (Stage 1 +
/// Stage 2 + a single materializing walk).
pub fn parse_safe(source: &[u8], config: ParserConfig) -> Result<Value> {
    let built = tape::build_tape(source, config)?;
    from_tape(&built)
}

/// Same contract as [`parse_safe`], panicking on error.
pub fn parse(source: &[u8], config: ParserConfig) -> Value {
    parse_safe(source, config).expect("invalid JSON")
}

/// Materialize a [`Value`] tree from an already-built tape in one linear
/// pass, maintaining a stack of partially built containers keyed to
/// OBJ_BEGIN/ARR_BEGIN depth.
pub fn from_tape(t: &Tape) -> Result<Value> {
    enum Building {
        Array(Vec<Value>),
        Object(Map, Option<String>),
    }

    let mut stack: Vec<Building> = Vec::new();
    let mut result: Option<Value> = None;
    let mut i = t.root_value_index();

    while i < t.len() {
        let (entry_tag, payload) = t.entry(i);
        let mut leaf: Option<Value> = None;

        match entry_tag {
            tag::OBJ_BEGIN => {
                stack.push(Building::Object(Map::new(), None));
                i += 1;
                continue;
            }
            tag::ARR_BEGIN => {
                stack.push(Building::Array(Vec::new()));
                i += 1;
                continue;
            }
            tag::OBJ_END => {
                let built = stack.pop().expect("matching OBJ_BEGIN pushed a frame");
                let (map, _) = match built {
                    Building::Object(m, pending) => (m, pending),
                    Building::Array(_) => unreachable!("OBJ_END closing an array frame"),
                };
                leaf = Some(Value::Map(map));
                i += 1;
            }
            tag::ARR_END => {
                let built = stack.pop().expect("matching ARR_BEGIN pushed a frame");
                let arr = match built {
                    Building::Array(a) => a,
                    Building::Object(..) => unreachable!("ARR_END closing an object frame"),
                };
                leaf = Some(Value::Array(arr));
                i += 1;
            }
            tag::STRING => {
                leaf = Some(Value::String(t.string_at(payload as u32).to_owned()));
                i += 1;
            }
            tag::INT64 => {
                let bits = t.raw_bits(i + 1);
                leaf = Some(Value::I64(bits as i64));
                i += 2;
            }
            tag::DOUBLE => {
                let bits = t.raw_bits(i + 1);
                leaf = Some(Value::F64(f64::from_bits(bits)));
                i += 2;
            }
            tag::TRUE => {
                leaf = Some(Value::Bool(true));
                i += 1;
            }
            tag::FALSE => {
                leaf = Some(Value::Bool(false));
                i += 1;
            }
            tag::NULL => {
                leaf = Some(Value::Null);
                i += 1;
            }
            tag::ROOT => unreachable!("ROOT only ever occupies entry 0"),
            other => unreachable!("unknown tape tag {other}"),
        }

        let Some(value) = leaf else { continue };

        match stack.last_mut() {
            None => {
                result = Some(value);
            }
            Some(Building::Array(a)) => a.push(value),
            Some(Building::Object(map, pending_key)) => match pending_key.take() {
                None => {
                    let key = match value {
                        Value::String(s) => s,
                        _ => unreachable!("object keys are always STRING entries"),
                    };
                    *pending_key = Some(key);
                }
                Some(key) => {
                    map.insert(key, value);
                }
            },
        }
    }

    Ok(result.unwrap_or(Value::Null))
}

/// Recursive-descent fallback: reads the source directly without building
/// a structural index or tape first. Reference path for cross-checking
/// the tape-based parser, and usable standalone.
pub fn parse_recursive_descent(source: &[u8], config: ParserConfig) -> Result<Value> {
    let mut p = RdParser {
        input: source,
        pos: 0,
        depth: 0,
        config,
    };
    p.skip_ws();
    let v = p.parse_value()?;
    p.skip_ws();
    if p.pos != source.len() {
        return Err(JsonError::new(
            ErrorKind::UnexpectedChar,
            p.pos,
            "trailing data after document",
        ));
    }
    Ok(v)
}

struct RdParser<'a> {
    input: &'a [u8],
    pos: usize,
    depth: u32,
    config: ParserConfig,
}

impl<'a> RdParser<'a> {
    fn skip_ws(&mut self) {
        while self.pos < self.input.len() && self.input[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn err(&self, kind: ErrorKind, msg: &'static str) -> JsonError {
        JsonError::new(kind, self.pos, msg)
    }

    fn parse_value(&mut self) -> Result<Value> {
        self.skip_ws();
        match self.peek() {
            Some(b'{') => self.parse_object(),
            Some(b'[') => self.parse_array(),
            Some(b'"') => self.parse_string().map(Value::String),
            Some(b't') => {
                self.expect_literal(b"true")?;
                Ok(Value::Bool(true))
            }
            Some(b'f') => {
                self.expect_literal(b"false")?;
                Ok(Value::Bool(false))
            }
            Some(b'n') => {
                self.expect_literal(b"null")?;
                Ok(Value::Null)
            }
            Some(b'-') | Some(b'0'..=b'9') => self.parse_number(),
            Some(_) => Err(self.err(ErrorKind::UnexpectedChar, "unexpected character")),
            None => Err(self.err(ErrorKind::UnexpectedEof, "expected a value")),
        }
    }

    fn expect_literal(&mut self, literal: &'static [u8]) -> Result<()> {
        let end = self.pos + literal.len();
        if end > self.input.len() || &self.input[self.pos..end] != literal {
            return Err(self.err(ErrorKind::UnexpectedChar, "malformed literal"));
        }
        self.pos = end;
        Ok(())
    }

    fn parse_number(&mut self) -> Result<Value> {
        let (v, end) = crate::number::parse_number(self.input, self.pos)?;
        self.pos = end;
        Ok(match v {
            ParsedNumber::I64(i) => Value::I64(i),
            ParsedNumber::F64(f) => Value::F64(f),
        })
    }

    fn parse_string(&mut self) -> Result<String> {
        debug_assert_eq!(self.input[self.pos], b'"');
        let quote_pos = self.pos;
        let mut cursor = self.pos + 1;
        let mut out = Vec::new();
        loop {
            let seg_start = cursor;
            crate::simd::skip_plain_string_bytes(self.input, &mut cursor);
            out.extend_from_slice(&self.input[seg_start..cursor]);
            let b = *self.input.get(cursor).ok_or_else(|| {
                JsonError::new(ErrorKind::UnterminatedString, cursor, "unterminated string")
            })?;
            match b {
                b'"' => {
                    cursor += 1;
                    break;
                }
                b'\\' => {
                    cursor += 1;
                    self.decode_escape(&mut cursor, &mut out)?;
                }
                _ if b < 0x20 => {
                    return Err(JsonError::new(
                        ErrorKind::BadEscape,
                        cursor,
                        "unescaped control byte in string",
                    ));
                }
                _ => {
                    out.push(b);
                    cursor += 1;
                }
            }
        }
        self.pos = cursor;
        let s = simdutf8::basic::from_utf8(&out)
            .map_err(|_| JsonError::new(ErrorKind::BadEscape, quote_pos, "invalid UTF-8 in string"))?;
        Ok(s.to_owned())
    }

    fn decode_escape(&self, cursor: &mut usize, out: &mut Vec<u8>) -> Result<()> {
        let esc = *self
            .input
            .get(*cursor)
            .ok_or_else(|| JsonError::new(ErrorKind::BadEscape, *cursor, "truncated escape"))?;
        match esc {
            b'"' => {
                out.push(b'"');
                *cursor += 1;
            }
            b'\\' => {
                out.push(b'\\');
                *cursor += 1;
            }
            b'/' => {
                out.push(b'/');
                *cursor += 1;
            }
            b'b' => {
                out.push(0x08);
                *cursor += 1;
            }
            b'f' => {
                out.push(0x0c);
                *cursor += 1;
            }
            b'n' => {
                out.push(b'\n');
                *cursor += 1;
            }
            b'r' => {
                out.push(b'\r');
                *cursor += 1;
            }
            b't' => {
                out.push(b'\t');
                *cursor += 1;
            }
            b'u' => {
                *cursor += 1;
                let cp = self.parse_hex4(*cursor)?;
                *cursor += 4;
                if (0xD800..=0xDBFF).contains(&cp) {
                    if self.input.get(*cursor) != Some(&b'\\')
                        || self.input.get(*cursor + 1) != Some(&b'u')
                    {
                        return Err(JsonError::new(
                            ErrorKind::BadUtf16Surrogate,
                            *cursor,
                            "high surrogate without low surrogate",
                        ));
                    }
                    *cursor += 2;
                    let low = self.parse_hex4(*cursor)?;
                    *cursor += 4;
                    if !(0xDC00..=0xDFFF).contains(&low) {
                        return Err(JsonError::new(
                            ErrorKind::BadUtf16Surrogate,
                            *cursor,
                            "invalid low surrogate",
                        ));
                    }
                    let c = 0x10000 + ((cp - 0xD800) << 10) + (low - 0xDC00);
                    if let Some(ch) = char::from_u32(c) {
                        let mut buf = [0u8; 4];
                        out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                    }
                } else if (0xDC00..=0xDFFF).contains(&cp) {
                    return Err(JsonError::new(
                        ErrorKind::BadUtf16Surrogate,
                        *cursor,
                        "lone low surrogate",
                    ));
                } else if let Some(ch) = char::from_u32(cp) {
                    let mut buf = [0u8; 4];
                    out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                }
            }
            _ => {
                return Err(JsonError::new(
                    ErrorKind::BadEscape,
                    *cursor,
                    "unknown escape sequence",
                ));
            }
        }
        Ok(())
    }

    fn parse_hex4(&self, pos: usize) -> Result<u32> {
        let bytes = self
            .input
            .get(pos..pos + 4)
            .ok_or_else(|| JsonError::new(ErrorKind::BadEscape, pos, "truncated \\u escape"))?;
        let s = std::str::from_utf8(bytes)
            .map_err(|_| JsonError::new(ErrorKind::BadEscape, pos, "malformed \\u escape"))?;
        u32::from_str_radix(s, 16)
            .map_err(|_| JsonError::new(ErrorKind::BadEscape, pos, "malformed \\u escape"))
    }

    fn parse_array(&mut self) -> Result<Value> {
        self.depth += 1;
        if self.depth > self.config.max_depth {
            return Err(self.err(ErrorKind::DepthExceeded, "max_depth exceeded"));
        }
        self.pos += 1; // '['
        let mut items = Vec::new();
        self.skip_ws();
        if self.peek() == Some(b']') {
            self.pos += 1;
            self.depth -= 1;
            return Ok(Value::Array(items));
        }
        loop {
            items.push(self.parse_value()?);
            self.skip_ws();
            match self.peek() {
                Some(b',') => {
                    self.pos += 1;
                    self.skip_ws();
                    if self.config.allow_trailing_comma && self.peek() == Some(b']') {
                        self.pos += 1;
                        self.depth -= 1;
                        return Ok(Value::Array(items));
                    }
                }
                Some(b']') => {
                    self.pos += 1;
                    self.depth -= 1;
                    return Ok(Value::Array(items));
                }
                Some(_) => return Err(self.err(ErrorKind::UnexpectedChar, "expected ',' or ']'")),
                None => return Err(self.err(ErrorKind::UnexpectedEof, "expected ',' or ']'")),
            }
        }
    }

    fn parse_object(&mut self) -> Result<Value> {
        self.depth += 1;
        if self.depth > self.config.max_depth {
            return Err(self.err(ErrorKind::DepthExceeded, "max_depth exceeded"));
        }
        self.pos += 1; // '{'
        let mut map = Map::new();
        self.skip_ws();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            self.depth -= 1;
            return Ok(Value::Map(map));
        }
        loop {
            self.skip_ws();
            if self.peek() != Some(b'"') {
                return Err(self.err(ErrorKind::UnexpectedChar, "expected a key"));
            }
            let key = self.parse_string()?;
            self.skip_ws();
            if self.peek() != Some(b':') {
                return Err(self.err(ErrorKind::UnexpectedChar, "expected ':'"));
            }
            self.pos += 1;
            let value = self.parse_value()?;
            if self.config.detect_duplicate_keys && map.contains_key(&key) {
                return Err(self.err(ErrorKind::DuplicateKey, "duplicate key"));
            }
            map.insert(key, value);
            self.skip_ws();
            match self.peek() {
                Some(b',') => {
                    self.pos += 1;
                    self.skip_ws();
                    if self.config.allow_trailing_comma && self.peek() == Some(b'}') {
                        self.pos += 1;
                        self.depth -= 1;
                        return Ok(Value::Map(map));
                    }
                }
                Some(b'}') => {
                    self.pos += 1;
                    self.depth -= 1;
                    return Ok(Value::Map(map));
                }
                Some(_) => return Err(self.err(ErrorKind::UnexpectedChar, "expected ',' or '}'")),
                None => return Err(self.err(ErrorKind::UnexpectedEof, "expected ',' or '}'")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flat_object() {
        let v = parse_safe(
            br#"{"name":"Alice","age":30,"active":true}"#,
            ParserConfig::default(),
        )
        .unwrap();
        let map = v.as_map().unwrap();
        assert_eq!(map.get("name").unwrap().as_str(), Some("Alice"));
        assert_eq!(map.get("age").unwrap().as_i64(), Some(30));
        assert_eq!(map.get("active").unwrap().as_bool(), Some(true));
    }

    #[test]
    fn array_of_ints() {
        let v = parse_safe(b"[1,2,3,4,5]", ParserConfig::default()).unwrap();
        assert_eq!(v.get_index(3).unwrap().as_i64(), Some(4));
    }

    #[test]
    fn nested_access() {
        let v = parse_safe(br#"{"a":{"b":{"c":"deep"}}}"#, ParserConfig::default()).unwrap();
        let deep = v
            .get_key("a")
            .unwrap()
            .get_key("b")
            .unwrap()
            .get_key("c")
            .unwrap();
        assert_eq!(deep.as_str(), Some("deep"));
    }

    #[test]
    fn recursive_descent_matches_tape_path() {
        let src = br#"{"a":[1,2.5,null,true,false,"x"]}"#;
        let a = parse_safe(src, ParserConfig::default()).unwrap();
        let b = parse_recursive_descent(src, ParserConfig::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn duplicate_key_last_wins_by_default() {
        let v = parse_safe(br#"{"a":1,"a":2}"#, ParserConfig::default()).unwrap();
        assert_eq!(v.get_key("a").unwrap().as_i64(), Some(2));
    }

    #[test]
    fn empty_containers_have_zero_length() {
        let v = parse_safe(b"{}", ParserConfig::default()).unwrap();
        assert_eq!(v.as_map().unwrap().len(), 0);
        let v = parse_safe(b"[]", ParserConfig::default()).unwrap();
        assert_eq!(v.as_array().unwrap().len(), 0);
    }
}
