//! Stage 2: the tape builder.
//!
//! One linear pass over the [`StructuralIndex`](crate::structural::StructuralIndex),
//! producing a flat sequence of 64-bit tape words plus a byte pool for
//! unescaped string data. The builder walks the structural list's
//! `{ } [ ] " : ,` entries directly via `peek`/`advance` for dispatch and
//! container/string boundaries, and consumes `value_starts` one entry per
//! value/key anchor to locate scalar literals — it never independently
//! re-scans the source for whitespace to find where a token begins. A
//! small hand-rolled state machine replaces recursion.

use std::collections::HashMap;
use std::hash::{BuildHasherDefault, Hasher};

use crate::config::ParserConfig;
use crate::error::{ErrorKind, JsonError, Result};
use crate::number::{parse_number, ParsedNumber};
use smallvec::SmallVec;

use crate::simd::skip_plain_string_bytes;
use crate::structural::{build_structural_index, StructuralIndex};

/// Container nesting depths beyond this spill the frame stack to the heap;
/// most real-world documents stay well inside it.
const INLINE_STACK_DEPTH: usize = 32;

/// Tape entry tags: top 8 bits of each 64-bit word.
pub mod tag {
    pub const ROOT: u8 = 0;
    pub const OBJ_BEGIN: u8 = 1;
    pub const OBJ_END: u8 = 2;
    pub const ARR_BEGIN: u8 = 3;
    pub const ARR_END: u8 = 4;
    pub const STRING: u8 = 5;
    pub const INT64: u8 = 6;
    pub const DOUBLE: u8 = 7;
    pub const TRUE: u8 = 8;
    pub const FALSE: u8 = 9;
    pub const NULL: u8 = 10;
}

const TAG_SHIFT: u32 = 56;
const PAYLOAD_MASK: u64 = (1u64 << TAG_SHIFT) - 1;

#[inline]
fn encode(t: u8, payload: u64) -> u64 {
    ((t as u64) << TAG_SHIFT) | (payload & PAYLOAD_MASK)
}

#[inline]
fn decode(word: u64) -> (u8, u64) {
    ((word >> TAG_SHIFT) as u8, word & PAYLOAD_MASK)
}

/// Bound on the intern table's entry count: an adversarial document with
/// many distinct "keys" must not be able to grow the table unboundedly.
const MAX_INTERN_ENTRIES: usize = 4096;

/// FNV-1a, seeded per-parse from a stack address and the current time so an
/// attacker cannot precompute hash collisions for the intern table.
struct FnvHasher(u64);

impl Default for FnvHasher {
    fn default() -> Self {
        let seed_mix = {
            let stack_marker = 0u8;
            let addr = &stack_marker as *const u8 as u64;
            let time = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0);
            addr ^ time.rotate_left(32)
        };
        FnvHasher(0xcbf29ce484222325 ^ seed_mix)
    }
}

impl Hasher for FnvHasher {
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(0x100000001b3);
        }
    }

    fn finish(&self) -> u64 {
        self.0
    }
}

type FastHashMap<K, V> = HashMap<K, V, BuildHasherDefault<FnvHasher>>;

/// The result of Stage 2: tape entries, string pool, and the config they
/// were built under (kept around since the navigator needs `max_depth`
/// only during construction, but `intern` bookkeeping is construction-only
/// and dropped once the tape is finalized).
#[derive(Debug)]
pub struct Tape {
    entries: Vec<u64>,
    strings: Vec<u8>,
}

impl Tape {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Decode the entry at `i` into (tag, payload).
    #[inline]
    pub fn entry(&self, i: usize) -> (u8, u64) {
        decode(self.entries[i])
    }

    /// The raw 64 bits following an INT64/DOUBLE tag word.
    #[inline]
    pub fn raw_bits(&self, i: usize) -> u64 {
        self.entries[i]
    }

    /// Index of the document's top-level value.
    pub fn root_value_index(&self) -> usize {
        1
    }

    /// Read the UTF-8 string stored at pool offset `offset` (a varint
    /// length prefix followed by the bytes). Panics on a corrupt offset;
    /// offsets only ever come from tape entries this builder produced.
    pub fn string_at(&self, offset: u32) -> &str {
        let (len, body_start) = read_varint(&self.strings, offset as usize);
        let bytes = &self.strings[body_start..body_start + len as usize];
        // SAFETY-equivalent invariant: every byte run we ever wrote into
        // `strings` was validated UTF-8 at decode time.
        std::str::from_utf8(bytes).expect("tape string pool holds only validated UTF-8")
    }
}

fn push_varint(pool: &mut Vec<u8>, mut n: u64) {
    loop {
        let mut byte = (n & 0x7f) as u8;
        n >>= 7;
        if n != 0 {
            byte |= 0x80;
        }
        pool.push(byte);
        if n == 0 {
            break;
        }
    }
}

fn read_varint(pool: &[u8], pos: usize) -> (u64, usize) {
    let mut result = 0u64;
    let mut shift = 0u32;
    let mut p = pos;
    loop {
        let byte = pool[p];
        p += 1;
        result |= ((byte & 0x7f) as u64) << shift;
        if byte & 0x80 == 0 {
            break;
        }
        shift += 7;
    }
    (result, p)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ContainerKind {
    Object,
    Array,
}

struct Frame {
    kind: ContainerKind,
    begin_index: usize,
    seen_keys: Option<std::collections::HashSet<Box<[u8]>>>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    ExpectValue { allow_close: bool },
    ExpectKeyOrClose { allow_close: bool },
    ExpectColon,
    AfterValue,
}

struct Builder<'a> {
    input: &'a [u8],
    index: StructuralIndex,
    /// Cursor into `index.value_starts()`. Every call to `do_expect_value`
    /// or `do_expect_key_or_close` pops exactly one entry, in lockstep with
    /// the anchors Stage 1 produced for them (document start, and the byte
    /// after each `: , [ {`).
    vs_cursor: usize,
    /// Byte offset immediately after the most recently completed value
    /// (scalar, string, or closed container). Used to check that only
    /// whitespace (and comments, if configured) separates it from the next
    /// structural token.
    last_end: usize,
    entries: Vec<u64>,
    strings: Vec<u8>,
    intern: FastHashMap<Box<[u8]>, u32>,
    config: ParserConfig,
    stack: SmallVec<[Frame; INLINE_STACK_DEPTH]>,
}

/// Build a tape from `input` under `config`.
pub fn build_tape(input: &[u8], config: ParserConfig) -> Result<Tape> {
    let index = build_structural_index(input)?;
    let b = Builder {
        input,
        index,
        vs_cursor: 0,
        last_end: 0,
        entries: Vec::with_capacity(input.len() / 4 + 4),
        strings: Vec::with_capacity(input.len() / 2),
        intern: FastHashMap::default(),
        config,
        stack: SmallVec::new(),
    };
    b.run()
}

impl<'a> Builder<'a> {
    fn run(mut self) -> Result<Tape> {
        // Reserve the ROOT word; patched with the final tape length.
        self.entries.push(encode(tag::ROOT, 0));

        let mut state = State::ExpectValue { allow_close: false };

        loop {
            match state {
                State::ExpectValue { allow_close } => {
                    state = self.do_expect_value(allow_close)?;
                }
                State::ExpectKeyOrClose { allow_close } => {
                    state = self.do_expect_key_or_close(allow_close)?;
                }
                State::ExpectColon => {
                    state = self.do_expect_colon()?;
                }
                State::AfterValue => {
                    if self.stack.is_empty() {
                        break;
                    }
                    state = self.do_after_value()?;
                }
            }
        }

        // No structural token may remain unconsumed, and only whitespace
        // (or comments) may separate the last value from EOF.
        if let Some((pos, _)) = self.index.peek() {
            return Err(self.err(pos as usize, ErrorKind::UnexpectedChar, "trailing data after document"));
        }
        let mut tail = self.last_end;
        self.skip_ws(&mut tail);
        if tail != self.input.len() {
            return Err(self.err(tail, ErrorKind::UnexpectedChar, "trailing data after document"));
        }

        let total = self.entries.len();
        self.entries[0] = encode(tag::ROOT, total as u64);

        Ok(Tape {
            entries: self.entries,
            strings: self.strings,
        })
    }

    fn err(&self, offset: usize, kind: ErrorKind, msg: &'static str) -> JsonError {
        JsonError::new(kind, offset, msg)
    }

    fn skip_ws(&self, pos: &mut usize) {
        let mut p = *pos;
        loop {
            crate::simd::skip_whitespace(self.input, &mut p);
            while p < self.input.len() && self.input[p].is_ascii_whitespace() {
                p += 1;
            }
            if !self.config.allow_comments {
                break;
            }
            if self.input[p..].starts_with(b"//") {
                while p < self.input.len() && self.input[p] != b'\n' {
                    p += 1;
                }
                continue;
            }
            if self.input[p..].starts_with(b"/*") {
                p += 2;
                while p < self.input.len() && !self.input[p..].starts_with(b"*/") {
                    p += 1;
                }
                p = (p + 2).min(self.input.len());
                continue;
            }
            break;
        }
        *pos = p;
    }

    /// Check that only whitespace (or comments) lies between `from` and `to`.
    fn validate_gap(&self, from: usize, to: usize) -> Result<()> {
        let mut p = from;
        self.skip_ws(&mut p);
        if p != to {
            return Err(self.err(p, ErrorKind::UnexpectedChar, "unexpected character"));
        }
        Ok(())
    }

    fn depth(&self) -> u32 {
        self.stack.len() as u32
    }

    /// Pop the next value-start anchor Stage 1 recorded. One exists per
    /// call to `do_expect_value`/`do_expect_key_or_close`; its absence
    /// means Stage 1 found no non-whitespace byte before EOF.
    fn next_value_start(&mut self) -> Result<usize> {
        match self.index.value_starts().get(self.vs_cursor) {
            Some(&offset) => {
                self.vs_cursor += 1;
                Ok(offset as usize)
            }
            None => Err(self.err(self.input.len(), ErrorKind::UnexpectedEof, "expected a value")),
        }
    }

    fn do_expect_value(&mut self, allow_close: bool) -> Result<State> {
        let start = self.next_value_start()?;
        match self.index.peek() {
            Some((pos, b'"')) if pos as usize == start => {
                self.index.advance();
                let close = self.expect_closing_quote()?;
                let s = self.parse_string_body(pos as usize, close)?;
                let offset = self.push_string(&s, false);
                self.entries.push(encode(tag::STRING, offset as u64));
                self.last_end = close + 1;
                Ok(State::AfterValue)
            }
            Some((pos, b'{')) if pos as usize == start => {
                self.index.advance();
                self.open_container(pos as usize, ContainerKind::Object)?;
                Ok(State::ExpectKeyOrClose { allow_close: true })
            }
            Some((pos, b'[')) if pos as usize == start => {
                self.index.advance();
                self.open_container(pos as usize, ContainerKind::Array)?;
                Ok(State::ExpectValue { allow_close: true })
            }
            Some((pos, b']')) if allow_close && pos as usize == start => {
                self.index.advance();
                self.close_container(pos as usize, ContainerKind::Array)?;
                Ok(State::AfterValue)
            }
            _ => self.dispatch_scalar(start),
        }
    }

    fn dispatch_scalar(&mut self, start: usize) -> Result<State> {
        let byte = *self
            .input
            .get(start)
            .ok_or_else(|| self.err(start, ErrorKind::UnexpectedEof, "expected a value"))?;

        match byte {
            b't' => {
                self.last_end = self.expect_literal(start, b"true")?;
                self.entries.push(encode(tag::TRUE, 0));
            }
            b'f' => {
                self.last_end = self.expect_literal(start, b"false")?;
                self.entries.push(encode(tag::FALSE, 0));
            }
            b'n' => {
                self.last_end = self.expect_literal(start, b"null")?;
                self.entries.push(encode(tag::NULL, 0));
            }
            b'-' | b'0'..=b'9' => {
                self.parse_number_value(start)?;
            }
            _ => return Err(self.err(start, ErrorKind::UnexpectedChar, "unexpected character")),
        }
        Ok(State::AfterValue)
    }

    fn do_expect_key_or_close(&mut self, allow_close: bool) -> Result<State> {
        let start = self.next_value_start()?;
        match self.index.peek() {
            Some((pos, b'}')) if allow_close && pos as usize == start => {
                self.index.advance();
                self.close_container(pos as usize, ContainerKind::Object)?;
                Ok(State::AfterValue)
            }
            Some((pos, b'"')) if pos as usize == start => {
                self.index.advance();
                let close = self.expect_closing_quote()?;
                let key = self.parse_string_body(pos as usize, close)?;
                if self.config.detect_duplicate_keys {
                    let frame = self.stack.last_mut().expect("inside an object");
                    let set = frame.seen_keys.get_or_insert_with(Default::default);
                    if !set.insert(key.clone().into_bytes().into_boxed_slice()) {
                        return Err(self.err(pos as usize, ErrorKind::DuplicateKey, "duplicate key"));
                    }
                }
                let offset = self.push_string(&key, true);
                self.entries.push(encode(tag::STRING, offset as u64));
                self.last_end = close + 1;
                Ok(State::ExpectColon)
            }
            _ => Err(self.err(start, ErrorKind::UnexpectedChar, "expected key or '}'")),
        }
    }

    fn do_expect_colon(&mut self) -> Result<State> {
        match self.index.advance() {
            Some((pos, b':')) => {
                self.validate_gap(self.last_end, pos as usize)?;
                Ok(State::ExpectValue { allow_close: false })
            }
            Some((pos, _)) => Err(self.err(pos as usize, ErrorKind::UnexpectedChar, "expected ':'")),
            None => Err(self.err(self.input.len(), ErrorKind::UnexpectedEof, "expected ':'")),
        }
    }

    fn do_after_value(&mut self) -> Result<State> {
        let kind = self.stack.last().expect("non-empty stack").kind;
        match self.index.advance() {
            Some((pos, b',')) if kind == ContainerKind::Object => {
                self.validate_gap(self.last_end, pos as usize)?;
                Ok(State::ExpectKeyOrClose {
                    allow_close: self.config.allow_trailing_comma,
                })
            }
            Some((pos, b'}')) if kind == ContainerKind::Object => {
                self.validate_gap(self.last_end, pos as usize)?;
                self.close_container(pos as usize, ContainerKind::Object)?;
                Ok(State::AfterValue)
            }
            Some((pos, b',')) if kind == ContainerKind::Array => {
                self.validate_gap(self.last_end, pos as usize)?;
                Ok(State::ExpectValue {
                    allow_close: self.config.allow_trailing_comma,
                })
            }
            Some((pos, b']')) if kind == ContainerKind::Array => {
                self.validate_gap(self.last_end, pos as usize)?;
                self.close_container(pos as usize, ContainerKind::Array)?;
                Ok(State::AfterValue)
            }
            Some((pos, _)) => Err(self.err(pos as usize, ErrorKind::UnexpectedChar, "expected ',' or close")),
            None => Err(self.err(self.input.len(), ErrorKind::UnexpectedEof, "expected ',' or close")),
        }
    }

    fn open_container(&mut self, pos: usize, kind: ContainerKind) -> Result<()> {
        if self.depth() >= self.config.max_depth {
            return Err(self.err(pos, ErrorKind::DepthExceeded, "max_depth exceeded"));
        }
        let begin_index = self.entries.len();
        let tag = match kind {
            ContainerKind::Object => tag::OBJ_BEGIN,
            ContainerKind::Array => tag::ARR_BEGIN,
        };
        self.entries.push(encode(tag, 0));
        self.stack.push(Frame {
            kind,
            begin_index,
            seen_keys: None,
        });
        Ok(())
    }

    fn close_container(&mut self, pos: usize, expected: ContainerKind) -> Result<()> {
        let frame = self
            .stack
            .pop()
            .filter(|f| f.kind == expected)
            .ok_or_else(|| self.err(pos, ErrorKind::UnexpectedChar, "mismatched close"))?;
        let end_index = self.entries.len();
        let end_tag = match expected {
            ContainerKind::Object => tag::OBJ_END,
            ContainerKind::Array => tag::ARR_END,
        };
        self.entries.push(encode(end_tag, frame.begin_index as u64));
        let begin_tag = match expected {
            ContainerKind::Object => tag::OBJ_BEGIN,
            ContainerKind::Array => tag::ARR_BEGIN,
        };
        self.entries[frame.begin_index] = encode(begin_tag, end_index as u64);
        self.last_end = pos + 1;
        Ok(())
    }

    fn expect_literal(&self, start: usize, literal: &'static [u8]) -> Result<usize> {
        let end = start + literal.len();
        if end > self.input.len() || &self.input[start..end] != literal {
            return Err(self.err(start, ErrorKind::UnexpectedChar, "malformed literal"));
        }
        Ok(end)
    }

    fn parse_number_value(&mut self, start: usize) -> Result<()> {
        let (value, end) = parse_number(self.input, start)?;
        match value {
            ParsedNumber::I64(v) => {
                self.entries.push(encode(tag::INT64, 0));
                self.entries.push(v as u64);
            }
            ParsedNumber::F64(v) => {
                self.entries.push(encode(tag::DOUBLE, 0));
                self.entries.push(v.to_bits());
            }
        }
        self.last_end = end;
        Ok(())
    }

    /// The structural list guarantees that the entry right after an opening
    /// quote is its matching closing quote (escaped quotes never appear in
    /// the list), so the string's end is read off the index, not searched
    /// for.
    fn expect_closing_quote(&mut self) -> Result<usize> {
        match self.index.advance() {
            Some((pos, b'"')) => Ok(pos as usize),
            Some((pos, _)) => Err(self.err(
                pos as usize,
                ErrorKind::UnexpectedChar,
                "malformed string boundary",
            )),
            None => Err(self.err(self.input.len(), ErrorKind::UnterminatedString, "unterminated string")),
        }
    }

    /// Decode the bytes strictly between `open_pos` and `close_pos` (both
    /// quote positions) into an unescaped `String`.
    fn parse_string_body(&mut self, open_pos: usize, close_pos: usize) -> Result<String> {
        let mut cursor = open_pos + 1;
        let mut out = Vec::with_capacity(close_pos.saturating_sub(cursor));

        while cursor < close_pos {
            let seg_start = cursor;
            skip_plain_string_bytes(self.input, &mut cursor);
            out.extend_from_slice(&self.input[seg_start..cursor.min(close_pos)]);
            cursor = cursor.min(close_pos);
            if cursor >= close_pos {
                break;
            }

            let b = self.input[cursor];
            match b {
                b'\\' => {
                    cursor += 1;
                    self.decode_escape(&mut cursor, &mut out)?;
                }
                _ if b < 0x20 => {
                    return Err(self.err(
                        cursor,
                        ErrorKind::BadEscape,
                        "unescaped control byte in string",
                    ));
                }
                _ => {
                    out.push(b);
                    cursor += 1;
                }
            }
        }

        if cursor != close_pos {
            return Err(self.err(cursor, ErrorKind::UnterminatedString, "string boundary mismatch"));
        }

        let s = simdutf8::basic::from_utf8(&out)
            .map_err(|_| self.err(open_pos, ErrorKind::BadEscape, "invalid UTF-8 in string"))?;
        Ok(s.to_owned())
    }

    fn decode_escape(&self, cursor: &mut usize, out: &mut Vec<u8>) -> Result<()> {
        let esc = *self
            .input
            .get(*cursor)
            .ok_or_else(|| self.err(*cursor, ErrorKind::BadEscape, "truncated escape"))?;
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
                        return Err(self.err(
                            *cursor,
                            ErrorKind::BadUtf16Surrogate,
                            "high surrogate without low surrogate",
                        ));
                    }
                    *cursor += 2;
                    let low = self.parse_hex4(*cursor)?;
                    *cursor += 4;
                    if !(0xDC00..=0xDFFF).contains(&low) {
                        return Err(self.err(
                            *cursor,
                            ErrorKind::BadUtf16Surrogate,
                            "invalid low surrogate",
                        ));
                    }
                    let c = 0x10000 + ((cp - 0xD800) << 10) + (low - 0xDC00);
                    push_utf8(out, c);
                } else if (0xDC00..=0xDFFF).contains(&cp) {
                    return Err(self.err(
                        *cursor,
                        ErrorKind::BadUtf16Surrogate,
                        "lone low surrogate",
                    ));
                } else {
                    push_utf8(out, cp);
                }
            }
            _ => {
                return Err(self.err(*cursor, ErrorKind::BadEscape, "unknown escape sequence"));
            }
        }
        Ok(())
    }

    fn parse_hex4(&self, pos: usize) -> Result<u32> {
        let bytes = self
            .input
            .get(pos..pos + 4)
            .ok_or_else(|| self.err(pos, ErrorKind::BadEscape, "truncated \\u escape"))?;
        let s = std::str::from_utf8(bytes)
            .map_err(|_| self.err(pos, ErrorKind::BadEscape, "malformed \\u escape"))?;
        u32::from_str_radix(s, 16)
            .map_err(|_| self.err(pos, ErrorKind::BadEscape, "malformed \\u escape"))
    }

    fn push_string(&mut self, s: &str, is_key: bool) -> u32 {
        let bytes = s.as_bytes();
        if is_key && self.config.intern_keys {
            if let Some(&offset) = self.intern.get(bytes) {
                return offset;
            }
        }
        let offset = self.strings.len() as u32;
        push_varint(&mut self.strings, bytes.len() as u64);
        self.strings.extend_from_slice(bytes);
        if is_key && self.config.intern_keys && self.intern.len() < MAX_INTERN_ENTRIES {
            self.intern.insert(bytes.into(), offset);
        }
        offset
    }
}

fn push_utf8(out: &mut Vec<u8>, code_point: u32) {
    match char::from_u32(code_point) {
        Some(c) => {
            let mut buf = [0u8; 4];
            out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
        }
        None => {
            // Unreachable given the surrogate validation above, but fall
            // back to the replacement character rather than panic.
            out.extend_from_slice("\u{FFFD}".as_bytes());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tape_of(s: &str) -> Tape {
        build_tape(s.as_bytes(), ParserConfig::default()).unwrap()
    }

    #[test]
    fn simple_object_tape_shape() {
        let t = tape_of(r#"{"name":"Alice","age":30,"active":true}"#);
        // ROOT + OBJ_BEGIN + 3*(key STRING + value) with age as 2 words + OBJ_END
        // = 1 + 1 + (1+1) + (1+2) + (1+1) + 1 = 10
        assert_eq!(t.len(), 10);
        assert_eq!(t.entry(0).0, tag::ROOT);
        assert_eq!(t.entry(1).0, tag::OBJ_BEGIN);
        assert_eq!(t.entry(t.len() - 1).0, tag::OBJ_END);
    }

    #[test]
    fn container_begin_end_are_partners() {
        let t = tape_of(r#"[1,2,3,4,5]"#);
        let (tag_begin, end_idx) = t.entry(1);
        assert_eq!(tag_begin, tag::ARR_BEGIN);
        let (tag_end, begin_idx) = t.entry(end_idx as usize);
        assert_eq!(tag_end, tag::ARR_END);
        assert_eq!(begin_idx as usize, 1);
    }

    #[test]
    fn nested_pointer_shape() {
        let t = tape_of(r#"{"a":{"b":{"c":"deep"}}}"#);
        assert_eq!(t.entry(1).0, tag::OBJ_BEGIN);
    }

    #[test]
    fn surrogate_pair_decodes_to_emoji() {
        let t = tape_of(r#""😊""#);
        let (tg, payload) = t.entry(1);
        assert_eq!(tg, tag::STRING);
        assert_eq!(t.string_at(payload as u32).as_bytes(), [0xF0, 0x9F, 0x98, 0x8A]);
    }

    #[test]
    fn lone_high_surrogate_is_an_error() {
        let err = build_tape(br#""\uD83D""#, ParserConfig::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadUtf16Surrogate);
    }

    #[test]
    fn depth_exceeded() {
        let mut s = String::new();
        for _ in 0..5 {
            s.push('[');
        }
        for _ in 0..5 {
            s.push(']');
        }
        let cfg = ParserConfig {
            max_depth: 4,
            ..Default::default()
        };
        let err = build_tape(s.as_bytes(), cfg).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DepthExceeded);
    }

    #[test]
    fn duplicate_key_detection() {
        let cfg = ParserConfig {
            detect_duplicate_keys: true,
            ..Default::default()
        };
        let err = build_tape(br#"{"a":1,"a":2}"#, cfg).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateKey);
    }

    #[test]
    fn control_byte_in_string_rejected() {
        let err = build_tape(b"\"a\x01b\"", ParserConfig::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadEscape);
    }

    #[test]
    fn empty_containers() {
        let t = tape_of("{}");
        assert_eq!(t.len(), 3); // ROOT, OBJ_BEGIN, OBJ_END
        let t = tape_of("[]");
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn trailing_comma_rejected_by_default() {
        assert!(build_tape(b"[1,2,]", ParserConfig::default()).is_err());
    }

    #[test]
    fn trailing_comma_accepted_when_configured() {
        let cfg = ParserConfig {
            allow_trailing_comma: true,
            ..Default::default()
        };
        assert!(build_tape(b"[1,2,]", cfg).is_ok());
    }
}
