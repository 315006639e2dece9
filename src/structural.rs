//! Stage 1: the structural indexer.
//!
//! Scans the source once, emitting every JSON-meaningful byte outside of
//! string bodies — `{ } [ ] " : ,` — plus, optionally, the offset of the
//! first non-whitespace byte of every scalar value. The tape builder
//! (`crate::tape`) walks this list instead of re-scanning the source.

use crate::error::{ErrorKind, JsonError, Result};
use crate::simd::{classify_chunk, mask_escaped_quotes, prefix_xor};

/// Bytes processed per classification chunk. 64 so a single `u64` bitmask
/// covers one chunk exactly; `classify_chunk` degrades to a scalar loop
/// internally on targets without wide SIMD, with identical output.
const SCAN_CHUNK: usize = 64;

/// The structural character list for a source document: parallel
/// `positions`/`characters` sequences (invariant: `positions` strictly
/// increasing; `characters[i]` drawn from `{ } [ ] " : ,`; every `"`
/// listed is unescaped), plus optional value-start offsets consumed by
/// the tape builder to avoid re-scanning for scalar literals.
#[derive(Debug, Default, Clone)]
pub struct StructuralIndex {
    positions: Vec<u32>,
    characters: Vec<u8>,
    value_starts: Vec<u32>,
    /// Read cursor used by the tape builder's linear walk.
    cursor: usize,
}

impl StructuralIndex {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn position(&self, i: usize) -> u32 {
        self.positions[i]
    }

    pub fn character(&self, i: usize) -> u8 {
        self.characters[i]
    }

    pub fn value_starts(&self) -> &[u32] {
        &self.value_starts
    }

    /// Current structural entry, or `None` at end of list.
    pub fn peek(&self) -> Option<(u32, u8)> {
        if self.cursor < self.positions.len() {
            Some((self.positions[self.cursor], self.characters[self.cursor]))
        } else {
            None
        }
    }

    /// Consume and return the current entry.
    pub fn advance(&mut self) -> Option<(u32, u8)> {
        let v = self.peek();
        if v.is_some() {
            self.cursor += 1;
        }
        v
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn reset_cursor(&mut self) {
        self.cursor = 0;
    }

    fn push(&mut self, pos: u32, ch: u8) {
        self.positions.push(pos);
        self.characters.push(ch);
    }
}

/// Scan `input` and build its [`StructuralIndex`].
///
/// Process fixed 64-byte chunks (the scalar tail handles the remainder):
/// classify bytes into quote/backslash/structural bitmasks, resolve
/// escaped quotes by backslash-run parity carried from the previous
/// chunk, compute the in-string mask by prefix-XOR carried across chunks
/// as a single parity bit, and emit offsets for structural bytes outside
/// strings plus every unescaped quote.
pub fn build_structural_index(input: &[u8]) -> Result<StructuralIndex> {
    let mut index = StructuralIndex::default();
    let mut pos = 0usize;

    // Carried state across chunk boundaries.
    let mut prev_escape_odd = false; // backslash run ending at chunk boundary has odd length
    let mut in_string_carry = false; // parity of unescaped quotes seen so far

    while pos < input.len() {
        let end = (pos + SCAN_CHUNK).min(input.len());
        let chunk = &input[pos..end];
        let masks = classify_chunk(chunk);

        let (unescaped_quotes, ends_odd) =
            mask_escaped_quotes(masks.quotes, masks.backslashes, prev_escape_odd);
        prev_escape_odd = ends_odd;

        let mut string_mask = prefix_xor(unescaped_quotes);
        if in_string_carry {
            string_mask = !string_mask;
        }
        // Parity of unescaped quotes in this chunk determines next carry.
        let quote_count_parity = (unescaped_quotes.count_ones() % 2) == 1;
        let next_carry = in_string_carry ^ quote_count_parity;

        // Structural bytes outside strings, plus every unescaped quote
        // (quotes delimit strings and are always structural regardless of
        // the mask, since the mask includes the opening quote's position
        // itself as "inside").
        let emit_mask = (masks.structurals & !string_mask) | unescaped_quotes;

        for i in 0..chunk.len() {
            let bit = 1u64 << i;
            if emit_mask & bit == 0 {
                continue;
            }
            let byte_pos = pos + i;
            index.push(byte_pos as u32, input[byte_pos]);
        }

        in_string_carry = next_carry;
        pos = end;
    }

    if in_string_carry {
        return Err(JsonError::new(
            ErrorKind::UnterminatedString,
            input.len(),
            "unterminated string",
        ));
    }

    index.value_starts = compute_value_starts(input, &index.positions, &index.characters);

    Ok(index)
}

/// Compute one value-start offset per "wants a value next" anchor: the
/// document start, plus the byte right after every `: , [ {`. Each offset
/// is the first non-whitespace byte at or after its anchor; an anchor with
/// no non-whitespace byte before EOF contributes nothing. The tape builder
/// consumes these one-for-one, in order, every time it begins a value or an
/// object key — the same anchors that produced them here.
fn compute_value_starts(input: &[u8], positions: &[u32], characters: &[u8]) -> Vec<u32> {
    let mut anchors = Vec::with_capacity(positions.len() + 1);
    anchors.push(0u32);
    for (i, &ch) in characters.iter().enumerate() {
        if matches!(ch, b':' | b',' | b'[' | b'{') {
            anchors.push(positions[i] + 1);
        }
    }

    let mut value_starts = Vec::with_capacity(anchors.len());
    for anchor in anchors {
        let mut p = anchor as usize;
        while p < input.len() && input[p].is_ascii_whitespace() {
            p += 1;
        }
        if p < input.len() {
            value_starts.push(p as u32);
        }
    }
    value_starts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(idx: &StructuralIndex) -> Vec<(u32, char)> {
        (0..idx.len())
            .map(|i| (idx.position(i), idx.character(i) as char))
            .collect()
    }

    #[test]
    fn simple_object() {
        let input = br#"{"a":1}"#;
        let idx = build_structural_index(input).unwrap();
        assert_eq!(
            chars(&idx),
            vec![(0, '{'), (1, '"'), (3, '"'), (4, ':'), (6, '}')]
        );
    }

    #[test]
    fn braces_inside_string_are_not_structural() {
        let input = br#"{"msg":"Hello, {world}!"}"#;
        let idx = build_structural_index(input).unwrap();
        // Only the outer braces, the two key quotes, the colon, and the two
        // string-delimiting quotes around the value should appear.
        let cs: Vec<char> = chars(&idx).into_iter().map(|(_, c)| c).collect();
        assert_eq!(cs, vec!['{', '"', '"', ':', '"', '"', '}']);
    }

    #[test]
    fn escaped_quote_not_a_delimiter() {
        let input = br#"["a\"b"]"#;
        let idx = build_structural_index(input).unwrap();
        let cs: Vec<char> = chars(&idx).into_iter().map(|(_, c)| c).collect();
        // `[`, opening quote, closing quote (after the escaped one), `]`
        assert_eq!(cs, vec!['[', '"', '"', ']']);
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let input = br#"{"a": "unterminated"#;
        let err = build_structural_index(input).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnterminatedString);
        assert_eq!(err.offset(), input.len());
    }

    #[test]
    fn positions_strictly_increasing() {
        let input = br#"{"a":[1,2,{"b":true}],"c":null}"#;
        let idx = build_structural_index(input).unwrap();
        for w in (0..idx.len()).collect::<Vec<_>>().windows(2) {
            assert!(idx.position(w[0]) < idx.position(w[1]));
        }
    }

    #[test]
    fn chunk_boundary_string_is_handled() {
        // A string that straddles the 64-byte scan chunk boundary.
        let mut s = String::from(r#"{"k":""#);
        while s.len() < 70 {
            s.push('x');
        }
        s.push_str("\"}");
        let idx = build_structural_index(s.as_bytes()).unwrap();
        let cs: Vec<char> = chars(&idx).into_iter().map(|(_, c)| c).collect();
        assert_eq!(cs, vec!['{', '"', '"', ':', '"', '"', '}']);
    }
}
