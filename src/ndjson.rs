//! The NDJSON framer: locates newline-separated top-level records and hands
//! each to the single-document parsers. Uses the same branchless SIMD scan
//! technique as the structural indexer, tracking only `\n`.
//!
//! Lines are LF-delimited only. A trailing `\r` is left as part of the line's byte
//! span and is the document parser's problem — in practice this makes an
//! LF-terminated CRLF file fail per-line with a trailing-garbage error,
//! which callers can work around with a CR-stripping configuration layer
//! if they need permissive CRLF support; this framer does not do it itself.

use crate::config::ParserConfig;
use crate::error::JsonError;
use crate::lazy::{parse_lazy, Document};
use crate::simd::{chunk_has_newline, CHUNK};
use crate::value::{parse_safe, Value};

/// A non-empty line's byte span `[begin, end)` within the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSpan {
    pub begin: usize,
    pub end: usize,
}

/// Scan `source` for newline-separated records. Empty lines (consecutive
/// `\n` or a trailing `\n` at end of input) are skipped. The framer itself
/// never fails; each line is parsed independently by the caller.
pub fn frame_lines(source: &[u8]) -> Vec<LineSpan> {
    let mut spans = Vec::new();
    let mut line_start = 0usize;
    let mut pos = 0usize;

    while pos < source.len() {
        // Bulk-skip chunks with no newline, same discipline as the
        // structural indexer's plain-byte runs.
        while pos + CHUNK <= source.len() && !chunk_has_newline(source, pos) {
            pos += CHUNK;
        }
        debug_assert!(pos <= source.len());
        match source[pos..].iter().position(|&b| b == b'\n') {
            Some(rel) => {
                let nl = pos + rel;
                if nl > line_start {
                    spans.push(LineSpan {
                        begin: line_start,
                        end: nl,
                    });
                }
                pos = nl + 1;
                line_start = pos;
            }
            None => {
                pos = source.len();
            }
        }
    }

    if line_start < source.len() {
        spans.push(LineSpan {
            begin: line_start,
            end: source.len(),
        });
    }

    spans
}

/// Parse every line of an NDJSON source independently into an owned
/// [`Value`], collecting per-line results. No cross-line state; a failure
/// on one line does not prevent parsing the rest.
pub fn parse_ndjson(source: &[u8], config: ParserConfig) -> Vec<Result<Value, JsonError>> {
    frame_lines(source)
        .into_iter()
        .map(|span| parse_safe(&source[span.begin..span.end], config))
        .collect()
}

/// Lazy variant: parse every line to a tape-backed [`Document`] instead of
/// an owned tree.
pub fn parse_ndjson_lazy(source: &[u8], config: ParserConfig) -> Vec<Result<Document, JsonError>> {
    frame_lines(source)
        .into_iter()
        .map(|span| parse_lazy(&source[span.begin..span.end], config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_three_lines() {
        let src = b"{\"a\":1}\n{\"a\":2}\n{\"a\":3}\n";
        let spans = frame_lines(src);
        assert_eq!(spans.len(), 3);
        assert_eq!(&src[spans[0].begin..spans[0].end], b"{\"a\":1}");
        assert_eq!(&src[spans[2].begin..spans[2].end], b"{\"a\":3}");
    }

    #[test]
    fn skips_empty_lines() {
        let src = b"{\"a\":1}\n\n\n{\"a\":2}\n";
        let spans = frame_lines(src);
        assert_eq!(spans.len(), 2);
    }

    #[test]
    fn no_trailing_newline_still_yields_last_line() {
        let src = b"{\"a\":1}\n{\"a\":2}";
        let spans = frame_lines(src);
        assert_eq!(spans.len(), 2);
        assert_eq!(&src[spans[1].begin..spans[1].end], b"{\"a\":2}");
    }

    #[test]
    fn each_line_parses_independently_of_failures() {
        let src = b"{\"a\":1}\nnot json\n{\"a\":3}\n";
        let results = parse_ndjson(src, ParserConfig::default());
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());
    }

    #[test]
    fn empty_source_yields_no_lines() {
        assert!(frame_lines(b"").is_empty());
    }

    #[test]
    fn spans_strictly_cover_source_order() {
        let src = b"a\nbb\nccc\n";
        let spans = frame_lines(src);
        for w in spans.windows(2) {
            assert!(w[0].end < w[1].begin);
        }
    }
}
