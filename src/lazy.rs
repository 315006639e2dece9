//! The lazy navigator: a cursor over a [`Tape`] exposing key/index/pointer
//! lookup and array iteration without materializing a value tree. Siblings
//! that are never visited are never touched.

use std::rc::Rc;

use crate::config::ParserConfig;
use crate::error::{ErrorKind, JsonError, Result};
use crate::tape::{self, tag, Tape};

/// A parsed document: Stage 1 + Stage 2 output, handed out as cursors.
/// Cheap to clone (an `Rc` bump); the tape itself is immutable once built,
/// so many `Document`/`LazyValue` handles can share it without locking.
#[derive(Clone)]
pub struct Document {
    tape: Rc<Tape>,
}

/// Build the tape for `source` and return a handle for lazy navigation.
pub fn parse_lazy(source: &[u8], config: ParserConfig) -> Result<Document> {
    let built = tape::build_tape(source, config)?;
    Ok(Document {
        tape: Rc::new(built),
    })
}

impl Document {
    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    /// A cursor over the document's top-level value.
    pub fn root(&self) -> LazyValue {
        LazyValue {
            tape: self.tape.clone(),
            index: Some(self.tape.root_value_index()),
        }
    }
}

/// A cursor pair: a shared tape handle plus an entry index, or `None` for
/// an "absent" cursor produced by a missed lookup. Type queries on an
/// absent cursor report absence without raising; its primitive extractors
/// raise [`ErrorKind::TypeError`].
#[derive(Clone)]
pub struct LazyValue {
    tape: Rc<Tape>,
    index: Option<usize>,
}

fn type_error() -> JsonError {
    JsonError::new(ErrorKind::TypeError, 0, "value is not of the requested type")
}

/// Index immediately following the value at `index` (a container's
/// matching END, a number's second word, or the next entry otherwise).
fn next_index(tape: &Tape, index: usize) -> usize {
    match tape.entry(index).0 {
        tag::OBJ_BEGIN | tag::ARR_BEGIN => {
            let (_, end) = tape.entry(index);
            end as usize + 1
        }
        tag::INT64 | tag::DOUBLE => index + 2,
        _ => index + 1,
    }
}

impl LazyValue {
    fn absent(tape: Rc<Tape>) -> Self {
        LazyValue { tape, index: None }
    }

    fn entry(&self) -> Option<(u8, u64)> {
        self.index.map(|i| self.tape.entry(i))
    }

    pub fn is_absent(&self) -> bool {
        self.index.is_none()
    }

    pub fn is_null(&self) -> bool {
        matches!(self.entry(), Some((tag::NULL, _)))
    }

    pub fn is_bool(&self) -> bool {
        matches!(self.entry(), Some((tag::TRUE, _)) | Some((tag::FALSE, _)))
    }

    pub fn is_number(&self) -> bool {
        matches!(self.entry(), Some((tag::INT64, _)) | Some((tag::DOUBLE, _)))
    }

    pub fn is_string(&self) -> bool {
        matches!(self.entry(), Some((tag::STRING, _)))
    }

    pub fn is_array(&self) -> bool {
        matches!(self.entry(), Some((tag::ARR_BEGIN, _)))
    }

    pub fn is_object(&self) -> bool {
        matches!(self.entry(), Some((tag::OBJ_BEGIN, _)))
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self.entry() {
            Some((tag::TRUE, _)) => Ok(true),
            Some((tag::FALSE, _)) => Ok(false),
            _ => Err(type_error()),
        }
    }

    pub fn as_i64(&self) -> Result<i64> {
        match self.entry() {
            Some((tag::INT64, _)) => Ok(self.tape.raw_bits(self.index.unwrap() + 1) as i64),
            _ => Err(type_error()),
        }
    }

    pub fn as_f64(&self) -> Result<f64> {
        match self.entry() {
            Some((tag::DOUBLE, _)) => {
                Ok(f64::from_bits(self.tape.raw_bits(self.index.unwrap() + 1)))
            }
            Some((tag::INT64, _)) => Ok(self.tape.raw_bits(self.index.unwrap() + 1) as i64 as f64),
            _ => Err(type_error()),
        }
    }

    pub fn as_str(&self) -> Result<&str> {
        match self.entry() {
            Some((tag::STRING, payload)) => Ok(self.tape.string_at(payload as u32)),
            _ => Err(type_error()),
        }
    }

    /// Walk the immediate children of an object cursor looking for `key`,
    /// jumping over each unmatched value with the tape's jump-over stride.
    /// Linear in the number of keys in *this* object only.
    pub fn child_by_key(&self, key: &str) -> LazyValue {
        let Some(begin) = self.index.filter(|&i| self.tape.entry(i).0 == tag::OBJ_BEGIN) else {
            return LazyValue::absent(self.tape.clone());
        };
        let (_, end) = self.tape.entry(begin);
        let end = end as usize;
        let mut cur = begin + 1;
        while cur < end {
            let (key_tag, key_payload) = self.tape.entry(cur);
            debug_assert_eq!(key_tag, tag::STRING, "object entries alternate key/value");
            let value_index = cur + 1;
            if self.tape.string_at(key_payload as u32) == key {
                return LazyValue {
                    tape: self.tape.clone(),
                    index: Some(value_index),
                };
            }
            cur = next_index(&self.tape, value_index);
        }
        LazyValue::absent(self.tape.clone())
    }

    /// Skip `i` values in an array cursor using the same jump-over
    /// discipline; O(i) with a small constant.
    pub fn child_by_index(&self, i: usize) -> LazyValue {
        let Some(begin) = self.index.filter(|&idx| self.tape.entry(idx).0 == tag::ARR_BEGIN)
        else {
            return LazyValue::absent(self.tape.clone());
        };
        let (_, end) = self.tape.entry(begin);
        let end = end as usize;
        let mut cur = begin + 1;
        let mut remaining = i;
        while cur < end {
            if remaining == 0 {
                return LazyValue {
                    tape: self.tape.clone(),
                    index: Some(cur),
                };
            }
            remaining -= 1;
            cur = next_index(&self.tape, cur);
        }
        LazyValue::absent(self.tape.clone())
    }

    /// Iterate the elements of an array cursor lazily; each step advances
    /// by one jump-over stride. Finite, single-pass, not restartable
    /// without a fresh cursor.
    pub fn iter_array(&self) -> ArrayIter {
        match self.index.filter(|&i| self.tape.entry(i).0 == tag::ARR_BEGIN) {
            Some(begin) => {
                let (_, end) = self.tape.entry(begin);
                ArrayIter {
                    tape: self.tape.clone(),
                    cur: begin + 1,
                    end: end as usize,
                }
            }
            None => ArrayIter {
                tape: self.tape.clone(),
                cur: 0,
                end: 0,
            },
        }
    }

    /// RFC 6901 pointer lookup. Each `/`-separated segment is unescaped
    /// `~1 -> /` then `~0 -> ~` (order matters). On any mismatch — missing
    /// key, out-of-range or malformed array index, indexing into a scalar
    /// — returns an absent cursor rather than raising.
    pub fn pointer(&self, path: &str) -> LazyValue {
        if path.is_empty() {
            return self.clone();
        }
        if !path.starts_with('/') {
            return LazyValue::absent(self.tape.clone());
        }
        let mut cursor = self.clone();
        for raw_segment in path[1..].split('/') {
            let segment = unescape_pointer_segment(raw_segment);
            cursor = if cursor.is_object() {
                cursor.child_by_key(&segment)
            } else if cursor.is_array() {
                match parse_array_index(&segment) {
                    Some(i) => cursor.child_by_index(i),
                    None => LazyValue::absent(cursor.tape.clone()),
                }
            } else {
                LazyValue::absent(cursor.tape.clone())
            };
            if cursor.is_absent() {
                break;
            }
        }
        cursor
    }
}

fn unescape_pointer_segment(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

fn parse_array_index(segment: &str) -> Option<usize> {
    if segment == "0" {
        return Some(0);
    }
    if segment.is_empty() || segment.starts_with('0') || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

/// Lazy, single-pass iterator over an array cursor's elements.
pub struct ArrayIter {
    tape: Rc<Tape>,
    cur: usize,
    end: usize,
}

impl Iterator for ArrayIter {
    type Item = LazyValue;

    fn next(&mut self) -> Option<LazyValue> {
        if self.cur >= self.end {
            return None;
        }
        let index = self.cur;
        self.cur = next_index(&self.tape, index);
        Some(LazyValue {
            tape: self.tape.clone(),
            index: Some(index),
        })
    }
}
