//! Parser and serializer configuration surfaces.
//!
//! Plain `Copy`/`Clone` option structs with `Default` impls: callers
//! build one with `..Default::default()` and override only what they need.

/// Options governing a single parse call.
#[derive(Debug, Clone, Copy)]
pub struct ParserConfig {
    /// Maximum container nesting depth. Exceeding it raises `depth_exceeded`.
    pub max_depth: u32,
    /// Accept a trailing comma immediately before `]` or `}`.
    pub allow_trailing_comma: bool,
    /// Skip `// line` and `/* block */` comments wherever whitespace is permitted.
    pub allow_comments: bool,
    /// Raise `duplicate_key` on a repeated key within one object, instead of
    /// silently keeping the last occurrence.
    pub detect_duplicate_keys: bool,
    /// Intern object keys into the tape's string pool by byte-exact lookup.
    /// String values are never interned. Bounded by `MAX_INTERN_ENTRIES` to
    /// keep the intern table from growing unbounded on adversarial input
    /// with many distinct "keys".
    pub intern_keys: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_depth: 1000,
            allow_trailing_comma: false,
            allow_comments: false,
            detect_duplicate_keys: false,
            intern_keys: true,
        }
    }
}

/// Options governing serialization.
#[derive(Debug, Clone)]
pub struct SerializerConfig {
    /// Per-level indent string. Empty means compact output.
    pub indent: String,
    /// Emit map keys in lexicographic byte order instead of insertion order.
    pub sort_keys: bool,
    /// Emit non-ASCII bytes as `\uXXXX` escapes instead of raw UTF-8.
    pub escape_unicode: bool,
    /// Emit `/` as `\/`.
    pub escape_forward_slash: bool,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            indent: String::new(),
            sort_keys: false,
            escape_unicode: false,
            escape_forward_slash: false,
        }
    }
}

impl SerializerConfig {
    pub fn compact() -> Self {
        Self::default()
    }

    pub fn pretty(indent: impl Into<String>) -> Self {
        Self {
            indent: indent.into(),
            ..Default::default()
        }
    }
}
