//! Path expressions into structured documents.
//!
//! Grammar: dot-separated keys, each optionally followed by bracketed
//! selectors. `[N]` selects a sequence index and `[+]` (only as the last
//! segment) appends to a sequence.
//!
//! ```text
//! spec.state
//! spec.template.metadata.name
//! spec.profiles[+]
//! spec.profiles[0]
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::DocumentError;

/// One step of a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
    Append,
}

/// A parsed path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    raw: String,
    segments: Vec<Segment>,
}

impl FieldPath {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether the path ends in `[+]`.
    pub fn is_append(&self) -> bool {
        matches!(self.segments.last(), Some(Segment::Append))
    }

    /// The path without a trailing `[+]`.
    pub fn without_append(&self) -> FieldPath {
        let mut segments = self.segments.clone();
        if self.is_append() {
            segments.pop();
        }
        FieldPath {
            raw: self.raw.trim_end_matches("[+]").to_string(),
            segments,
        }
    }

    fn invalid(raw: &str, reason: impl Into<String>) -> DocumentError {
        DocumentError::InvalidPath {
            path: raw.to_string(),
            reason: reason.into(),
        }
    }
}

impl FromStr for FieldPath {
    type Err = DocumentError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw.is_empty() {
            return Err(Self::invalid(raw, "empty path"));
        }

        let mut segments = Vec::new();
        for part in raw.split('.') {
            let (key, mut selectors) = match part.find('[') {
                Some(i) => (&part[..i], &part[i..]),
                None => (part, ""),
            };
            if key.is_empty() {
                return Err(Self::invalid(raw, "empty key"));
            }
            segments.push(Segment::Key(key.to_string()));

            while !selectors.is_empty() {
                let close = selectors
                    .find(']')
                    .ok_or_else(|| Self::invalid(raw, "unclosed '['"))?;
                if !selectors.starts_with('[') {
                    return Err(Self::invalid(raw, format!("unexpected {:?}", selectors)));
                }
                let selector = &selectors[1..close];
                let segment = match selector {
                    "+" => Segment::Append,
                    index => Segment::Index(index.parse().map_err(|_| {
                        Self::invalid(raw, format!("invalid index {:?}", index))
                    })?),
                };
                segments.push(segment);
                selectors = &selectors[close + 1..];
            }
        }

        if let Some(pos) = segments.iter().position(|s| *s == Segment::Append) {
            if pos != segments.len() - 1 {
                return Err(Self::invalid(raw, "'[+]' is only allowed at the end"));
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
