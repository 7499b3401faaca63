//! Path-addressed editing of structured documents.
//!
//! The pipeline only talks to the [`DocumentEditor`] trait; [`YamlEditor`]
//! is the in-process implementation. Documents are compared as parsed
//! [`Node`] trees and written back by patching only the edited values into
//! the original text.

mod layout;
mod node;
mod path;
mod yaml;

use std::path::Path;

pub use node::Node;
pub use path::{FieldPath, Segment};
pub use serde_yaml::Value;
pub use yaml::{Document, YamlEditor};

use crate::error::Result;

/// One declarative change to a document.
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    /// Set the value at a path (`[+]` at the end appends).
    Set { path: String, value: Value },
    /// Append to the sequence at a path.
    Append { path: String, value: Value },
    /// Replace the sequence at a path with an empty one.
    Clear { path: String },
}

impl Edit {
    pub fn set(path: &str, value: impl Into<Value>) -> Self {
        Self::Set {
            path: path.to_string(),
            value: value.into(),
        }
    }

    pub fn append(path: &str, value: impl Into<Value>) -> Self {
        Self::Append {
            path: path.to_string(),
            value: value.into(),
        }
    }

    pub fn clear(path: &str) -> Self {
        Self::Clear {
            path: path.to_string(),
        }
    }
}

/// Applies edits to a document file.
pub trait DocumentEditor: Send + Sync {
    /// Apply `edits` in order to the document at `file`.
    ///
    /// Either every edit is applied and the file rewritten, or the file is
    /// left untouched. Returns whether the document changed; an unchanged
    /// document is never rewritten.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError` if the file can't be read, parsed or written,
    /// or if a path does not resolve.
    fn edit(&self, file: &Path, edits: &[Edit]) -> Result<bool>;
}
