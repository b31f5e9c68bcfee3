//! Logical column paths
//!
//! Capability metadata addresses columns by slash-separated logical paths.
//! Most paths are a single segment; nested segments address sub-fields such
//! as the synthetic `Value` path of a choice column.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A logical column path, one segment per nesting level
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnPath {
    segments: Vec<String>,
}

impl ColumnPath {
    /// A single-segment path for a root-level column
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            segments: vec![name.into()],
        }
    }

    /// A path from explicit segments
    pub fn from_segments(segments: impl IntoIterator<Item = String>) -> Self {
        Self {
            segments: segments.into_iter().collect(),
        }
    }

    /// Parse a slash-separated path
    pub fn parse(path: &str) -> Self {
        Self {
            segments: path
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// This path extended with a child segment
    pub fn append(&self, child: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(child.into());
        Self { segments }
    }

    /// Path segments in order
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for ColumnPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}
