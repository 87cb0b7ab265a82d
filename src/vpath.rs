//! Virtual Paths
//!
//! Rooted, normalized paths inside the staged filesystem tree.

use std::fmt;

/// A normalized path inside the virtual filesystem.
///
/// Held as plain segments under the root; never contains empty or `..`
/// segments. The root is the empty segment list and renders as `/`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VirtualPath {
    segments: Vec<String>,
}

impl VirtualPath {
    /// The filesystem root.
    pub fn root() -> Self {
        VirtualPath::default()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Append one segment. Callers pass a plain name without separators.
    pub(crate) fn push(&mut self, segment: &str) {
        self.segments.push(segment.to_string());
    }

    /// Drop the last segment. Returns false at the root.
    pub(crate) fn pop(&mut self) -> bool {
        self.segments.pop().is_some()
    }
}

impl fmt::Display for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            write!(f, "/")
        } else {
            write!(f, "/{}", self.segments.join("/"))
        }
    }
}
