// ABOUTME: Error types for content decomposition and media extraction.
// ABOUTME: Provides ContentError with sentinel, lookup, and pattern variants.

use std::fmt;
use thiserror::Error;

/// The kind of span a sentinel token stands in for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SentinelKind {
    Video,
    Image,
    Link,
}

impl SentinelKind {
    /// The upper-case tag used inside the sentinel token.
    pub fn tag(self) -> &'static str {
        match self {
            SentinelKind::Video => "VIDEO",
            SentinelKind::Image => "IMAGE",
            SentinelKind::Link => "LINK",
        }
    }

    pub(crate) fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "VIDEO" => Some(SentinelKind::Video),
            "IMAGE" => Some(SentinelKind::Image),
            "LINK" => Some(SentinelKind::Link),
            _ => None,
        }
    }
}

impl fmt::Display for SentinelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SentinelKind::Video => "video",
            SentinelKind::Image => "image",
            SentinelKind::Link => "link",
        };
        write!(f, "{}", s)
    }
}

/// Errors raised inside the decomposition stages.
///
/// These never cross the total public functions; they surface only through
/// the `try_` variants and the builder.
#[derive(Debug, Error)]
pub enum ContentError {
    /// The input already contains text shaped like an internal sentinel token.
    #[error("input already contains a sentinel token: {0}")]
    SentinelCollision(String),

    /// A sentinel token referenced a side-array slot that was never filled.
    #[error("no {kind} recorded for sentinel index {index}")]
    MissingSentinel { kind: SentinelKind, index: usize },

    /// A sentinel token appeared twice, so one copy was assembled from document text.
    #[error("{kind} sentinel index {index} appears more than once")]
    DuplicateSentinel { kind: SentinelKind, index: usize },

    /// A configured pattern or allow-list could not be compiled.
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),
}

impl ContentError {
    /// Creates an InvalidPattern error from an underlying build error.
    pub fn pattern(err: impl fmt::Display) -> Self {
        ContentError::InvalidPattern(err.to_string())
    }

    /// Returns true if this error came from a sentinel token already in the input.
    pub fn is_collision(&self) -> bool {
        matches!(self, ContentError::SentinelCollision(_))
    }
}
