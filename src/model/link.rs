use crate::model::{Connection, Span};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a link: the ordered pair of locations it connects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinkId {
    pub source: String,
    pub destination: String,
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.source, self.destination)
    }
}

/// A required point-to-point connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    #[serde(flatten)]
    pub id: LinkId,
    #[serde(flatten)]
    pub span: Span,
}

impl Link {
    pub fn new(
        source: impl Into<String>,
        destination: impl Into<String>,
        cores: u32,
        length: u32,
    ) -> Self {
        Self {
            id: LinkId {
                source: source.into(),
                destination: destination.into(),
            },
            span: Span::new(cores, length),
        }
    }

    /// Sort key placing the hardest links first: core count dominates, length breaks ties
    pub fn priority(&self) -> u64 {
        self.span.cores as u64 * 1000 + self.span.length as u64
    }
}

impl Connection for Link {
    fn span(&self) -> Span {
        self.span
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.id.fmt(f)
    }
}
