use crate::model::{Connection, Span};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A deployable cable segment from the inventory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fiber {
    pub name: String,
    pub armored: bool,
    #[serde(flatten)]
    pub span: Span,
}

impl Fiber {
    pub fn new(name: impl Into<String>, cores: u32, length: u32) -> Self {
        Self {
            name: name.into(),
            armored: false,
            span: Span::new(cores, length),
        }
    }

    pub fn armored(mut self, armored: bool) -> Self {
        self.armored = armored;
        self
    }
}

impl Connection for Fiber {
    fn span(&self) -> Span {
        self.span
    }
}

impl fmt::Display for Fiber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} cores, {} m{})",
            self.name,
            self.span.cores,
            self.span.length,
            if self.armored { ", armored" } else { "" }
        )
    }
}
