use serde::{Deserialize, Serialize};

/// Core count above which a connection counts as multicore.
pub const MULTICORE_THRESHOLD: u32 = 2;

/// Physical dimensions shared by fibers and links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub cores: u32,
    pub length: u32,
}

impl Span {
    pub fn new(cores: u32, length: u32) -> Self {
        Self { cores, length }
    }

    /// Span used for fibers whose record reports no usable cores
    pub fn dead() -> Self {
        Self {
            cores: 0,
            length: 0,
        }
    }

    pub fn is_multicore(&self) -> bool {
        self.cores > MULTICORE_THRESHOLD
    }
}

/// Anything characterised by a core count and a length.
pub trait Connection {
    fn span(&self) -> Span;

    fn cores(&self) -> u32 {
        self.span().cores
    }

    fn length(&self) -> u32 {
        self.span().length
    }

    fn is_multicore(&self) -> bool {
        self.span().is_multicore()
    }
}

impl Connection for Span {
    fn span(&self) -> Span {
        *self
    }
}
