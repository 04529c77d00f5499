pub mod cli;
pub mod config;
pub mod logic;
pub mod model;
pub mod solver;
pub mod store;

pub use config::SolverConfig;

pub use logic::{AssignmentPipeline, CouplerEstimate, Reporter};

// Export all model types
pub use model::*;

pub use solver::{Backend, MicroLpBackend, SolveLimits, SolveStatus};

pub use store::{load_fibers, load_fibers_from_path, load_links, load_links_from_path, LoadError};
