pub mod constraints;
pub mod couplers;
pub mod fitness;
pub mod objective;
pub mod pipeline;
pub mod report;

pub use constraints::{AssignmentMatrix, AssignmentProblem, ConstraintGenerator};
pub use couplers::CouplerEstimate;
pub use fitness::is_admissible;
pub use objective::ObjectiveComposer;
pub use pipeline::{order_links, AssignmentPipeline};
pub use report::Reporter;
