pub mod connection;
pub mod fiber;
pub mod link;
pub mod report;

pub use connection::*;
pub use fiber::*;
pub use link::*;
pub use report::*;
