pub mod backend;
pub mod microlp;
pub mod model;

pub use backend::*;
pub use model::*;
pub use self::microlp::MicroLpBackend;
