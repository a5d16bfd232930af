pub mod context;
pub mod models;
pub mod segment;

pub use context::*;
pub use segment::*;
