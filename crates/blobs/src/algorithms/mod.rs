pub mod filters;
pub mod hull;
pub mod simplification;

pub use filters::*;
pub use hull::*;
pub use simplification::*;
