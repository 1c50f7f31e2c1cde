pub mod release;
pub mod validation;

pub use release::*;
pub use validation::*;
