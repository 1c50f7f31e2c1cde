pub mod error;
pub mod traits;

#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "secret")]
pub mod secret;

pub use error::*;
pub use traits::*;
