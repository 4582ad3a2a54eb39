pub mod config;
pub mod error;
pub mod metadata;
pub mod traits;

pub use config::*;
pub use error::*;
pub use metadata::*;
pub use traits::*;
