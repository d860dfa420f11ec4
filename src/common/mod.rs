pub mod config;
mod error;
mod types;

pub use config::*;
pub use error::*;
pub use types::*;
