pub mod config;
pub mod error;
pub mod error_ext;
pub mod types;

pub use config::*;
pub use error::*;
pub use error_ext::*;
pub use types::*;
