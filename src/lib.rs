//! Subtitle codec library root.

/// Crate version, from `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod encoding;
pub mod error;
pub mod formats;
pub mod model;

/// Convenience alias for `Result<T, SubxError>`.
pub type Result<T> = error::SubxResult<T>;
