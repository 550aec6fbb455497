//! Data models shared across the upload pipeline.

mod identity;
mod upload;

pub use identity::*;
pub use upload::*;
