//! Expensa Processing Library
//!
//! Turns a raw upload request body into a validated file part:
//!
//! - [`body`]: collect the request body into one buffer
//! - [`multipart`]: split a `multipart/form-data` body into named parts
//! - [`validator`]: apply the size and content-type policy to a file part

pub mod body;
pub mod multipart;
pub mod validator;

pub use body::BodyAccumulator;
pub use multipart::{parse_boundary, MultipartDecoder, MultipartError, MultipartForm, MultipartPart};
pub use validator::{normalize_mime_type, UploadValidator, ValidationError};
