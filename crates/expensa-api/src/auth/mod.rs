//! Authorization gate for uploads.
//!
//! The only thing the upload pipeline needs from the identity side is a yes/no
//! answer for an `Authorization` header value, plus the identity on yes.

use expensa_core::{IdentityClaim, TokenCodec};

/// Resolves the raw `Authorization` header into an identity.
///
/// `None` means the request is unauthorized, for any reason.
pub trait CredentialCheck: Send + Sync {
    fn check(&self, authorization: Option<&str>) -> Option<IdentityClaim>;
}

impl CredentialCheck for TokenCodec {
    fn check(&self, authorization: Option<&str>) -> Option<IdentityClaim> {
        self.from_authorization(authorization)
    }
}
