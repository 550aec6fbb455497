use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Identity carried inside a bearer token.
///
/// Field names on the wire are `userId`, `username` and `timestamp` so tokens
/// minted by the web client's login flow decode unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct IdentityClaim {
    #[serde(rename = "userId")]
    pub subject_id: String,
    #[serde(rename = "username")]
    pub display_name: String,
    /// Milliseconds since the Unix epoch at which the token was issued.
    #[serde(rename = "timestamp")]
    pub issued_at_epoch_ms: u64,
}

impl IdentityClaim {
    pub fn new(
        subject_id: impl Into<String>,
        display_name: impl Into<String>,
        issued_at_epoch_ms: u64,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            display_name: display_name.into(),
            issued_at_epoch_ms,
        }
    }
}
