use std::fmt;

use serde::{Deserialize, Serialize};

/// Authentication material for one upstream identity.
///
/// Serialized with the cookie names as keys; this is also the on-disk format
/// of the persisted credential file.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(rename = "SECURE_1PSID")]
    pub secure_1psid: String,
    #[serde(rename = "SECURE_1PSIDTS", default)]
    pub secure_1psidts: Option<String>,
}

impl Credentials {
    pub fn new(secure_1psid: impl Into<String>, secure_1psidts: Option<String>) -> Self {
        Self {
            secure_1psid: secure_1psid.into(),
            secure_1psidts,
        }
    }
}

// Secrets must never end up in logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("secure_1psid", &"***")
            .field(
                "secure_1psidts",
                &self.secure_1psidts.as_ref().map(|_| "***"),
            )
            .finish()
    }
}
