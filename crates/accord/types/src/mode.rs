use serde::{Deserialize, Serialize};
use std::fmt;

/// How a namespace treats definitions.
///
/// Fixed for the lifetime of a coordinator; never switched per request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatingMode {
    /// Definitions are broadcast to, and confirmed by, the trust network.
    #[default]
    Multiparty,
    /// Single-party node: definitions stay local, nothing is broadcast.
    Gateway,
}

impl OperatingMode {
    pub fn is_multiparty(&self) -> bool {
        matches!(self, OperatingMode::Multiparty)
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperatingMode::Multiparty => write!(f, "multiparty"),
            OperatingMode::Gateway => write!(f, "gateway"),
        }
    }
}
