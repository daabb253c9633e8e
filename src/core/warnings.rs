use serde::Serialize;
use std::fmt;

/// Problems found in stored data while building reports.
///
/// A record that raises a warning is left out of every report; the warning
/// keeps a trace of it so it can be surfaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum Warning {
    /// Stored record could not be turned into a valid entry
    MalformedEntry { id: String, reason: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::MalformedEntry { id, reason } => {
                write!(f, "skipped malformed entry {}: {}", id, reason)
            }
        }
    }
}
