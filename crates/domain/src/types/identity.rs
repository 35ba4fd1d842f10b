//! Identity tokens and user clusters

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::constants::{PROFILE_TOKEN_PREFIX, SESSION_TOKEN_PREFIX};

/// Set of opaque, namespaced identity tokens extracted from one archive
/// (`pid:<profileId>` and `sid:<sessionId>`).
pub type IdentitySet = BTreeSet<String>;

/// Namespaced token for a profile id, or `None` for blank ids, which carry
/// no identity information and must never enter an [`IdentitySet`].
pub fn profile_token(profile_id: &str) -> Option<String> {
    let trimmed = profile_id.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(format!("{PROFILE_TOKEN_PREFIX}{trimmed}"))
    }
}

/// Namespaced token for a session id; blank ids yield `None`.
pub fn session_token(session_id: &str) -> Option<String> {
    let trimmed = session_id.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(format!("{SESSION_TOKEN_PREFIX}{trimmed}"))
    }
}

/// One end user, reconstructed as a connected component of the
/// "archives share at least one identifier" graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserGroup {
    /// Relative archive paths of this user, in processing order.
    /// Duplicate-free by construction (each archive is clustered once).
    pub files: Vec<String>,

    /// Union of the identity tokens of all member archives.
    pub identifiers: IdentitySet,
}

impl UserGroup {
    /// The archive that stands in for the whole group in later pipeline
    /// stages (merge target, cleaning unit).
    pub fn representative(&self) -> Option<&str> {
        self.files.first().map(String::as_str)
    }
}
