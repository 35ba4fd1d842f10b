//! Identity token extraction from event streams

use timelens_domain::{profile_token, session_token, IdentitySet, Result};

use crate::ports::EventSource;

/// Collect the identity token set of one archive: every distinct
/// `sid:<sessionId>` and `pid:<profileId>` carried by its events. Blank
/// ids are skipped entirely.
pub fn collect_identifiers(source: &mut dyn EventSource) -> Result<IdentitySet> {
    let mut identifiers = IdentitySet::new();
    while let Some(event) = source.next_event()? {
        if let Some(token) = session_token(&event.session_id) {
            identifiers.insert(token);
        }
        if let Some(profile_id) = event.profile_id.as_deref() {
            if let Some(token) = profile_token(profile_id) {
                identifiers.insert(token);
            }
        }
    }
    Ok(identifiers)
}
