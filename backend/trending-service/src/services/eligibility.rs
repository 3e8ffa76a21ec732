use crate::models::{Account, Status, Visibility};

/// Whether an engagement event on `status` counts toward trending at all.
///
/// `status` must already be the proper (non-reblog) status and `owner` its
/// author. Ineligible events are dropped without error.
pub fn is_eligible(status: &Status, owner: &Account) -> bool {
    status.visibility == Visibility::Public
        && owner.discoverable
        && !owner.silenced
        && status.spoiler_text.trim().is_empty()
        && !status.sensitive
        && !status.is_reply()
}
