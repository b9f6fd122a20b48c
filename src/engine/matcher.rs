// ABOUTME: Revision matching of runtime targets against a RevisionCheck.
// ABOUTME: A service is satisfied only when every resolved target matches.

use super::RevisionCheck;
use super::resolve::RuntimeTarget;

/// Tag equals the target revision and state equals the desired state,
/// ignoring case.
pub fn matches(target: &RuntimeTarget, check: &RevisionCheck) -> bool {
    target.tag().as_deref() == Some(check.target_revision())
        && target.state.eq_ignore_ascii_case(check.desired_state())
}

/// All-or-nothing: false for an empty slice and for any single mismatch.
pub fn all_match(targets: &[RuntimeTarget], check: &RevisionCheck) -> bool {
    !targets.is_empty() && targets.iter().all(|t| matches(t, check))
}

/// First target that does not match, for transcript lines.
pub fn first_mismatch<'a>(
    targets: &'a [RuntimeTarget],
    check: &RevisionCheck,
) -> Option<&'a RuntimeTarget> {
    targets.iter().find(|t| !matches(t, check))
}
