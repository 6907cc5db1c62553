//! Response parsing for the Action Decider.
//!
//! Per spec.md §4.8 step 5, a decision response is not JSON: it is free
//! first-person text ending in one line matching `ACTION: <verb> [args]`.
//! This module's only job is recovering that line from whatever the LLM
//! actually said; turning the verb and argument tokens into a concrete
//! `ActionRequest` (resolving an agent-name token to an `AgentId`, a
//! location/item token against the world) is `village-core`'s job, since
//! that resolution needs a `WorldStore` borrow this crate doesn't have.

const ACTION_PREFIX: &str = "action:";

/// A recovered `ACTION:` line, split into its verb and whitespace-separated
/// argument tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedAction {
    /// The verb token, lowercased (e.g. `"move"`, `"talk"`, `"wait"`).
    pub verb: String,
    /// Remaining whitespace-separated tokens, in original case (names and
    /// free text are case-sensitive; only the verb is normalized).
    pub args: Vec<String>,
}

/// Scan `response` for a line matching `ACTION: <verb> [args]`, ignoring
/// any prefix commentary before it.
///
/// Matching is case-insensitive on the `ACTION:` marker and the verb, but
/// not on the argument tokens (agent/location/item names keep their
/// original casing for lookup). Returns `None` if no line in the response
/// contains the marker, in which case the caller falls back to `wait`.
#[must_use]
pub fn parse_action_line(response: &str) -> Option<DecodedAction> {
    for line in response.lines() {
        if let Some(decoded) = try_parse_line(line) {
            return Some(decoded);
        }
    }
    None
}

/// Try to decode one line. The marker may appear anywhere in the line
/// (models sometimes prefix it with a bullet or bold markup), so this
/// searches for the marker rather than requiring it at index 0.
///
/// The search is ASCII-only case-insensitive rather than via
/// `str::to_lowercase`: full Unicode lowercasing can change a string's
/// byte length (e.g. Turkish İ), which would misalign a byte offset
/// found in a lowercased copy against the original line.
fn try_parse_line(line: &str) -> Option<DecodedAction> {
    let marker_at = find_marker(line)?;
    let after_marker = line.get(marker_at + ACTION_PREFIX.len()..)?;

    // Models sometimes close out bold/bullet markup right after the
    // marker itself (e.g. "- **ACTION:** greet bob"); skip any leading
    // tokens that carry no alphabetic character before taking the verb.
    let mut tokens = after_marker
        .split_whitespace()
        .skip_while(|token| !token.chars().any(|c| c.is_ascii_alphabetic()));
    let verb = tokens.next()?.to_lowercase();
    let args = tokens.map(ToOwned::to_owned).collect();

    Some(DecodedAction { verb, args })
}

/// Find the byte offset of an ASCII case-insensitive match of
/// [`ACTION_PREFIX`] in `line`.
fn find_marker(line: &str) -> Option<usize> {
    let marker = ACTION_PREFIX.as_bytes();
    line.as_bytes()
        .windows(marker.len())
        .position(|window| window.eq_ignore_ascii_case(marker))
}
