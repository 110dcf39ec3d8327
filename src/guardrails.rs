//! Client-side illegal-intent heuristic.
//!
//! Matches are only logged. Refusals are left to the model's own guardrails.

pub const ILLEGAL_INTENT_KEYWORDS: [&str; 14] = [
    "forge",
    "fake",
    "evade",
    "bypass",
    "bribe",
    "disable safety",
    "harm",
    "explosive",
    "fake license",
    "fake invoice",
    "how to hide",
    "avoid inspection",
    "child labour",
    "bonded labour",
];

/// Returns the first keyword contained in `message`, ignoring case.
#[must_use]
pub fn flagged_keyword(message: &str) -> Option<&'static str> {
    if message.is_empty() {
        return None;
    }
    let normalized = message.to_lowercase();
    ILLEGAL_INTENT_KEYWORDS
        .into_iter()
        .find(|keyword| normalized.contains(keyword))
}

#[must_use]
pub fn quick_illegal_heuristic(message: &str) -> bool {
    flagged_keyword(message).is_some()
}
