//! Subscription Limit Rules
//!
//! Pure arithmetic behind plan enforcement. The backend loads the plan and
//! the caller's usage, then asks these functions whether an action fits.

use serde::Serialize;

/// Outcome of a limit check
///
/// `remaining` is what would be left after the action and goes negative
/// when the action does not fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LimitCheck {
    pub allowed: bool,
    pub remaining: i64,
}

impl LimitCheck {
    fn from_remaining(remaining: i64) -> Self {
        Self {
            allowed: remaining >= 0,
            remaining,
        }
    }
}

/// Length of a message as counted against a plan (Unicode scalar values)
pub fn message_length(text: &str) -> i64 {
    text.chars().count() as i64
}

/// Check a message of `length` characters against `max_characters`
pub fn check_message_length(max_characters: i32, length: i64) -> LimitCheck {
    LimitCheck::from_remaining(i64::from(max_characters) - length)
}

/// Check whether one more conversation fits in `max_conversations`
///
/// `owned` is the number of conversations the user already owns; the
/// conversation about to be created is counted too.
pub fn check_conversation_quota(max_conversations: i32, owned: i64) -> LimitCheck {
    LimitCheck::from_remaining(i64::from(max_conversations) - (owned + 1))
}

/// Warning attached to a freshly created conversation
pub fn conversation_alert(remaining: i64) -> Option<&'static str> {
    match remaining {
        1 => Some("Warning: You have only one conversation remaining."),
        0 => Some("Warning: You have reached your conversation limit."),
        _ => None,
    }
}
