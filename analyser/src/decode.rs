//! Recover an SPL reading from the bytes of an OctetString.
//!
//! The device sends the reading as ASCII text wrapped in literal brackets, e.g. `[60]`, which ends
//! up in the trap log as the byte values `91 54 48 93`. Some traps arrive without the brackets; for
//! those the last two bytes are taken as the reading instead.

use crate::token::{token_char, token_value};

/// ASCII `[`.
const OPEN: u32 = 0x5b;

/// ASCII `]`.
const CLOSE: u32 = 0x5d;

/// Find the bytes between the last `[` and the first `]` that follows it.
///
/// Returns the exclusive `(open, close)` indices, or `None` if there is no such pair or nothing
/// between them.
fn bracket_window(values: &[Option<u32>]) -> Option<(usize, usize)> {
    let open = values.iter().rposition(|value| *value == Some(OPEN))?;

    let close = values[open + 1..]
        .iter()
        .position(|value| *value == Some(CLOSE))
        .map(|offset| open + 1 + offset)?;

    (close > open + 1).then_some((open, close))
}

/// Decode the SPL reading from a list of raw byte tokens.
///
/// Tokens that aren't valid numbers don't stop the search for the brackets, but every token in the
/// chosen window must decode to a character. Non-digit characters in the window are dropped; a
/// window with no digits at all yields `None`.
pub fn extract_spl<S: AsRef<str>>(tokens: &[S]) -> Option<u64> {
    let values = tokens
        .iter()
        .map(|token| token_value(token.as_ref()))
        .collect::<Vec<_>>();

    let window = match bracket_window(&values) {
        Some((open, close)) => &tokens[open + 1..close],
        // Brackets missing or empty: best guess is the tail of the dump
        None if tokens.len() >= 2 => &tokens[tokens.len() - 2..],
        None => return None,
    };

    let text = window
        .iter()
        .map(|token| token_char(token.as_ref()))
        .collect::<Option<String>>()?;

    // The device only ever sends ASCII digits. Other Unicode digits (`U+0666`, superscripts) are
    // dropped like any other non-digit character.
    let digits = text
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect::<String>();

    if digits.is_empty() {
        return None;
    }

    digits.parse().ok()
}
