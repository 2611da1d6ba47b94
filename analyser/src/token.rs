//! Single byte tokens from an OctetString dump.
//!
//! A token is one byte written either as decimal (`91`), `0x`-prefixed hex (`0x5B`) or bare hex
//! digits (`5B`). Decimal always wins over bare hex, so `20` is twenty and never `0x20`.

use nom::{
    branch::alt,
    bytes::complete::tag_no_case,
    character::complete::{digit1, hex_digit1},
    combinator::{all_consuming, map_res},
    sequence::preceded,
    IResult,
};

/// Separator debris left over from the surrounding dump.
const TRIM: [char; 2] = [',', ']'];

fn decimal(i: &str) -> IResult<&str, u32> {
    map_res(digit1, |digits: &str| digits.parse::<u32>())(i)
}

fn hex(i: &str) -> IResult<&str, u32> {
    map_res(hex_digit1, |digits: &str| u32::from_str_radix(digits, 16))(i)
}

// Each branch must consume the whole token, otherwise `5B` would stop at the `5` in the decimal
// branch and never get a chance at the bare hex one.
fn byte_value(i: &str) -> IResult<&str, u32> {
    alt((
        all_consuming(preceded(tag_no_case("0x"), hex)),
        all_consuming(decimal),
        all_consuming(hex),
    ))(i)
}

/// Interpret a raw token as an integer.
///
/// Returns `None` for anything that isn't decimal or hex, and for values that don't fit in a
/// `u32` (these could never be a valid character anyway).
pub fn token_value(token: &str) -> Option<u32> {
    let token = token.trim().trim_matches(TRIM);

    byte_value(token).ok().map(|(_rest, value)| value)
}

/// Interpret a raw token as the character with that code point.
pub fn token_char(token: &str) -> Option<char> {
    token_value(token).and_then(char::from_u32)
}
