//! Small parser combinators shared by the text-output parsers.
//!
//! The kernel tools print loosely structured text, so most parsing here
//! is "find this keyword, then read a token of this shape". The helpers
//! below pair a keyword scan with a winnow parser for the token.

use std::net::Ipv4Addr;

use winnow::ascii::digit1;
use winnow::error::ContextError;
use winnow::prelude::*;
use winnow::token::take_while;

/// Result type for winnow parsers.
pub type PResult<T> = core::result::Result<T, winnow::error::ErrMode<ContextError>>;

/// Parse one or more ASCII digits.
pub fn decimal<'a>(input: &mut &'a str) -> PResult<&'a str> {
    digit1.parse_next(input)
}

/// Parse a tc handle token: lowercase hex digits and colons.
pub fn handle_token<'a>(input: &mut &'a str) -> PResult<&'a str> {
    take_while(1.., |c: char| c.is_ascii_digit() || ('a'..='f').contains(&c) || c == ':')
        .parse_next(input)
}

/// Find the first occurrence of `key` that is directly followed by input
/// `parser` accepts, and return what it parsed.
pub fn capture_after<'a, O>(
    text: &'a str,
    key: &str,
    mut parser: impl FnMut(&mut &'a str) -> PResult<O>,
) -> Option<O> {
    text.match_indices(key).find_map(|(pos, _)| {
        let mut rest = &text[pos + key.len()..];
        parser(&mut rest).ok()
    })
}

/// Iterate over every dotted-quad IPv4 address embedded in `text`.
///
/// Addresses are delimited by anything other than digits and dots, so
/// `10.0.0.5/32`, `{ 10.0.0.5, 10.0.0.6 }` and `dst 10.0.0.5` all yield
/// the address.
pub fn ipv4_tokens(text: &str) -> impl Iterator<Item = Ipv4Addr> + '_ {
    text.split(|c: char| !(c.is_ascii_digit() || c == '.'))
        .filter(|tok| tok.len() >= 7)
        .filter_map(|tok| tok.parse().ok())
}

/// Check whether `token` is a colon-separated 48-bit MAC address.
pub fn is_mac(token: &str) -> bool {
    let bytes = token.as_bytes();
    bytes.len() == 17
        && bytes.chunks(3).all(|chunk| {
            chunk[0].is_ascii_hexdigit()
                && chunk[1].is_ascii_hexdigit()
                && chunk.get(2).is_none_or(|&c| c == b':')
        })
}
