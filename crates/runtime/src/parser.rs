//! `ParsedWord`: classifies one whitespace-trimmed token (spec §4.7).

use crate::error::Error;

/// A single-pass classification of one token. Borrows from the input
/// slice where possible; the evaluator owns the token's lifetime for the
/// duration of dispatch, so no copying is needed until a literal is
/// actually interned/heap-allocated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParsedWord<'a> {
    EmptyWord,
    String(&'a str),
    Symbol(&'a str),
    Ref(&'a str),
    NumFloat(f64),
    SignedInt(i64),
    UnsignedInt(u64),
    /// A bare word reference, with optional leading "stash" comma and/or
    /// trailing "hoist" comma.
    Simple { stash: bool, hoist: bool, name: &'a str },
}

/// Classify `token`, a single whitespace-trimmed slice with no embedded
/// delimiters (the evaluator's tokenizer has already split on ASCII
/// whitespace and handled quoting).
pub fn parse_word(token: &str) -> Result<ParsedWord<'_>, Error> {
    if token.is_empty() {
        return Ok(ParsedWord::EmptyWord);
    }

    if token.len() >= 2 && token.starts_with('"') && token.ends_with('"') {
        return Ok(ParsedWord::String(&token[1..token.len() - 1]));
    }

    if let Some(rest) = token.strip_prefix(':') {
        return Ok(ParsedWord::Symbol(rest));
    }

    if let Some(rest) = token.strip_prefix('&') {
        return Ok(ParsedWord::Ref(rest));
    }

    if token.contains('.') {
        if let Ok(f) = token.parse::<f64>() {
            return Ok(ParsedWord::NumFloat(f));
        }
    }

    let bytes = token.as_bytes();
    if token.len() > 1 && bytes[bytes.len() - 2] == b'/' {
        let (digits, suffix) = (&token[..token.len() - 2], bytes[bytes.len() - 1]);
        return match suffix {
            b'u' => digits
                .parse::<u64>()
                .map(ParsedWord::UnsignedInt)
                .map_err(|_| Error::UnknownSlashedSuffix),
            b'i' => digits
                .parse::<i64>()
                .map(ParsedWord::SignedInt)
                .map_err(|_| Error::UnknownSlashedSuffix),
            _ => Err(Error::UnknownSlashedSuffix),
        };
    }

    if let Ok(n) = token.parse::<i64>() {
        return Ok(ParsedWord::SignedInt(n));
    }
    if let Ok(n) = token.parse::<u64>() {
        return Ok(ParsedWord::UnsignedInt(n));
    }

    parse_simple(token)
}

fn parse_simple(token: &str) -> Result<ParsedWord<'_>, Error> {
    let stash = token.starts_with(',');
    let hoist = token.ends_with(',') && token.len() > 1;
    // A trailing comma check must not double-count a token that is *only*
    // commas (",", ",,"), which is always invalid.
    if token.chars().all(|c| c == ',') {
        return Err(Error::InvalidWordName);
    }

    let inner_start = if stash { 1 } else { 0 };
    let inner_end = if hoist { token.len() - 1 } else { token.len() };
    if inner_start >= inner_end {
        return Err(Error::InvalidWordName);
    }
    let name = &token[inner_start..inner_end];
    if name.contains(',') {
        return Err(Error::InvalidWordName);
    }
    Ok(ParsedWord::Simple { stash, hoist, name })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_token() {
        assert_eq!(parse_word("").unwrap(), ParsedWord::EmptyWord);
    }

    #[test]
    fn quoted_string() {
        assert_eq!(parse_word("\"foo and a bit of bar\"").unwrap(), ParsedWord::String("foo and a bit of bar"));
    }

    #[test]
    fn symbol_and_ref() {
        assert_eq!(parse_word(":something").unwrap(), ParsedWord::Symbol("something"));
        assert_eq!(parse_word("&push-one").unwrap(), ParsedWord::Ref("push-one"));
    }

    #[test]
    fn float_requires_a_dot() {
        assert_eq!(parse_word("3.14").unwrap(), ParsedWord::NumFloat(3.14));
        assert_eq!(parse_word("7.5").unwrap(), ParsedWord::NumFloat(7.5));
    }

    #[test]
    fn slashed_suffixes() {
        assert_eq!(parse_word("2/i").unwrap(), ParsedWord::SignedInt(2));
        assert_eq!(parse_word("5/u").unwrap(), ParsedWord::UnsignedInt(5));
        assert!(matches!(parse_word("5/x"), Err(Error::UnknownSlashedSuffix)));
    }

    #[test]
    fn plain_ints_default_signed_then_unsigned() {
        assert_eq!(parse_word("4").unwrap(), ParsedWord::SignedInt(4));
        assert_eq!(parse_word("-4").unwrap(), ParsedWord::SignedInt(-4));
    }

    #[test]
    fn simple_word_reference() {
        assert_eq!(
            parse_word("push-one").unwrap(),
            ParsedWord::Simple { stash: false, hoist: false, name: "push-one" }
        );
    }

    #[test]
    fn stash_and_hoist_commas() {
        assert_eq!(
            parse_word(",dup").unwrap(),
            ParsedWord::Simple { stash: true, hoist: false, name: "dup" }
        );
        assert_eq!(
            parse_word("dup,").unwrap(),
            ParsedWord::Simple { stash: false, hoist: true, name: "dup" }
        );
        assert_eq!(
            parse_word(",dup,").unwrap(),
            ParsedWord::Simple { stash: true, hoist: true, name: "dup" }
        );
    }

    #[test]
    fn internal_comma_is_invalid() {
        assert!(matches!(parse_word("du,p"), Err(Error::InvalidWordName)));
    }

    #[test]
    fn bare_commas_are_invalid() {
        assert!(matches!(parse_word(","), Err(Error::InvalidWordName)));
        assert!(matches!(parse_word(",,"), Err(Error::InvalidWordName)));
    }

    #[test]
    fn e1_scenario_token_classification() {
        for (tok, expected) in [
            ("1", ParsedWord::SignedInt(1)),
            ("2/i", ParsedWord::SignedInt(2)),
            ("3.14", ParsedWord::NumFloat(3.14)),
            ("4", ParsedWord::SignedInt(4)),
            ("5/u", ParsedWord::UnsignedInt(5)),
            ("6/i", ParsedWord::SignedInt(6)),
            ("7.5", ParsedWord::NumFloat(7.5)),
        ] {
            assert_eq!(parse_word(tok).unwrap(), expected);
        }
        assert_eq!(parse_word(":something").unwrap(), ParsedWord::Symbol("something"));
    }
}
