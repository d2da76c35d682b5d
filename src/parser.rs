//! Text template parser using nom.
//!
//! Rust has no tagged template literals, so templates that arrive as plain
//! strings (from the CLI, a config file, ...) mark their slots with `{}`:
//!
//! ```text
//! SELECT * FROM users WHERE id = {} AND tags @> '{{}}'
//! ───────────┬──────────────────  ┬ ──────────┬──────
//!            │                    │           └── `{{` / `}}` are literal braces
//!            │                    └── Slot (one interpolated value)
//!            └── Fragment
//! ```
//!
//! Parsing yields the literal fragments only; there is always exactly one
//! more fragment than there are slots.

use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, take_while},
    character::complete::{char, digit1},
    combinator::{all_consuming, map, opt, recognize, value},
    multi::many0,
    sequence::{delimited, pair, tuple},
    IResult,
};

use crate::error::{SqlTagError, SqlTagResult};
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
enum Piece<'a> {
    Text(&'a str),
    Brace(char),
    Slot,
}

/// Split a text template into its literal fragments.
pub fn parse_fragments(input: &str) -> SqlTagResult<Vec<String>> {
    match many0(parse_piece)(input) {
        Ok(("", pieces)) => Ok(collect_fragments(pieces)),
        Ok((remaining, _)) => {
            let position = input.len() - remaining.len();
            let message = if remaining.starts_with('{') {
                "unmatched '{' (use '{}' for a slot or '{{' for a literal brace)"
            } else {
                "unmatched '}' (use '}}' for a literal brace)"
            };
            Err(SqlTagError::template(position, message))
        }
        Err(e) => Err(SqlTagError::template(0, format!("Parse failed: {:?}", e))),
    }
}

/// Parse one piece of a template.
fn parse_piece(input: &str) -> IResult<&str, Piece<'_>> {
    alt((
        value(Piece::Brace('{'), tag("{{")),
        value(Piece::Brace('}'), tag("}}")),
        value(Piece::Slot, tag("{}")),
        map(is_not("{}"), Piece::Text),
    ))(input)
}

fn collect_fragments(pieces: Vec<Piece<'_>>) -> Vec<String> {
    let mut fragments = vec![String::new()];
    for piece in pieces {
        match piece {
            Piece::Text(text) => push_last(&mut fragments, text),
            Piece::Brace('{') => push_last(&mut fragments, "{"),
            Piece::Brace(_) => push_last(&mut fragments, "}"),
            Piece::Slot => fragments.push(String::new()),
        }
    }
    fragments
}

fn push_last(fragments: &mut [String], text: &str) {
    if let Some(last) = fragments.last_mut() {
        last.push_str(text);
    }
}

/// Parse a command-line binding into a value.
///
/// `null`, `true`/`false`, integers and floats are recognised; a
/// single-quoted string is taken literally; anything else is text.
pub fn parse_binding(input: &str) -> Value {
    let trimmed = input.trim();
    match all_consuming(parse_literal)(trimmed) {
        Ok((_, value)) => value,
        Err(_) => Value::Text(trimmed.to_string()),
    }
}

fn parse_literal(input: &str) -> IResult<&str, Value> {
    alt((
        value(Value::Null, tag("null")),
        value(Value::Bool(true), tag("true")),
        value(Value::Bool(false), tag("false")),
        parse_number,
        parse_quoted_string,
    ))(input)
}

/// Parse a number (integer or float).
fn parse_number(input: &str) -> IResult<&str, Value> {
    let (input, num_str) = recognize(tuple((
        opt(char('-')),
        digit1,
        opt(pair(char('.'), digit1)),
    )))(input)?;

    let value = if num_str.contains('.') {
        num_str.parse().map(Value::Float)
            .unwrap_or_else(|_| Value::Text(num_str.to_string()))
    } else {
        num_str.parse().map(Value::Int)
            .unwrap_or_else(|_| Value::Text(num_str.to_string()))
    };
    Ok((input, value))
}

/// Parse a quoted string.
fn parse_quoted_string(input: &str) -> IResult<&str, Value> {
    map(
        delimited(char('\''), take_while(|c| c != '\''), char('\'')),
        |s: &str| Value::Text(s.to_string()),
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_slots() {
        assert_eq!(parse_fragments("SELECT 1").unwrap(), vec!["SELECT 1"]);
        assert_eq!(parse_fragments("").unwrap(), vec![""]);
    }

    #[test]
    fn test_slots() {
        assert_eq!(
            parse_fragments("SELECT * FROM users WHERE id = {} AND name = {}").unwrap(),
            vec!["SELECT * FROM users WHERE id = ", " AND name = ", ""]
        );
    }

    #[test]
    fn test_adjacent_slots() {
        assert_eq!(parse_fragments("{}{}").unwrap(), vec!["", "", ""]);
    }

    #[test]
    fn test_escaped_braces() {
        assert_eq!(
            parse_fragments("SELECT '{{a}}' WHERE x = {}").unwrap(),
            vec!["SELECT '{a}' WHERE x = ", ""]
        );
    }

    #[test]
    fn test_unmatched_open_brace() {
        let err = parse_fragments("SELECT {x}").unwrap_err();
        match err {
            SqlTagError::Template { position, .. } => assert_eq!(position, 7),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unmatched_close_brace() {
        let err = parse_fragments("a } b").unwrap_err();
        assert!(err.to_string().contains("unmatched '}'"));
    }

    #[test]
    fn test_parse_binding() {
        assert_eq!(parse_binding("42"), Value::Int(42));
        assert_eq!(parse_binding("-1.5"), Value::Float(-1.5));
        assert_eq!(parse_binding("true"), Value::Bool(true));
        assert_eq!(parse_binding("null"), Value::Null);
        assert_eq!(parse_binding("'42'"), Value::Text("42".to_string()));
        assert_eq!(parse_binding("bob"), Value::Text("bob".to_string()));
        assert_eq!(parse_binding("12abc"), Value::Text("12abc".to_string()));
    }

    #[test]
    fn test_parse_binding_trims_text_like_literals() {
        assert_eq!(parse_binding(" 42 "), Value::Int(42));
        assert_eq!(parse_binding(" bob "), Value::Text("bob".to_string()));
        assert_eq!(parse_binding(" ' bob ' "), Value::Text(" bob ".to_string()));
    }
}
