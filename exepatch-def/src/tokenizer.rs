//! Tokenizer for the patch-definition dialect
//!
//! The tokenizer is deliberately tolerant: it never fails. Unterminated
//! strings take the remainder of the input, unparseable integer literals
//! become `0`, and characters with no meaning in the dialect are dropped.
//! Each of these produces a warning; structural recovery is the parser's job.

use log::warn;

use crate::token::Token;

/// Tokenize one dictionary span of the dialect
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let bytes = input.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as char;
        match c {
            ' ' | '\t' | '\r' | '\n' => i += 1,
            '#' => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            '{' => {
                tokens.push(Token::LBrace);
                i += 1;
            }
            '}' => {
                tokens.push(Token::RBrace);
                i += 1;
            }
            '[' => {
                tokens.push(Token::LBracket);
                i += 1;
            }
            ']' => {
                tokens.push(Token::RBracket);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ':' => {
                tokens.push(Token::Colon);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '"' | '\'' => {
                let (text, next) = read_string(input, i, c);
                tokens.push(Token::Text(text));
                i = next;
            }
            '-' | '+' | '0'..='9' => {
                let (value, next) = read_number(input, i);
                tokens.push(Token::Number(value));
                i = next;
            }
            _ => {
                let start = i;
                while i < bytes.len() && is_bare_word(bytes[i]) {
                    i += 1;
                }
                if i == start {
                    // Not a bare word; skip one whole character
                    i += input[start..].chars().next().map_or(1, char::len_utf8);
                }
                warn!(
                    "ignoring unrecognized fragment {:?} in patch definitions",
                    &input[start..i]
                );
            }
        }
    }

    tokens
}

fn is_bare_word(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Read a quoted string starting at `start` (which holds the quote char)
///
/// Backslash escapes the next character. An unterminated string consumes the
/// rest of the input.
fn read_string(input: &str, start: usize, quote: char) -> (String, usize) {
    let mut text = String::new();
    let mut chars = input[start + 1..].char_indices();
    while let Some((off, c)) = chars.next() {
        if c == '\\' {
            if let Some((_, escaped)) = chars.next() {
                text.push(escaped);
            }
        } else if c == quote {
            return (text, start + 1 + off + c.len_utf8());
        } else {
            text.push(c);
        }
    }
    warn!("unterminated string literal in patch definitions");
    (text, input.len())
}

/// Read an integer literal starting at `start`
///
/// Accepts an optional sign and a decimal or `0x` hexadecimal body. A
/// malformed literal parses as 0 with a warning, matching the lenient
/// handling of individual bad values.
fn read_number(input: &str, start: usize) -> (i64, usize) {
    let bytes = input.as_bytes();
    let mut end = start;
    if bytes[end] == b'-' || bytes[end] == b'+' {
        end += 1;
    }
    while end < bytes.len() && is_bare_word(bytes[end]) {
        end += 1;
    }

    let literal = &input[start..end];
    let unsigned = literal.trim_start_matches(['-', '+']);
    let negative = literal.starts_with('-');

    let parsed = if let Some(hex) = unsigned
        .strip_prefix("0x")
        .or_else(|| unsigned.strip_prefix("0X"))
    {
        i64::from_str_radix(hex, 16)
    } else {
        unsigned.parse::<i64>()
    };

    let value = match parsed {
        Ok(v) if negative => -v,
        Ok(v) => v,
        Err(_) => {
            warn!("unparseable integer literal {literal:?}, defaulting to 0");
            0
        }
    };
    (value, end)
}
