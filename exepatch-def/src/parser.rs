//! Recursive-descent parser for the patch-definition dialect
//!
//! A patch document carries two top-level assignments, `patches32 = { ... }`
//! and `patches64 = { ... }`. Each value is a dictionary from file path to a
//! list of entries; an entry is `[pattern, "replacement"]` or
//! `[[pattern, ...], "replacement"]`, and a pattern is the tuple
//! `("hex", offset)` or `("hex", offset, "override-hex")`.
//!
//! The dictionary spans are pre-extracted from the raw text by brace-depth
//! counting (quote- and comment-aware), then tokenized and parsed. Malformed
//! entries are skipped with a warning and counted; only the absence of both
//! dictionaries is fatal.

use log::warn;

use crate::document::{PatchDictionary, PatchDocument, PatchEntry, Pattern};
use crate::error::{Error, Result};
use crate::token::Token;
use crate::tokenizer::tokenize;

/// Parse a complete patch document from raw UTF-8 text
pub fn parse_document(text: &str) -> Result<PatchDocument> {
    let span32 = extract_assignment(text, "patches32");
    let span64 = extract_assignment(text, "patches64");
    if span32.is_none() && span64.is_none() {
        return Err(Error::MalformedDocument);
    }

    let mut skipped = 0;
    let patches32 = span32.map_or_else(PatchDictionary::new, |span| {
        parse_dictionary(span, &mut skipped)
    });
    let patches64 = span64.map_or_else(PatchDictionary::new, |span| {
        parse_dictionary(span, &mut skipped)
    });

    Ok(PatchDocument {
        patches32,
        patches64,
        skipped_entries: skipped,
    })
}

/// Parse one dictionary span (including its outer braces)
fn parse_dictionary(span: &str, skipped: &mut usize) -> PatchDictionary {
    let tokens = tokenize(span);
    let mut parser = Parser::new(&tokens);
    let dict = parser.dictionary();
    *skipped += parser.skipped;
    dict
}

/// Locate `name = { ... }` in raw text and return the balanced braced span
///
/// Extraction counts brace depth on the raw characters rather than using a
/// regular expression, since dictionary contents legitimately nest braces
/// and brackets. Quoted strings and `#` comments are honored.
fn extract_assignment<'a>(text: &'a str, name: &str) -> Option<&'a str> {
    let mut search = 0;
    loop {
        let found = text[search..].find(name)? + search;
        let end = found + name.len();

        // Whole-word match only
        let bounded = text[..found]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric() && c != '_');
        let after = &text[end..];
        let rest = after.trim_start();
        if !bounded || !rest.starts_with('=') {
            search = end;
            continue;
        }
        let rest = rest[1..].trim_start();
        if !rest.starts_with('{') {
            search = end;
            continue;
        }

        let brace_start = text.len() - rest.len();
        return balanced_braces(&text[brace_start..]).map(|len| &text[brace_start..brace_start + len]);
    }
}

/// Length of the balanced `{ ... }` block at the start of `text`
fn balanced_braces(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string: Option<char> = None;
    let mut in_comment = false;
    let mut chars = text.char_indices();

    while let Some((i, c)) = chars.next() {
        if in_comment {
            if c == '\n' {
                in_comment = false;
            }
            continue;
        }
        if let Some(quote) = in_string {
            if c == '\\' {
                chars.next();
            } else if c == quote {
                in_string = None;
            }
            continue;
        }
        match c {
            '#' => in_comment = true,
            '"' | '\'' => in_string = Some(c),
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Soft parse failure: the surrounding construct is skipped and counted
struct Unexpected(String);

type Soft<T> = std::result::Result<T, Unexpected>;

fn unexpected(wanted: &str, got: Option<&Token>) -> Unexpected {
    match got {
        Some(tok) => Unexpected(format!("expected {wanted}, found {tok}")),
        None => Unexpected(format!("expected {wanted}, found end of input")),
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    skipped: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            skipped: 0,
        }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    /// Consume the next token if it equals `token`
    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> Soft<()> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(unexpected(&token.to_string(), self.peek()))
        }
    }

    fn text(&mut self) -> Soft<String> {
        match self.peek() {
            Some(Token::Text(s)) => {
                self.pos += 1;
                Ok(s.clone())
            }
            other => Err(unexpected("string", other)),
        }
    }

    fn number(&mut self) -> Soft<i64> {
        match self.peek() {
            Some(Token::Number(n)) => {
                self.pos += 1;
                Ok(*n)
            }
            other => Err(unexpected("integer", other)),
        }
    }

    /// dictionary := '{' (string ':' entry-list ','?)* '}'
    fn dictionary(&mut self) -> PatchDictionary {
        let mut dict = PatchDictionary::new();
        if !self.eat(&Token::LBrace) {
            warn!("patch dictionary does not start with '{{'");
            return dict;
        }
        loop {
            match self.peek() {
                None => break,
                Some(Token::RBrace) => {
                    self.pos += 1;
                    break;
                }
                Some(Token::Comma) => {
                    self.pos += 1;
                }
                Some(Token::Text(_)) => match self.binding() {
                    Ok((path, entries)) => dict.insert(path, entries),
                    Err(Unexpected(msg)) => {
                        warn!("skipping malformed file binding: {msg}");
                        self.skipped += 1;
                        self.recover_binding();
                    }
                },
                Some(other) => {
                    warn!("skipping unexpected token {other} in patch dictionary");
                    self.skipped += 1;
                    self.pos += 1;
                }
            }
        }
        dict
    }

    /// binding := string ':' entry-list
    fn binding(&mut self) -> Soft<(String, Vec<PatchEntry>)> {
        let path = self.text()?;
        self.expect(&Token::Colon)?;
        let entries = self.entry_list()?;
        Ok((normalize_path(&path), entries))
    }

    /// entry-list := '[' (entry ','?)* ']'
    fn entry_list(&mut self) -> Soft<Vec<PatchEntry>> {
        self.expect(&Token::LBracket)?;
        let mut entries = Vec::new();
        loop {
            match self.peek() {
                None => return Err(unexpected("']'", None)),
                Some(Token::RBracket) => {
                    self.pos += 1;
                    break;
                }
                Some(Token::Comma) => {
                    self.pos += 1;
                }
                Some(Token::LBracket) => {
                    let start = self.pos;
                    match self.entry() {
                        Ok(entry) => entries.push(entry),
                        Err(Unexpected(msg)) => {
                            warn!("skipping malformed patch entry: {msg}");
                            self.skipped += 1;
                            self.pos = self.balanced_span_end(start);
                        }
                    }
                }
                Some(other) => {
                    warn!("skipping unexpected token {other} in entry list");
                    self.skipped += 1;
                    self.pos += 1;
                }
            }
        }
        Ok(entries)
    }

    /// entry := '[' (pattern | pattern-list) ',' string ','? ']'
    fn entry(&mut self) -> Soft<PatchEntry> {
        self.expect(&Token::LBracket)?;
        let patterns = match self.peek() {
            Some(Token::LParen) => vec![self.pattern()?],
            Some(Token::LBracket) => self.pattern_list()?,
            other => return Err(unexpected("pattern or pattern list", other)),
        };
        self.expect(&Token::Comma)?;
        let replacement = self.text()?;
        self.eat(&Token::Comma);
        self.expect(&Token::RBracket)?;
        Ok(PatchEntry {
            patterns,
            replacement,
        })
    }

    /// pattern-list := '[' (pattern ','?)* ']'
    fn pattern_list(&mut self) -> Soft<Vec<Pattern>> {
        self.expect(&Token::LBracket)?;
        let mut patterns = Vec::new();
        loop {
            match self.peek() {
                None => return Err(unexpected("']'", None)),
                Some(Token::RBracket) => {
                    self.pos += 1;
                    break;
                }
                Some(Token::Comma) => {
                    self.pos += 1;
                }
                Some(Token::LParen) => patterns.push(self.pattern()?),
                other => return Err(unexpected("pattern", other)),
            }
        }
        if patterns.is_empty() {
            return Err(Unexpected("empty pattern list".into()));
        }
        Ok(patterns)
    }

    /// pattern := '(' string ',' integer (',' string)? ','? ')'
    fn pattern(&mut self) -> Soft<Pattern> {
        self.expect(&Token::LParen)?;
        let hex = self.text()?;
        self.expect(&Token::Comma)?;
        let offset = self.number()?;
        let override_hex = if self.eat(&Token::Comma) {
            match self.peek() {
                Some(Token::RParen) => None,
                _ => Some(self.text()?),
            }
        } else {
            None
        };
        self.eat(&Token::Comma);
        self.expect(&Token::RParen)?;
        Ok(Pattern {
            hex,
            offset,
            override_hex,
        })
    }

    /// Index just past the closer matching the opener at `start`
    ///
    /// If `start` does not hold an opening token, or the closer is missing,
    /// this returns the end of the token stream.
    fn balanced_span_end(&self, start: usize) -> usize {
        let mut depth = 0usize;
        let mut i = start;
        while let Some(tok) = self.tokens.get(i) {
            match tok {
                Token::LBrace | Token::LBracket | Token::LParen => depth += 1,
                Token::RBrace | Token::RBracket | Token::RParen => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return i + 1;
                    }
                }
                _ => {
                    if depth == 0 {
                        return i;
                    }
                }
            }
            i += 1;
        }
        i
    }

    /// Resync after a failed file binding: skip the binding's value span and
    /// its trailing comma, leaving the parser at the next sibling binding
    fn recover_binding(&mut self) {
        while let Some(tok) = self.peek() {
            match tok {
                Token::LBrace | Token::LBracket | Token::LParen => {
                    self.pos = self.balanced_span_end(self.pos);
                    break;
                }
                Token::Comma | Token::RBrace => break,
                _ => self.pos += 1,
            }
        }
        self.eat(&Token::Comma);
    }
}

/// Normalize a file path to forward slashes
fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}
