//! Character-driven tokenizer state machine.
//!
//! Grounded in `original_source/src/dhtmlparser3/tokenizer.py`: the cursor
//! fields (`pos`/`cur()`/`peek()`/`advance()`), the per-construct `consume_*`
//! methods, and every recovery rule are a direct port of that state machine,
//! adapted from Python's exception-based "abort this token scan" signal
//! (`IOError`) to a local `Result<_, Abort>` that never escapes this module
//! (see `errors` module docs, and spec §7: this signal is internal only).
//!
//! The overall module shape — a cursor-driven scanner with named
//! `parse_next_*`-style methods on a struct holding the input and position —
//! mirrors `wp-html-api/src/tag_processor.rs`, adapted from byte-offset
//! spans with deferred lexical updates to owned character buffers, since
//! this crate's tokens are values the tree builder consumes once rather
//! than a zero-copy cursor callers can still rewrite.
//!
//! `<script>`/`<style>` bodies are tokenized as one raw text span regardless
//! of any `<` or `&` inside them (the resolved reading of the open question
//! the original source left inconsistent): real pages routinely embed `<`
//! in inline JS, and scraping them shouldn't fragment the script body into
//! spurious tags.

use crate::entities;
use crate::tokens::{ParameterToken, TagToken, Token};

const MAX_ENTITY_LENGTH: usize = 20;

/// Internal-only signal: the current construct could not be completed
/// (unterminated tag, nested `<`, unclosed quote). The caller always
/// recovers by re-emitting the scanned span as literal text.
struct Abort;

pub struct Tokenizer {
    chars: Vec<char>,
    pos: usize,
    pending: Option<Token>,
    /// Set right after yielding the opening tag of a `<script>`/`<style>`
    /// element (never for a self-closed one): the next token is scanned by
    /// [`Tokenizer::consume_raw_text`] instead of the normal dispatch, so a
    /// stray `<` or `&` inside the element's body doesn't get parsed as
    /// markup. Cleared as soon as that raw span is consumed.
    raw_until: Option<String>,
}

impl Tokenizer {
    pub fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
            pending: None,
            raw_until: None,
        }
    }

    /// Eagerly collects the whole token stream. Equivalent to draining the
    /// iterator; the tokenizer itself is lazy (see the `Iterator` impl
    /// below), this is a convenience for callers that don't need early
    /// termination.
    pub fn tokenize(input: &str) -> Vec<Token> {
        Self::new(input).collect()
    }

    fn cur(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).copied()
    }

    fn advance(&mut self) -> Option<char> {
        self.pos += 1;
        self.cur()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.cur(), Some(' ') | Some('\t') | Some('\n')) {
            self.advance();
        }
    }

    fn scan_token(&mut self) -> Token {
        match self.cur() {
            Some('<') => {
                let start = self.pos;
                match self.consume_tag() {
                    Ok(token) => token,
                    Err(Abort) => {
                        #[cfg(feature = "tracing")]
                        tracing::trace!(start, pos = self.pos, "abandoning malformed tag scan");
                        Token::Text(self.chars[start..self.pos].iter().collect())
                    }
                }
            }
            Some('&') => self.consume_entity(),
            Some(_) => self.consume_text(),
            None => unreachable!("scan_token called with nothing left to scan"),
        }
    }

    fn consume_tag(&mut self) -> Result<Token, Abort> {
        self.advance(); // consume '<'
        self.skip_whitespace();

        let mut is_end_tag = false;
        if self.cur() == Some('/') {
            is_end_tag = true;
            self.advance();
        }

        if self.cur() == Some('>') {
            self.advance();
            return Ok(Token::Text("<>".to_string()));
        }

        if self.cur() == Some('!') && self.peek(1) == Some('-') && self.peek(2) == Some('-') {
            return Ok(self.consume_comment());
        }

        let name = self.consume_name_span(&['>', ' ', '\n', '\t', '<'])?;
        let mut tag = TagToken {
            name,
            parameters: Vec::new(),
            is_non_pair: false,
            is_end_tag,
        };

        loop {
            if self.at_end() {
                return Err(Abort);
            }
            self.skip_whitespace();

            match self.cur() {
                Some('>') => {
                    self.advance();
                    return Ok(Token::Tag(tag));
                }
                Some('<') => return Err(Abort),
                _ => {}
            }

            let parameter_name = self.consume_parameter_name()?;
            self.skip_whitespace();

            match self.cur() {
                Some('/') => {
                    self.advance();
                    if let Some(name) = parameter_name {
                        tag.parameters.push(ParameterToken::bare(name));
                    }
                    tag.is_non_pair = true;
                }
                Some('>') => {
                    if let Some(name) = parameter_name {
                        tag.parameters.push(ParameterToken::bare(name));
                    }
                }
                Some('=') => {
                    self.advance();
                    self.skip_whitespace();
                    let value = self.consume_parameter_value()?;
                    tag.parameters.push(ParameterToken {
                        key: parameter_name.unwrap_or_default(),
                        value,
                    });
                }
                _ => {}
            }
        }
    }

    /// Shared shape for tag-name and parameter-name scanning: accumulate
    /// from the current char until `peek` lands on one of `terminators`.
    fn consume_name_span(&mut self, terminators: &[char]) -> Result<String, Abort> {
        let mut buf = String::new();
        buf.push(self.cur().ok_or(Abort)?);

        loop {
            if self.at_end() {
                return Err(Abort);
            }
            match self.peek(1) {
                Some(c) if terminators.contains(&c) => {
                    self.advance();
                    return Ok(buf);
                }
                Some(c) => {
                    self.advance();
                    buf.push(c);
                }
                None => return Err(Abort),
            }
        }
    }

    /// A bare `/` returns `Ok(None)` without consuming it — the caller
    /// handles the self-closing flag itself.
    fn consume_parameter_name(&mut self) -> Result<Option<String>, Abort> {
        if self.cur() == Some('/') {
            return Ok(None);
        }
        self.consume_name_span(&[' ', '<', '=', '/', '>', '\t', '\n'])
            .map(Some)
    }

    fn consume_parameter_value(&mut self) -> Result<String, Abort> {
        if matches!(self.cur(), Some('"') | Some('\'')) {
            return self.consume_quoted_parameter_value();
        }

        let mut buf = String::new();
        buf.push(self.cur().ok_or(Abort)?);

        loop {
            if self.at_end() {
                return Err(Abort);
            }
            match self.peek(1) {
                Some(c) if matches!(c, ' ' | '<' | '/' | '>' | '\'' | '"' | '\t' | '\n') => {
                    if c == '\'' || c == '"' {
                        self.advance();
                    }
                    self.advance();
                    return Ok(buf);
                }
                Some(c) => {
                    self.advance();
                    buf.push(c);
                }
                None => return Err(Abort),
            }
        }
    }

    fn consume_quoted_parameter_value(&mut self) -> Result<String, Abort> {
        let quote = self.cur().unwrap();
        self.advance();

        if self.cur() == Some(quote) {
            self.advance();
            return Ok(String::new());
        }

        let mut buf = String::new();
        let mut escaped = false;

        loop {
            if self.at_end() {
                return Err(Abort);
            }
            let c = self.cur().unwrap();

            if c == quote && !escaped {
                self.advance();
                return Ok(buf);
            }

            if c == '\\' {
                escaped = !escaped;
                if escaped && matches!(self.peek(1), Some(p) if p == quote || p == '\\') {
                    self.advance();
                    continue;
                }
            } else {
                escaped = false;
            }

            buf.push(c);
            self.advance();
        }
    }

    fn consume_comment(&mut self) -> Token {
        self.advance(); // consume '!'
        self.advance(); // consume first '-', landing on the second '-'

        let mut buf = String::new();
        loop {
            if self.at_end() {
                return Token::Text(format!("<!--{buf}"));
            }
            let Some(c) = self.advance() else {
                return Token::Text(format!("<!--{buf}"));
            };

            if c == '-' && self.peek(1) == Some('-') && self.peek(2) == Some('>') {
                self.advance();
                self.advance();
                self.advance();
                return Token::Comment(buf);
            }

            buf.push(c);
        }
    }

    fn consume_entity(&mut self) -> Token {
        let mut buf = String::new();
        buf.push('&');
        let mut length = 0usize;

        loop {
            if self.at_end() {
                return Token::Text(buf);
            }
            let Some(c) = self.advance() else {
                return Token::Text(buf);
            };
            length += 1;

            if c == ' ' || length > MAX_ENTITY_LENGTH {
                return Token::Text(buf);
            }

            buf.push(c);

            if c == ';' {
                if buf != "&;" {
                    if !self.at_end() {
                        self.advance();
                    }
                    return Token::Entity(buf);
                }
                return Token::Text(buf);
            }
        }
    }

    /// Consumes everything up to (not including) the matching `</name`
    /// close tag, verbatim — no tag, entity, or comment scanning inside.
    /// Reaching end of input without finding the close tag just returns
    /// what was scanned; the outer loop then sees `at_end()` and stops.
    fn consume_raw_text(&mut self, end_name: &str) -> String {
        let mut buf = String::new();
        loop {
            if self.at_end() {
                return buf;
            }
            if self.cur() == Some('<') && self.looks_like_closing_tag(end_name) {
                return buf;
            }
            buf.push(self.cur().unwrap());
            self.advance();
        }
    }

    /// True if `self.cur() == Some('<')` and what follows is `/` + `end_name`
    /// (case-insensitive) + a word boundary (`>`, whitespace, or end of
    /// input). Does not consume anything.
    fn looks_like_closing_tag(&self, end_name: &str) -> bool {
        if self.peek(1) != Some('/') {
            return false;
        }
        let mut offset = 2;
        for expected in end_name.chars() {
            match self.peek(offset) {
                Some(c) if c.eq_ignore_ascii_case(&expected) => offset += 1,
                _ => return false,
            }
        }
        matches!(self.peek(offset), None | Some('>' | ' ' | '\t' | '\n'))
    }

    fn consume_text(&mut self) -> Token {
        let mut buf = String::new();
        buf.push(self.cur().unwrap());

        loop {
            if self.at_end() {
                return Token::Text(buf);
            }
            match self.advance() {
                Some(c) if c == '<' || c == '&' => return Token::Text(buf),
                Some(c) => buf.push(c),
                None => return Token::Text(buf),
            }
        }
    }
}

/// Yields the linearized token stream: adjacent `Text` (including text
/// produced by entity decoding or tag-scan recovery) is merged before being
/// handed out, by buffering the most recent token and merging on yield —
/// the lazy-tokenizer shape spec.md §4.1/§9 calls for.
impl Iterator for Tokenizer {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            if self.at_end() {
                return self.pending.take();
            }

            let token = if let Some(end_name) = self.raw_until.take() {
                Token::Text(self.consume_raw_text(&end_name))
            } else {
                match self.scan_token() {
                    Token::Entity(raw) => Token::Text(entities::decode(&raw).unwrap_or(raw)),
                    other => other,
                }
            };

            if let Token::Tag(tag_token) = &token {
                if !tag_token.is_end_tag && !tag_token.is_non_pair {
                    let lower = tag_token.name.to_ascii_lowercase();
                    if lower == "script" || lower == "style" {
                        self.raw_until = Some(lower);
                    }
                }
            }

            match (self.pending.take(), token) {
                (Some(Token::Text(mut buf)), Token::Text(more)) => {
                    buf.push_str(&more);
                    self.pending = Some(Token::Text(buf));
                }
                (Some(prev), token) => {
                    self.pending = Some(token);
                    return Some(prev);
                }
                (None, token) => {
                    self.pending = Some(token);
                }
            }
        }
    }
}
