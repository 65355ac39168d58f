//! Character-at-a-time scanner producing the token stream the parser
//! consumes. Ambient plumbing — see SPEC_FULL.md §4.1; grounded in
//! `original_source/src/lexer.c`.

use crate::diagnostics::Diagnostics;
use crate::token::{Location, Token, TokenKind, IDENT_MAX_LEN};

const KEYWORDS: &[(&str, TokenKind)] = &[
    ("if", TokenKind::KwIf),
    ("else", TokenKind::KwElse),
    ("while", TokenKind::KwWhile),
    ("loop", TokenKind::KwLoop),
    ("for", TokenKind::KwFor),
    ("break", TokenKind::KwBreak),
    ("continue", TokenKind::KwContinue),
    ("puti", TokenKind::KwPuti),
    ("putc", TokenKind::KwPutc),
    ("geti", TokenKind::KwGeti),
    ("getc", TokenKind::KwGetc),
    ("array", TokenKind::KwArray),
    ("halt", TokenKind::KwHalt),
    ("func", TokenKind::KwFunc),
    ("return", TokenKind::KwReturn),
    ("const", TokenKind::KwConst),
];

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
    pub diagnostics: Diagnostics,
}

impl Lexer {
    pub fn new(input: &str) -> Lexer {
        Lexer {
            chars: input.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            diagnostics: Diagnostics::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn location(&self) -> Location {
        Location {
            line: self.line,
            column: self.column,
        }
    }

    fn succ(&mut self) {
        match self.peek() {
            None => return,
            Some('\n') => {
                self.line += 1;
                self.column = 1;
            }
            Some(_) => self.column += 1,
        }
        self.pos += 1;
    }

    fn skip_ws(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => self.succ(),
                Some('#') => {
                    while self.peek().is_some() && self.peek() != Some('\n') {
                        self.succ();
                    }
                }
                _ => break,
            }
        }
    }

    fn lex_integer(&mut self) -> (String, i32) {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                self.succ();
            } else {
                break;
            }
        }
        let value = text.parse::<i64>().unwrap_or(i64::MAX) as i32;
        (text, value)
    }

    fn lex_escaped_char(&mut self) -> char {
        let c = match self.peek() {
            Some('a') => '\u{07}',
            Some('b') => '\u{08}',
            Some('e') => '\u{1B}',
            Some('r') => '\r',
            Some('n') => '\n',
            Some('t') => '\t',
            Some('\\') => '\\',
            Some('\'') => '\'',
            Some('x') => {
                self.succ();
                let mut hex = String::new();
                for _ in 0..2 {
                    match self.peek() {
                        Some(h) if h.is_ascii_hexdigit() => {
                            hex.push(h);
                            self.succ();
                        }
                        _ => break,
                    }
                }
                let value = u8::from_str_radix(&hex, 16).unwrap_or(0);
                return value as char;
            }
            Some(other) => other,
            None => return '\0',
        };
        self.succ();
        c
    }

    fn lex_char(&mut self) -> i32 {
        let mut c = '\0';

        if self.peek() == Some('\'') {
            self.succ();
        }

        if self.peek() == Some('\\') {
            self.succ();
            c = self.lex_escaped_char();
        } else if let Some(p) = self.peek() {
            if !p.is_control() {
                c = p;
                self.succ();
            }
        }

        if self.peek() == Some('\'') {
            self.succ();
        }

        c as i32
    }

    fn lex_symbol(&mut self) -> (String, TokenKind) {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                text.push(c);
                self.succ();
            } else {
                break;
            }
        }
        if text.len() > IDENT_MAX_LEN {
            eprintln!("too long text.");
            text.truncate(IDENT_MAX_LEN);
        }
        let kind = KEYWORDS
            .iter()
            .find(|(kw, _)| *kw == text)
            .map(|(_, kind)| *kind)
            .unwrap_or(TokenKind::Symbol);
        (text, kind)
    }

    fn lex_op(&mut self) -> Option<TokenKind> {
        let kind = match self.peek()? {
            ';' => {
                self.succ();
                TokenKind::Semicolon
            }
            '=' => {
                self.succ();
                if self.peek() == Some('=') {
                    self.succ();
                    TokenKind::EqEq
                } else {
                    TokenKind::Eq
                }
            }
            '!' => {
                self.succ();
                if self.peek() == Some('=') {
                    self.succ();
                    TokenKind::ExclaEq
                } else {
                    TokenKind::Excla
                }
            }
            '&' => {
                self.succ();
                TokenKind::Amp
            }
            '|' => {
                self.succ();
                TokenKind::Bar
            }
            '+' => {
                self.succ();
                TokenKind::Plus
            }
            '-' => {
                self.succ();
                TokenKind::Minus
            }
            '*' => {
                self.succ();
                TokenKind::Asterisk
            }
            '/' => {
                self.succ();
                TokenKind::Slash
            }
            '%' => {
                self.succ();
                TokenKind::Percent
            }
            '<' => {
                self.succ();
                if self.peek() == Some('=') {
                    self.succ();
                    TokenKind::Le
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                self.succ();
                if self.peek() == Some('=') {
                    self.succ();
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            '(' => {
                self.succ();
                TokenKind::LParen
            }
            ')' => {
                self.succ();
                TokenKind::RParen
            }
            '{' => {
                self.succ();
                TokenKind::LBrace
            }
            '}' => {
                self.succ();
                TokenKind::RBrace
            }
            '[' => {
                self.succ();
                TokenKind::LBracket
            }
            ']' => {
                self.succ();
                TokenKind::RBracket
            }
            ',' => {
                self.succ();
                TokenKind::Comma
            }
            _ => return None,
        };
        Some(kind)
    }

    /// Scans and returns the next token, advancing past it.
    pub fn next_token(&mut self) -> Token {
        self.skip_ws();
        let location = self.location();

        let c = match self.peek() {
            Some(c) => c,
            None => return Token::new(TokenKind::Eof, String::new(), 0, location),
        };

        if c == '\'' {
            let value = self.lex_char();
            return Token::new(TokenKind::Char, String::new(), value, location);
        }

        if c.is_ascii_digit() {
            let (text, value) = self.lex_integer();
            let _ = text;
            return Token::new(TokenKind::Integer, String::new(), value, location);
        }

        if c.is_alphabetic() || c == '_' {
            let (text, kind) = self.lex_symbol();
            return Token::new(kind, text, 0, location);
        }

        if let Some(kind) = self.lex_op() {
            return Token::new(kind, String::new(), 0, location);
        }

        self.diagnostics.report(format!(
            "error: unrecognizable character '{}' {}",
            c, location
        ));
        self.succ();
        Token::new(TokenKind::Unknown, String::new(), 0, location)
    }

    #[cfg(test)]
    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.peek_at(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(input);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token();
            if tok.kind == TokenKind::Eof {
                break;
            }
            out.push(tok.kind);
        }
        out
    }

    #[test]
    fn skips_comments_and_whitespace() {
        let toks = kinds("  # a comment\n  1 + 2 # trailing\n");
        assert_eq!(
            toks,
            vec![TokenKind::Integer, TokenKind::Plus, TokenKind::Integer]
        );
    }

    #[test]
    fn two_char_operators() {
        let toks = kinds("== != <= >= = < >");
        assert_eq!(
            toks,
            vec![
                TokenKind::EqEq,
                TokenKind::ExclaEq,
                TokenKind::Le,
                TokenKind::Ge,
                TokenKind::Eq,
                TokenKind::Lt,
                TokenKind::Gt,
            ]
        );
    }

    #[test]
    fn keyword_vs_identifier() {
        let mut lexer = Lexer::new("while whilex");
        let t1 = lexer.next_token();
        let t2 = lexer.next_token();
        assert_eq!(t1.kind, TokenKind::KwWhile);
        assert_eq!(t2.kind, TokenKind::Symbol);
        assert_eq!(t2.text, "whilex");
    }

    #[test]
    fn char_escapes() {
        let mut lexer = Lexer::new(r"'\n' '\t' 'a' '\x41'");
        assert_eq!(lexer.next_token().int_value, '\n' as i32);
        assert_eq!(lexer.next_token().int_value, '\t' as i32);
        assert_eq!(lexer.next_token().int_value, 'a' as i32);
        assert_eq!(lexer.next_token().int_value, 0x41);
    }

    #[test]
    fn unrecognizable_character_is_reported() {
        let mut lexer = Lexer::new("$");
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::Unknown);
        assert_eq!(lexer.diagnostics.count(), 1);
    }

    #[test]
    fn lookahead_helper_sees_following_char() {
        let lexer = Lexer::new("ab");
        assert_eq!(lexer.peek_char_at(1), Some('b'));
    }
}
