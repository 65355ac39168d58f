//! Token kinds and source locations produced by the lexer.

use std::fmt;

/// A `(line, column)` position, both 1-based, matching the original lexer's
/// bookkeeping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(line:{},column:{})", self.line, self.column)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    // punctuation
    Semicolon,
    Eq,
    EqEq,
    Excla,
    ExclaEq,
    Lt,
    Le,
    Gt,
    Ge,
    Amp,
    Bar,
    Plus,
    Minus,
    Asterisk,
    Slash,
    Percent,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    // literals / identifiers
    Integer,
    Char,
    Symbol,
    // keywords
    KwIf,
    KwElse,
    KwWhile,
    KwLoop,
    KwFor,
    KwBreak,
    KwContinue,
    KwPuti,
    KwPutc,
    KwGeti,
    KwGetc,
    KwArray,
    KwHalt,
    KwFunc,
    KwReturn,
    KwConst,
    Eof,
    Unknown,
}

impl TokenKind {
    /// Human readable name used inside diagnostics, matching
    /// `ttype_to_string` in the original lexer.
    /// Upper-case mnemonic used for the `(KIND)` part of diagnostics
    /// (the original's `ttype_to_string`).
    pub fn kind_label(self) -> &'static str {
        use TokenKind::*;
        match self {
            Semicolon => "SEMICOLON",
            Eq => "EQ",
            EqEq => "EQEQ",
            Excla => "EXCLA",
            ExclaEq => "EXCLAEQ",
            Lt => "LT",
            Le => "LE",
            Gt => "GT",
            Ge => "GE",
            Amp => "AMP",
            Bar => "BAR",
            Plus => "PLUS",
            Minus => "MINUS",
            Asterisk => "ASTERISK",
            Slash => "SLASH",
            Percent => "PERCENT",
            LParen => "LPAREN",
            RParen => "RPAREN",
            LBrace => "LBRACE",
            RBrace => "RBRACE",
            LBracket => "LBRACKET",
            RBracket => "RBRACKET",
            Comma => "COMMA",
            Integer => "INTEGER",
            Char => "CHAR",
            Symbol => "SYMBOL",
            KwIf => "KW_IF",
            KwElse => "KW_ELSE",
            KwWhile => "KW_WHILE",
            KwLoop => "KW_LOOP",
            KwFor => "KW_FOR",
            KwBreak => "KW_BREAK",
            KwContinue => "KW_CONTINUE",
            KwPuti => "KW_PUTI",
            KwPutc => "KW_PUTC",
            KwGeti => "KW_GETI",
            KwGetc => "KW_GETC",
            KwArray => "KW_ARRAY",
            KwHalt => "KW_HALT",
            KwFunc => "KW_FUNC",
            KwReturn => "KW_RETURN",
            KwConst => "KW_CONST",
            Eof => "EOF",
            Unknown => "UNKNOWN",
        }
    }

    pub fn as_str(self) -> &'static str {
        use TokenKind::*;
        match self {
            Semicolon => "';'",
            Eq => "'='",
            EqEq => "'=='",
            Excla => "'!'",
            ExclaEq => "'!='",
            Lt => "'<'",
            Le => "'<='",
            Gt => "'>'",
            Ge => "'>='",
            Amp => "'&'",
            Bar => "'|'",
            Plus => "'+'",
            Minus => "'-'",
            Asterisk => "'*'",
            Slash => "'/'",
            Percent => "'%'",
            LParen => "'('",
            RParen => "')'",
            LBrace => "'{'",
            RBrace => "'}'",
            LBracket => "'['",
            RBracket => "']'",
            Comma => "','",
            Integer => "INTEGER",
            Char => "CHAR",
            Symbol => "SYMBOL",
            KwIf => "'if'",
            KwElse => "'else'",
            KwWhile => "'while'",
            KwLoop => "'loop'",
            KwFor => "'for'",
            KwBreak => "'break'",
            KwContinue => "'continue'",
            KwPuti => "'puti'",
            KwPutc => "'putc'",
            KwGeti => "'geti'",
            KwGetc => "'getc'",
            KwArray => "'array'",
            KwHalt => "'halt'",
            KwFunc => "'func'",
            KwReturn => "'return'",
            KwConst => "'const'",
            Eof => "EOF",
            Unknown => "UNKNOWN",
        }
    }
}

/// Identifier length bound, matching the 64-byte lex buffer (63 usable
/// bytes, null-terminated) of the original lexer.
pub const IDENT_MAX_LEN: usize = 63;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source lexeme: populated for `Symbol`, empty for everything else.
    pub text: String,
    /// Populated for `Integer` and `Char`.
    pub int_value: i32,
    pub location: Location,
}

impl Token {
    pub fn new(kind: TokenKind, text: String, int_value: i32, location: Location) -> Token {
        Token {
            kind,
            text,
            int_value,
            location,
        }
    }

    /// Source spelling used inside diagnostics: the identifier text, the
    /// integer/char value, or the token's canonical punctuation/keyword
    /// spelling with the surrounding quotes stripped.
    pub fn lexeme(&self) -> String {
        match self.kind {
            TokenKind::Symbol => self.text.clone(),
            TokenKind::Integer => self.int_value.to_string(),
            TokenKind::Char => format!("{}", self.int_value as u8 as char),
            TokenKind::Eof => String::new(),
            _ => self.kind.as_str().trim_matches('\'').to_string(),
        }
    }
}
