//! Lexical Analyzer for the language
//!
//! This module implements the tokenization phase of the interpreter pipeline.
//! It converts raw source text into a stream of tokens that the parser turns
//! into an Abstract Syntax Tree.
//!
//! ## Tokenization Process
//!
//! 1. **Whitespace & comments**: spaces, tabs, carriage returns and newlines
//!    are skipped (newlines still advance the line counter); `//` starts a
//!    line comment that runs to (but does not consume) the next newline.
//! 2. **Keyword recognition**: the language's multi-word keyword phrases
//!    (`agar kismat rahi`, `jab tak hai jaan`, ...) are matched with a
//!    greedy, case-insensitive, longest-match scan before any identifier is
//!    attempted — see [`Lexer::match_keyword`].
//! 3. **Literals**: numbers (`DIGIT+ ('.' DIGIT+)?`) and double-quoted
//!    strings with `\n \t \r \" \\` escapes.
//! 4. **Identifiers**: `[A-Za-z_][A-Za-z0-9_]*`, checked against the
//!    single-word keyword set (`warna`, `climax`, `sach`, `galat`, `khaali`)
//!    after the full word has been scanned.
//! 5. **Operators & punctuation**: single- and two-character operators with
//!    one character of lookahead.
//!
//! Columns point to the start of the emitted lexeme; the lexer reports the
//! offending line/column on any malformed input.

use crate::error::{LangError, Position, Result};
use once_cell::sync::Lazy;

/// Every distinct kind of token the lexer can produce. Literal tokens carry
/// their already-converted value; the parser never re-parses a lexeme.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // multi-word and single-word keywords
    Action,
    End,
    Let,
    If,
    ElseIf,
    Else,
    While,
    Break,
    Func,
    Return,
    Print,
    True,
    False,
    Null,

    // literals and names
    Number(f64),
    Str(String),
    Identifier(String),

    // operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Equal,
    EqualEqual,
    Bang,
    BangEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    AndAnd,
    OrOr,

    // punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Colon,

    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    fn new(kind: TokenKind, lexeme: impl Into<String>, line: usize, column: usize) -> Self {
        Self { kind, lexeme: lexeme.into(), line, column }
    }

    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }
}

/// Multi-word keyword phrases, longest first. A phrase ending in `!` or `:`
/// is a "terminated" phrase: it matches on character equality alone. Every
/// other phrase additionally requires a word boundary (EOF or a
/// non-identifier character) right after it, which is what stops e.g.
/// `jab tak hai jaanepeg` from being read as the keyword plus garbage.
static KEYWORD_PHRASES: Lazy<Vec<(&'static str, TokenKind)>> = Lazy::new(|| {
    let mut phrases = vec![
        ("chal bhai suru kar", TokenKind::Action),
        ("action!", TokenKind::Action),
        ("bas khatam karo", TokenKind::End),
        ("paisa vasool", TokenKind::End),
        ("maan lo", TokenKind::Let),
        ("agar kismat rahi", TokenKind::If),
        ("nahi to", TokenKind::ElseIf),
        ("jab tak hai jaan", TokenKind::While),
        ("me bahar ja raha hu", TokenKind::Break),
        ("dialogue wapas do", TokenKind::Return),
        ("ek baat bataun:", TokenKind::Print),
    ];
    phrases.sort_by_key(|(phrase, _)| std::cmp::Reverse(phrase.chars().count()));
    phrases
});

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self { input: source.chars().collect(), position: 0, line: 1, column: 1 }
    }

    /// Tokenizes the entire source, returning a stream terminated by `Eof`.
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        log::trace!("lexer: start");
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        log::trace!("lexer: end, {} tokens", tokens.len());
        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Token> {
        self.skip_trivia();

        let line = self.line;
        let column = self.column;

        if self.is_at_end() {
            return Ok(Token::new(TokenKind::Eof, "", line, column));
        }

        if self.peek().is_ascii_alphabetic() || self.peek() == '_' {
            if let Some((kind, lexeme)) = self.match_keyword() {
                return Ok(Token::new(kind, lexeme, line, column));
            }
            return self.identifier_or_keyword(line, column);
        }

        let c = self.advance();
        match c {
            '(' => Ok(Token::new(TokenKind::LParen, "(", line, column)),
            ')' => Ok(Token::new(TokenKind::RParen, ")", line, column)),
            '{' => Ok(Token::new(TokenKind::LBrace, "{", line, column)),
            '}' => Ok(Token::new(TokenKind::RBrace, "}", line, column)),
            ',' => Ok(Token::new(TokenKind::Comma, ",", line, column)),
            ':' => Ok(Token::new(TokenKind::Colon, ":", line, column)),
            '+' => Ok(Token::new(TokenKind::Plus, "+", line, column)),
            '-' => Ok(Token::new(TokenKind::Minus, "-", line, column)),
            '*' => Ok(Token::new(TokenKind::Star, "*", line, column)),
            '%' => Ok(Token::new(TokenKind::Percent, "%", line, column)),
            '/' => {
                if self.peek() == '/' {
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                    self.next_token()
                } else {
                    Ok(Token::new(TokenKind::Slash, "/", line, column))
                }
            }
            '=' => {
                if self.peek() == '=' {
                    self.advance();
                    Ok(Token::new(TokenKind::EqualEqual, "==", line, column))
                } else {
                    Ok(Token::new(TokenKind::Equal, "=", line, column))
                }
            }
            '!' => {
                if self.peek() == '=' {
                    self.advance();
                    Ok(Token::new(TokenKind::BangEqual, "!=", line, column))
                } else {
                    Ok(Token::new(TokenKind::Bang, "!", line, column))
                }
            }
            '<' => {
                if self.peek() == '=' {
                    self.advance();
                    Ok(Token::new(TokenKind::LessEqual, "<=", line, column))
                } else {
                    Ok(Token::new(TokenKind::Less, "<", line, column))
                }
            }
            '>' => {
                if self.peek() == '=' {
                    self.advance();
                    Ok(Token::new(TokenKind::GreaterEqual, ">=", line, column))
                } else {
                    Ok(Token::new(TokenKind::Greater, ">", line, column))
                }
            }
            '&' => {
                if self.peek() == '&' {
                    self.advance();
                    Ok(Token::new(TokenKind::AndAnd, "&&", line, column))
                } else {
                    Err(LangError::lexer(
                        "Expected '&&', found single '&'",
                        Position::new(line, column),
                    ))
                }
            }
            '|' => {
                if self.peek() == '|' {
                    self.advance();
                    Ok(Token::new(TokenKind::OrOr, "||", line, column))
                } else {
                    Err(LangError::lexer(
                        "Expected '||', found single '|'",
                        Position::new(line, column),
                    ))
                }
            }
            '"' => self.string_literal(line, column),
            c if c.is_ascii_digit() => self.number_literal(c, line, column),
            other => Err(LangError::lexer(
                format!("Unexpected character '{}'", other),
                Position::new(line, column),
            )),
        }
    }

    /// Attempts a greedy, case-insensitive, longest-match against the
    /// multi-word keyword table at the current position. Returns the
    /// matched kind and its exact source lexeme, without consuming input on
    /// failure.
    fn match_keyword(&mut self) -> Option<(TokenKind, String)> {
        for (phrase, kind) in KEYWORD_PHRASES.iter() {
            if let Some(lexeme) = self.try_match_phrase(phrase) {
                let chars: usize = phrase.chars().count();
                let terminated = phrase.ends_with('!') || phrase.ends_with(':');
                if terminated {
                    self.advance_n(chars);
                    return Some((kind.clone(), lexeme));
                }

                let boundary_ok = match self.input.get(self.position + chars) {
                    None => true,
                    Some(c) => !is_ident_char(*c),
                };
                if boundary_ok {
                    self.advance_n(chars);
                    return Some((kind.clone(), lexeme));
                }
            }
        }
        None
    }

    /// Compares `phrase` against the upcoming characters using ASCII
    /// case-folding, without consuming input. Returns the exact source
    /// slice on success.
    fn try_match_phrase(&self, phrase: &str) -> Option<String> {
        let phrase_chars: Vec<char> = phrase.chars().collect();
        if self.position + phrase_chars.len() > self.input.len() {
            return None;
        }
        for (offset, expected) in phrase_chars.iter().enumerate() {
            let actual = self.input[self.position + offset];
            if !actual.eq_ignore_ascii_case(expected) {
                return None;
            }
        }
        Some(self.input[self.position..self.position + phrase_chars.len()].iter().collect())
    }

    fn advance_n(&mut self, count: usize) {
        for _ in 0..count {
            self.advance();
        }
    }

    fn identifier_or_keyword(&mut self, line: usize, column: usize) -> Result<Token> {
        let mut value = String::new();
        while !self.is_at_end() && is_ident_char(self.peek()) {
            value.push(self.advance());
        }

        let kind = match value.to_ascii_lowercase().as_str() {
            "warna" => TokenKind::Else,
            "climax" => TokenKind::Func,
            "sach" => TokenKind::True,
            "galat" => TokenKind::False,
            "khaali" => TokenKind::Null,
            _ => TokenKind::Identifier(value.clone()),
        };
        Ok(Token::new(kind, value, line, column))
    }

    fn number_literal(&mut self, first_digit: char, line: usize, column: usize) -> Result<Token> {
        let mut value = String::from(first_digit);
        while self.peek().is_ascii_digit() {
            value.push(self.advance());
        }
        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            value.push(self.advance());
            while self.peek().is_ascii_digit() {
                value.push(self.advance());
            }
        }

        match value.parse::<f64>() {
            Ok(n) => Ok(Token::new(TokenKind::Number(n), value, line, column)),
            Err(_) => Err(LangError::lexer(
                format!("Invalid number literal '{}'", value),
                Position::new(line, column),
            )),
        }
    }

    fn string_literal(&mut self, line: usize, column: usize) -> Result<Token> {
        let mut value = String::new();
        let mut lexeme = String::from('"');
        loop {
            if self.is_at_end() {
                return Err(LangError::lexer(
                    "Unterminated string literal",
                    Position::new(line, column),
                ));
            }
            let c = self.advance();
            lexeme.push(c);
            match c {
                '"' => break,
                '\\' => {
                    if self.is_at_end() {
                        return Err(LangError::lexer(
                            "Unterminated string literal",
                            Position::new(line, column),
                        ));
                    }
                    let escaped = self.advance();
                    lexeme.push(escaped);
                    value.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        '"' => '"',
                        '\\' => '\\',
                        other => other,
                    });
                }
                '\n' => {
                    return Err(LangError::lexer(
                        "Unterminated string literal",
                        Position::new(line, column),
                    ));
                }
                other => value.push(other),
            }
        }
        Ok(Token::new(TokenKind::Str(value), lexeme, line, column))
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                ' ' | '\t' | '\r' | '\n' => {
                    self.advance();
                }
                '/' if self.peek_next() == '/' => {
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn advance(&mut self) -> char {
        let c = self.input[self.position];
        self.position += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        c
    }

    fn peek(&self) -> char {
        self.input.get(self.position).copied().unwrap_or('\0')
    }

    fn peek_next(&self) -> char {
        self.input.get(self.position + 1).copied().unwrap_or('\0')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source).tokenize().unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn longest_match_prefers_longer_keyword() {
        // "nahi to" must not be split into an identifier "nahi" plus "to".
        assert_eq!(kinds("nahi to"), vec![TokenKind::ElseIf, TokenKind::Eof]);
    }

    #[test]
    fn keyword_boundary_rejects_identifier_continuation() {
        assert_eq!(
            kinds("maanager"),
            vec![TokenKind::Identifier("maanager".to_string()), TokenKind::Eof]
        );
    }

    #[test]
    fn case_insensitive_keyword_match() {
        assert_eq!(kinds("AGAR KISMAT RAHI"), vec![TokenKind::If, TokenKind::Eof]);
    }

    #[test]
    fn terminated_keyword_matches_without_boundary_check() {
        assert_eq!(kinds("action!"), vec![TokenKind::Action, TokenKind::Eof]);
    }

    #[test]
    fn string_escapes_are_translated() {
        let tokens = Lexer::new(r#""a\nb""#).tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Str("a\nb".to_string()));
    }

    #[test]
    fn number_literals_support_decimals() {
        assert_eq!(kinds("3.14"), vec![TokenKind::Number(3.14), TokenKind::Eof]);
    }

    #[test]
    fn lone_ampersand_is_a_lexer_error() {
        assert!(Lexer::new("a & b").tokenize().is_err());
    }

    #[test]
    fn identifier_may_start_with_underscore() {
        assert_eq!(
            kinds("_private _2x __"),
            vec![
                TokenKind::Identifier("_private".to_string()),
                TokenKind::Identifier("_2x".to_string()),
                TokenKind::Identifier("__".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn comment_runs_to_end_of_line_only() {
        assert_eq!(
            kinds("1 // two\n2"),
            vec![TokenKind::Number(1.0), TokenKind::Number(2.0), TokenKind::Eof]
        );
    }

    #[test]
    fn single_word_keywords_are_case_insensitive() {
        assert_eq!(kinds("SACH"), vec![TokenKind::True, TokenKind::Eof]);
    }
}
