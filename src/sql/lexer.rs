//! SQL lexer for the DDL subset that carries foreign keys.

use std::iter::Peekable;
use std::str::Chars;

/// SQL token types.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Keywords
    Create,
    Alter,
    Add,
    Table,
    Only,
    Primary,
    Key,
    Foreign,
    References,
    Not,
    Null,
    Unique,
    Default,
    On,
    Constraint,
    Index,
    If,
    Exists,
    Check,

    // Identifiers and literals
    Ident(String),
    /// Quoted identifier; never a keyword.
    Quoted(String),
    Str(String),
    Num(String),

    // Symbols
    LParen,
    RParen,
    Comma,
    Semicolon,
    Dot,

    Eof,
}

impl Token {
    /// Identifier text, quoted or not.
    pub fn name(&self) -> Option<&str> {
        match self {
            Token::Ident(s) | Token::Quoted(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Identifier text and whether it was quoted.
    pub fn ident(&self) -> Option<(&str, bool)> {
        match self {
            Token::Ident(s) => Some((s.as_str(), false)),
            Token::Quoted(s) => Some((s.as_str(), true)),
            _ => None,
        }
    }
}

fn keyword(word: &str) -> Option<Token> {
    let token = match word.to_ascii_uppercase().as_str() {
        "CREATE" => Token::Create,
        "ALTER" => Token::Alter,
        "ADD" => Token::Add,
        "TABLE" => Token::Table,
        "ONLY" => Token::Only,
        "PRIMARY" => Token::Primary,
        "KEY" => Token::Key,
        "FOREIGN" => Token::Foreign,
        "REFERENCES" => Token::References,
        "NOT" => Token::Not,
        "NULL" => Token::Null,
        "UNIQUE" => Token::Unique,
        "DEFAULT" => Token::Default,
        "ON" => Token::On,
        "CONSTRAINT" => Token::Constraint,
        "INDEX" => Token::Index,
        "IF" => Token::If,
        "EXISTS" => Token::Exists,
        "CHECK" => Token::Check,
        _ => return None,
    };
    Some(token)
}

/// SQL lexer.
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
        }
    }

    fn bump_while(&mut self, keep: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(&c) = self.chars.peek() {
            if !keep(c) {
                break;
            }
            out.push(c);
            self.chars.next();
        }
        out
    }

    fn skip_line(&mut self) {
        for c in self.chars.by_ref() {
            if c == '\n' {
                break;
            }
        }
    }

    /// Called after the opening `/*` has been consumed.
    fn skip_block_comment(&mut self) {
        let mut prev = '\0';
        for c in self.chars.by_ref() {
            if prev == '*' && c == '/' {
                break;
            }
            prev = c;
        }
    }

    /// Read up to `close`; a doubled `close` is an escaped literal.
    fn read_delimited(&mut self, close: char, backslash_escapes: bool) -> String {
        let mut out = String::new();
        while let Some(c) = self.chars.next() {
            if c == close {
                if self.chars.peek() == Some(&close) {
                    self.chars.next();
                    out.push(close);
                    continue;
                }
                break;
            }
            if backslash_escapes && c == '\\' {
                if let Some(escaped) = self.chars.next() {
                    out.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        other => other,
                    });
                }
                continue;
            }
            out.push(c);
        }
        out
    }

    pub fn next_token(&mut self) -> Token {
        loop {
            let Some(c) = self.chars.next() else {
                return Token::Eof;
            };

            match c {
                c if c.is_whitespace() => continue,
                '-' if self.chars.peek() == Some(&'-') => self.skip_line(),
                '#' => self.skip_line(),
                '/' if self.chars.peek() == Some(&'*') => {
                    self.chars.next();
                    self.skip_block_comment();
                }
                '(' => return Token::LParen,
                ')' => return Token::RParen,
                ',' => return Token::Comma,
                ';' => return Token::Semicolon,
                '.' => return Token::Dot,
                '"' => return Token::Quoted(self.read_delimited('"', false)),
                '`' => return Token::Quoted(self.read_delimited('`', false)),
                '[' => return Token::Quoted(self.read_delimited(']', false)),
                '\'' => return Token::Str(self.read_delimited('\'', true)),
                c if c.is_ascii_digit() => {
                    let mut num = c.to_string();
                    num.push_str(&self.bump_while(|c| c.is_ascii_digit() || c == '.'));
                    return Token::Num(num);
                }
                c if c.is_alphabetic() || c == '_' => {
                    let mut word = c.to_string();
                    word.push_str(&self.bump_while(|c| c.is_alphanumeric() || c == '_' || c == '$'));
                    return keyword(&word).unwrap_or(Token::Ident(word));
                }
                // Operators, casts and anything else carry no schema information
                _ => continue,
            }
        }
    }

    /// Collect all tokens, ending with `Eof`.
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token == Token::Eof;
            tokens.push(token);
            if done {
                return tokens;
            }
        }
    }
}
