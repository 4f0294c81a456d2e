//! Lexer for Vesper source text.
//!
//! Converts raw text into an ordered token sequence terminated by an
//! explicit `Eof` token, tracking line and column for diagnostics.
//! Whitespace and comments are discarded and never tokenized.

use crate::error::VesperError;

/// Kind of a token produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Special
    Eof,

    // Identifiers and literals
    Ident,
    Number,
    Str,

    // Punctuation
    LParen,   // (
    RParen,   // )
    LBrace,   // {
    RBrace,   // }
    LBracket, // [
    RBracket, // ]
    Comma,    // ,
    Semi,     // ;
    Colon,    // :
    Dot,      // .

    // Operators
    Plus,        // +
    Minus,       // -
    Star,        // *
    Slash,       // /
    Percent,     // %
    Bang,        // !
    Assign,      // =
    PlusAssign,  // +=
    MinusAssign, // -=
    StarAssign,  // *=
    SlashAssign, // /=
    EqEq,        // ==
    NotEq,       // !=
    Lt,          // <
    LtEq,        // <=
    Gt,          // >
    GtEq,        // >=
    AndAnd,      // &&
    OrOr,        // ||

    // Keywords
    Let,
    Def,
    Class,
    Extends,
    If,
    Elsif,
    Else,
    While,
    For,
    To,
    Step,
    Return,
    Break,
    Continue,
    Try,
    Catch,
    Finally,
    Import,
    From,
    As,
    True,
    False,
    Null,
}

/// A single token: kind, literal text, and source position.
///
/// `text` carries the identifier name, the numeric literal text, or
/// the unescaped string contents; it is empty for punctuation and
/// keywords. Tokens are produced once and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Token {
    /// Human-readable description used in parse error messages.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Eof => "end of input".to_string(),
            TokenKind::Ident => format!("identifier '{}'", self.text),
            TokenKind::Number => format!("number '{}'", self.text),
            TokenKind::Str => format!("string \"{}\"", self.text),
            _ => format!("'{}'", self.kind.lexeme()),
        }
    }
}

impl TokenKind {
    fn lexeme(self) -> &'static str {
        match self {
            TokenKind::Eof => "<eof>",
            TokenKind::Ident => "<identifier>",
            TokenKind::Number => "<number>",
            TokenKind::Str => "<string>",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Comma => ",",
            TokenKind::Semi => ";",
            TokenKind::Colon => ":",
            TokenKind::Dot => ".",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Bang => "!",
            TokenKind::Assign => "=",
            TokenKind::PlusAssign => "+=",
            TokenKind::MinusAssign => "-=",
            TokenKind::StarAssign => "*=",
            TokenKind::SlashAssign => "/=",
            TokenKind::EqEq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::Lt => "<",
            TokenKind::LtEq => "<=",
            TokenKind::Gt => ">",
            TokenKind::GtEq => ">=",
            TokenKind::AndAnd => "&&",
            TokenKind::OrOr => "||",
            TokenKind::Let => "let",
            TokenKind::Def => "def",
            TokenKind::Class => "class",
            TokenKind::Extends => "extends",
            TokenKind::If => "if",
            TokenKind::Elsif => "elsif",
            TokenKind::Else => "else",
            TokenKind::While => "while",
            TokenKind::For => "for",
            TokenKind::To => "to",
            TokenKind::Step => "step",
            TokenKind::Return => "return",
            TokenKind::Break => "break",
            TokenKind::Continue => "continue",
            TokenKind::Try => "try",
            TokenKind::Catch => "catch",
            TokenKind::Finally => "finally",
            TokenKind::Import => "import",
            TokenKind::From => "from",
            TokenKind::As => "as",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Null => "null",
        }
    }
}

/// Lex a source string into tokens.
///
/// The returned sequence always ends with a single `Eof` token. Fails
/// with `VesperError::Lex` on the first character no rule matches.
pub fn lex(source: &str) -> Result<Vec<Token>, VesperError> {
    let mut lexer = Lexer {
        chars: source.chars().collect(),
        index: 0,
        line: 1,
        column: 1,
    };
    lexer.run()
}

struct Lexer {
    chars: Vec<char>,
    index: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    fn run(&mut self) -> Result<Vec<Token>, VesperError> {
        let mut tokens = Vec::new();

        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.bump();
                continue;
            }
            if ch == '/' && self.peek_next() == Some('/') {
                self.skip_line_comment();
                continue;
            }
            if ch == '/' && self.peek_next() == Some('*') {
                self.skip_block_comment();
                continue;
            }

            let line = self.line;
            let column = self.column;
            let offset = self.index;

            let token = if is_ident_start(ch) {
                self.lex_ident_or_keyword(line, column, offset)
            } else if ch.is_ascii_digit() {
                self.lex_number(line, column, offset)
            } else if ch == '"' || ch == '\'' {
                self.lex_string(ch, line, column, offset)?
            } else {
                self.lex_operator(ch, line, column, offset)?
            };
            tokens.push(token);
        }

        tokens.push(Token {
            kind: TokenKind::Eof,
            text: String::new(),
            line: self.line,
            column: self.column,
            offset: self.index,
        });
        Ok(tokens)
    }

    fn lex_ident_or_keyword(&mut self, line: usize, column: usize, offset: usize) -> Token {
        let mut text = String::new();
        while let Some(ch) = self.peek() {
            if is_ident_continue(ch) {
                text.push(ch);
                self.bump();
            } else {
                break;
            }
        }

        // Keywords win over identifiers; the match is case-sensitive.
        let kind = match text.as_str() {
            "let" => TokenKind::Let,
            "def" => TokenKind::Def,
            "class" => TokenKind::Class,
            "extends" => TokenKind::Extends,
            "if" => TokenKind::If,
            "elsif" => TokenKind::Elsif,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "for" => TokenKind::For,
            "to" => TokenKind::To,
            "step" => TokenKind::Step,
            "return" => TokenKind::Return,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "try" => TokenKind::Try,
            "catch" => TokenKind::Catch,
            "finally" => TokenKind::Finally,
            "import" => TokenKind::Import,
            "from" => TokenKind::From,
            "as" => TokenKind::As,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            _ => TokenKind::Ident,
        };

        let text = if kind == TokenKind::Ident { text } else { String::new() };
        Token { kind, text, line, column, offset }
    }

    fn lex_number(&mut self, line: usize, column: usize, offset: usize) -> Token {
        let mut text = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                text.push(ch);
                self.bump();
            } else {
                break;
            }
        }

        // Fractional part: '.' must be followed by a digit, otherwise it
        // belongs to a member access.
        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            text.push('.');
            self.bump();
            while let Some(ch) = self.peek() {
                if ch.is_ascii_digit() {
                    text.push(ch);
                    self.bump();
                } else {
                    break;
                }
            }
        }

        // Exponent suffix: e / E with optional sign.
        if matches!(self.peek(), Some('e') | Some('E')) {
            let after_e = self.peek_next();
            let has_digits = match after_e {
                Some('+') | Some('-') => self.peek_at(2).is_some_and(|c| c.is_ascii_digit()),
                Some(c) => c.is_ascii_digit(),
                None => false,
            };
            if has_digits {
                if let Some(marker) = self.peek() {
                    text.push(marker);
                    self.bump();
                }
                if let Some(sign @ ('+' | '-')) = self.peek() {
                    text.push(sign);
                    self.bump();
                }
                while let Some(ch) = self.peek() {
                    if ch.is_ascii_digit() {
                        text.push(ch);
                        self.bump();
                    } else {
                        break;
                    }
                }
            }
        }

        Token {
            kind: TokenKind::Number,
            text,
            line,
            column,
            offset,
        }
    }

    fn lex_string(
        &mut self,
        quote: char,
        line: usize,
        column: usize,
        offset: usize,
    ) -> Result<Token, VesperError> {
        self.bump(); // opening quote

        let mut text = String::new();
        loop {
            match self.peek() {
                Some(ch) if ch == quote => {
                    self.bump();
                    return Ok(Token {
                        kind: TokenKind::Str,
                        text,
                        line,
                        column,
                        offset,
                    });
                }
                Some('\\') => {
                    self.bump();
                    let escaped = self.peek().ok_or(VesperError::Lex {
                        character: '\\',
                        line: self.line,
                        column: self.column,
                    })?;
                    let resolved = match escaped {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        '\\' => '\\',
                        '"' => '"',
                        '\'' => '\'',
                        other => {
                            return Err(VesperError::Lex {
                                character: other,
                                line: self.line,
                                column: self.column,
                            });
                        }
                    };
                    text.push(resolved);
                    self.bump();
                }
                Some(ch) => {
                    text.push(ch);
                    self.bump();
                }
                None => {
                    return Err(VesperError::Lex {
                        character: quote,
                        line,
                        column,
                    });
                }
            }
        }
    }

    fn lex_operator(
        &mut self,
        ch: char,
        line: usize,
        column: usize,
        offset: usize,
    ) -> Result<Token, VesperError> {
        let next = self.peek_next();

        // Maximal munch: two-character operators before their
        // one-character prefixes.
        let (kind, len) = match (ch, next) {
            ('=', Some('=')) => (TokenKind::EqEq, 2),
            ('!', Some('=')) => (TokenKind::NotEq, 2),
            ('<', Some('=')) => (TokenKind::LtEq, 2),
            ('>', Some('=')) => (TokenKind::GtEq, 2),
            ('&', Some('&')) => (TokenKind::AndAnd, 2),
            ('|', Some('|')) => (TokenKind::OrOr, 2),
            ('+', Some('=')) => (TokenKind::PlusAssign, 2),
            ('-', Some('=')) => (TokenKind::MinusAssign, 2),
            ('*', Some('=')) => (TokenKind::StarAssign, 2),
            ('/', Some('=')) => (TokenKind::SlashAssign, 2),
            ('+', _) => (TokenKind::Plus, 1),
            ('-', _) => (TokenKind::Minus, 1),
            ('*', _) => (TokenKind::Star, 1),
            ('/', _) => (TokenKind::Slash, 1),
            ('%', _) => (TokenKind::Percent, 1),
            ('!', _) => (TokenKind::Bang, 1),
            ('=', _) => (TokenKind::Assign, 1),
            ('<', _) => (TokenKind::Lt, 1),
            ('>', _) => (TokenKind::Gt, 1),
            ('(', _) => (TokenKind::LParen, 1),
            (')', _) => (TokenKind::RParen, 1),
            ('{', _) => (TokenKind::LBrace, 1),
            ('}', _) => (TokenKind::RBrace, 1),
            ('[', _) => (TokenKind::LBracket, 1),
            (']', _) => (TokenKind::RBracket, 1),
            (',', _) => (TokenKind::Comma, 1),
            (';', _) => (TokenKind::Semi, 1),
            (':', _) => (TokenKind::Colon, 1),
            ('.', _) => (TokenKind::Dot, 1),
            (other, _) => {
                return Err(VesperError::Lex {
                    character: other,
                    line,
                    column,
                });
            }
        };

        for _ in 0..len {
            self.bump();
        }
        Ok(Token {
            kind,
            text: String::new(),
            line,
            column,
            offset,
        })
    }

    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.bump();
        }
    }

    /// Block comments do not nest; the first `*/` closes the comment.
    fn skip_block_comment(&mut self) {
        self.bump(); // '/'
        self.bump(); // '*'
        while let Some(ch) = self.peek() {
            if ch == '*' && self.peek_next() == Some('/') {
                self.bump();
                self.bump();
                return;
            }
            self.bump();
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.index + 1).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.index + ahead).copied()
    }

    fn bump(&mut self) {
        if let Some(ch) = self.peek() {
            self.index += 1;
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_ident_continue(ch: char) -> bool {
    is_ident_start(ch) || ch.is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).expect("lex").into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_declaration() {
        assert_eq!(
            kinds("let x = 10"),
            vec![
                TokenKind::Let,
                TokenKind::Ident,
                TokenKind::Assign,
                TokenKind::Number,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn maximal_munch_prefers_two_char_operators() {
        assert_eq!(
            kinds("== = <= < += +"),
            vec![
                TokenKind::EqEq,
                TokenKind::Assign,
                TokenKind::LtEq,
                TokenKind::Lt,
                TokenKind::PlusAssign,
                TokenKind::Plus,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn lexes_numbers_with_fraction_and_exponent() {
        let tokens = lex("3 3.25 1e3 2.5e-2 6E+1").expect("lex");
        let texts: Vec<&str> = tokens[..5].iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["3", "3.25", "1e3", "2.5e-2", "6E+1"]);
        assert!(tokens[..5].iter().all(|t| t.kind == TokenKind::Number));
    }

    #[test]
    fn dot_without_digit_is_member_access() {
        assert_eq!(
            kinds("a.b 1.x"),
            vec![
                TokenKind::Ident,
                TokenKind::Dot,
                TokenKind::Ident,
                TokenKind::Number,
                TokenKind::Dot,
                TokenKind::Ident,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn lexes_strings_with_escapes() {
        let tokens = lex(r#""a\nb" 'it\'s'"#).expect("lex");
        assert_eq!(tokens[0].text, "a\nb");
        assert_eq!(tokens[1].text, "it's");
    }

    #[test]
    fn discards_comments() {
        assert_eq!(
            kinds("1 // comment\n/* block\nstill */ 2"),
            vec![TokenKind::Number, TokenKind::Number, TokenKind::Eof]
        );
    }

    #[test]
    fn block_comments_do_not_nest() {
        // The first */ closes the comment; the inner /* is plain text.
        let result = lex("/* /* inner */ 1");
        let tokens = result.expect("lex");
        assert_eq!(tokens[0].kind, TokenKind::Number);
    }

    #[test]
    fn tracks_line_and_column() {
        let tokens = lex("let\n  x").expect("lex");
        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!((tokens[1].line, tokens[1].column), (2, 3));
        assert_eq!(tokens[1].offset, 6);
    }

    #[test]
    fn rejects_unknown_character() {
        let err = lex("let x = @").unwrap_err();
        match err {
            VesperError::Lex { character, line, column } => {
                assert_eq!(character, '@');
                assert_eq!(line, 1);
                assert_eq!(column, 9);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unterminated_string_is_an_error() {
        assert!(lex("\"abc").is_err());
    }

    #[test]
    fn keywords_are_case_sensitive() {
        let tokens = lex("Let let").expect("lex");
        assert_eq!(tokens[0].kind, TokenKind::Ident);
        assert_eq!(tokens[1].kind, TokenKind::Let);
    }

    #[test]
    fn step_is_reserved() {
        assert_eq!(kinds("step"), vec![TokenKind::Step, TokenKind::Eof]);
    }

    #[test]
    fn token_boundaries_reconstruct_source() {
        // Concatenating token texts and lexemes in order reproduces the
        // source modulo whitespace and comments.
        let source = "let total = 1 + 2 // sum\nwhile total < 10 { total += 1 }";
        let tokens = lex(source).expect("lex");
        let mut rebuilt = String::new();
        for token in &tokens {
            match token.kind {
                TokenKind::Eof => {}
                TokenKind::Ident | TokenKind::Number => rebuilt.push_str(&token.text),
                TokenKind::Str => {
                    rebuilt.push('"');
                    rebuilt.push_str(&token.text);
                    rebuilt.push('"');
                }
                kind => rebuilt.push_str(kind.lexeme()),
            }
            rebuilt.push(' ');
        }
        let normalized: String = source
            .replace("// sum", "")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(rebuilt.trim(), normalized);
    }
}
