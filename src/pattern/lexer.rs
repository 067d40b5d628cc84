//! Pattern DSL lexer.
//!
//! Tokenizes pattern strings like `(send nil {:create :build} $args:...)`.

use super::PatternError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    LParen,
    RParen,
    LBrace,
    RBrace,
    /// `$name:`
    Capture(String),
    /// `_`
    Wildcard,
    /// `...`
    Rest,
    /// `:sym`
    SymbolLiteral(String),
    IntLiteral(i64),
    StringLiteral(String),
    /// Tag names: send, block, str, ...
    Ident(String),
}

struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
}

pub(crate) fn tokenize(input: &str) -> Result<Vec<Token>, PatternError> {
    Lexer {
        input: input.as_bytes(),
        pos: 0,
    }
    .run()
}

impl<'a> Lexer<'a> {
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.input.get(self.pos).copied()?;
        self.pos += 1;
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == b' ' || ch == b'\t' || ch == b'\n' || ch == b'\r' {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn read_while(&mut self, pred: impl Fn(u8) -> bool) -> String {
        let start = self.pos;
        while self.pos < self.input.len() && pred(self.input[self.pos]) {
            self.pos += 1;
        }
        String::from_utf8_lossy(&self.input[start..self.pos]).into_owned()
    }

    fn is_ident_char(ch: u8) -> bool {
        ch.is_ascii_alphanumeric() || ch == b'_'
    }

    fn run(&mut self) -> Result<Vec<Token>, PatternError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace();
            let Some(ch) = self.peek() else { break };

            match ch {
                b'(' => {
                    self.advance();
                    tokens.push(Token::LParen);
                }
                b')' => {
                    self.advance();
                    tokens.push(Token::RParen);
                }
                b'{' => {
                    self.advance();
                    tokens.push(Token::LBrace);
                }
                b'}' => {
                    self.advance();
                    tokens.push(Token::RBrace);
                }
                b'$' => {
                    let pos = self.pos;
                    self.advance();
                    let name = self.read_while(Self::is_ident_char);
                    if name.is_empty() || self.peek() != Some(b':') {
                        return Err(PatternError::MalformedCapture { pos });
                    }
                    self.advance(); // ':'
                    tokens.push(Token::Capture(name));
                }
                b'.' => {
                    if self.input[self.pos..].starts_with(b"...") {
                        self.pos += 3;
                        tokens.push(Token::Rest);
                    } else {
                        return Err(PatternError::UnexpectedChar {
                            ch: '.',
                            pos: self.pos,
                        });
                    }
                }
                b':' => {
                    self.advance();
                    let name = self.read_while(Self::is_ident_char);
                    if name.is_empty() {
                        return Err(PatternError::UnexpectedChar {
                            ch: ':',
                            pos: self.pos - 1,
                        });
                    }
                    tokens.push(Token::SymbolLiteral(name));
                }
                b'"' => {
                    self.advance();
                    let s = self.read_while(|c| c != b'"');
                    if self.advance().is_none() {
                        return Err(PatternError::UnterminatedString);
                    }
                    tokens.push(Token::StringLiteral(s));
                }
                b'_' => {
                    let word = self.read_while(Self::is_ident_char);
                    if word == "_" {
                        tokens.push(Token::Wildcard);
                    } else {
                        tokens.push(Token::Ident(word));
                    }
                }
                _ if ch.is_ascii_digit()
                    || (ch == b'-'
                        && self
                            .input
                            .get(self.pos + 1)
                            .is_some_and(|c| c.is_ascii_digit())) =>
                {
                    let num = self.read_while(|c| c.is_ascii_digit() || c == b'-');
                    match num.parse::<i64>() {
                        Ok(n) => tokens.push(Token::IntLiteral(n)),
                        Err(_) => {
                            return Err(PatternError::UnexpectedChar {
                                ch: ch as char,
                                pos: self.pos,
                            });
                        }
                    }
                }
                _ if ch.is_ascii_alphabetic() => {
                    let word = self.read_while(Self::is_ident_char);
                    tokens.push(Token::Ident(word));
                }
                _ => {
                    return Err(PatternError::UnexpectedChar {
                        ch: ch as char,
                        pos: self.pos,
                    });
                }
            }
        }

        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexes_basic_send_pattern() {
        let tokens = tokenize("(send nil :create ...)").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::LParen,
                Token::Ident("send".to_string()),
                Token::Ident("nil".to_string()),
                Token::SymbolLiteral("create".to_string()),
                Token::Rest,
                Token::RParen,
            ]
        );
    }

    #[test]
    fn lexes_alternation() {
        let tokens = tokenize("{:first :take}").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::LBrace,
                Token::SymbolLiteral("first".to_string()),
                Token::SymbolLiteral("take".to_string()),
                Token::RBrace,
            ]
        );
    }

    #[test]
    fn lexes_named_capture() {
        let tokens = tokenize("$desc:_").unwrap();
        assert_eq!(
            tokens,
            vec![Token::Capture("desc".to_string()), Token::Wildcard]
        );
    }

    #[test]
    fn lexes_captured_rest() {
        let tokens = tokenize("$args:...").unwrap();
        assert_eq!(tokens, vec![Token::Capture("args".to_string()), Token::Rest]);
    }

    #[test]
    fn lexes_int_literals() {
        assert_eq!(tokenize("42").unwrap(), vec![Token::IntLiteral(42)]);
        assert_eq!(tokenize("-1").unwrap(), vec![Token::IntLiteral(-1)]);
    }

    #[test]
    fn lexes_string_literal() {
        assert_eq!(
            tokenize("\"hello\"").unwrap(),
            vec![Token::StringLiteral("hello".to_string())]
        );
    }

    #[test]
    fn lexes_underscore_prefixed_ident() {
        assert_eq!(
            tokenize("_x").unwrap(),
            vec![Token::Ident("_x".to_string())]
        );
    }

    #[test]
    fn rejects_bare_dollar() {
        assert!(matches!(
            tokenize("$:x"),
            Err(PatternError::MalformedCapture { .. })
        ));
    }

    #[test]
    fn rejects_capture_without_colon() {
        assert!(matches!(
            tokenize("$name _"),
            Err(PatternError::MalformedCapture { .. })
        ));
    }

    #[test]
    fn rejects_unterminated_string() {
        assert_eq!(
            tokenize("\"oops"),
            Err(PatternError::UnterminatedString)
        );
    }

    #[test]
    fn rejects_stray_punctuation() {
        assert!(matches!(
            tokenize("(send @ :x)"),
            Err(PatternError::UnexpectedChar { ch: '@', .. })
        ));
    }

    #[test]
    fn rejects_short_ellipsis() {
        assert!(matches!(
            tokenize(".."),
            Err(PatternError::UnexpectedChar { ch: '.', .. })
        ));
    }
}
