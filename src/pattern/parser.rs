//! Pattern DSL parser.
//!
//! Parses a token stream into a pattern AST and validates capture bindings.

use std::collections::BTreeSet;

use super::PatternError;
use super::lexer::Token;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Ast {
    /// `(tag child1 child2 ...)`
    Node { tag: String, children: Vec<Ast> },
    /// `tag` outside parentheses: children unconstrained
    BareTag(String),
    /// `{a b c}`
    Alt(Vec<Ast>),
    /// `$name:pattern`
    Capture { name: String, inner: Box<Ast> },
    /// `_`
    Wildcard,
    /// `...`
    Rest,
    Sym(String),
    Int(i64),
    Str(String),
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

pub(crate) fn parse(tokens: Vec<Token>) -> Result<Ast, PatternError> {
    let mut parser = Parser { tokens, pos: 0 };
    let ast = parser.parse_pattern()?;
    if parser.pos != parser.tokens.len() {
        return Err(PatternError::TrailingInput);
    }
    if matches!(ast, Ast::Rest) {
        return Err(PatternError::MisplacedRest);
    }
    Ok(ast)
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Result<Token, PatternError> {
        let tok = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or(PatternError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(tok)
    }

    fn parse_pattern(&mut self) -> Result<Ast, PatternError> {
        match self.advance()? {
            Token::LParen => self.parse_node(),
            Token::LBrace => self.parse_alternation(),
            Token::Capture(name) => {
                let inner = self.parse_pattern()?;
                Ok(Ast::Capture {
                    name,
                    inner: Box::new(inner),
                })
            }
            Token::Wildcard => Ok(Ast::Wildcard),
            Token::Rest => Ok(Ast::Rest),
            Token::SymbolLiteral(s) => Ok(Ast::Sym(s)),
            Token::IntLiteral(n) => Ok(Ast::Int(n)),
            Token::StringLiteral(s) => Ok(Ast::Str(s)),
            Token::Ident(name) => Ok(Ast::BareTag(name)),
            Token::RParen => Err(PatternError::UnbalancedGroup { expected: '(' }),
            Token::RBrace => Err(PatternError::UnbalancedGroup { expected: '{' }),
        }
    }

    fn parse_node(&mut self) -> Result<Ast, PatternError> {
        let tag = match self.advance()? {
            Token::Ident(name) => name,
            _ => return Err(PatternError::UnbalancedGroup { expected: ')' }),
        };

        let mut children = Vec::new();
        loop {
            match self.peek() {
                Some(Token::RParen) => {
                    self.pos += 1;
                    return Ok(Ast::Node { tag, children });
                }
                Some(_) => children.push(self.parse_pattern()?),
                None => return Err(PatternError::UnexpectedEnd),
            }
        }
    }

    fn parse_alternation(&mut self) -> Result<Ast, PatternError> {
        let mut branches = Vec::new();
        loop {
            match self.peek() {
                Some(Token::RBrace) => {
                    self.pos += 1;
                    if branches.is_empty() {
                        return Err(PatternError::EmptyAlternation);
                    }
                    return Ok(Ast::Alt(branches));
                }
                Some(_) => {
                    let branch = self.parse_pattern()?;
                    if matches!(branch, Ast::Rest) {
                        return Err(PatternError::MisplacedRest);
                    }
                    branches.push(branch);
                }
                None => return Err(PatternError::UnexpectedEnd),
            }
        }
    }
}

/// Validate captures: every name bound at most once along any match path,
/// and every alternation branch binding the same name set. Returns the
/// bound names.
pub(crate) fn binding_names(ast: &Ast) -> Result<BTreeSet<String>, PatternError> {
    match ast {
        Ast::Node { children, .. } => {
            let mut names = BTreeSet::new();
            for child in children {
                for name in binding_names(child)? {
                    if !names.insert(name.clone()) {
                        return Err(PatternError::DuplicateCapture(name));
                    }
                }
            }
            Ok(names)
        }
        Ast::Alt(branches) => {
            let first = binding_names(&branches[0])?;
            for branch in &branches[1..] {
                let other = binding_names(branch)?;
                if other != first {
                    let name = first
                        .symmetric_difference(&other)
                        .next()
                        .cloned()
                        .unwrap_or_default();
                    return Err(PatternError::CaptureMismatch(name));
                }
            }
            Ok(first)
        }
        Ast::Capture { name, inner } => {
            let mut names = binding_names(inner)?;
            if !names.insert(name.clone()) {
                return Err(PatternError::DuplicateCapture(name.clone()));
            }
            Ok(names)
        }
        _ => Ok(BTreeSet::new()),
    }
}

/// Short summary string for a pattern AST (for error messages and debugging).
pub fn pattern_summary(spec: &str) -> String {
    match super::lexer::tokenize(spec).and_then(parse) {
        Ok(ast) => summarize(&ast),
        Err(e) => format!("<invalid pattern: {e}>"),
    }
}

fn summarize(ast: &Ast) -> String {
    match ast {
        Ast::Node { tag, children } => {
            let inner: Vec<String> = children.iter().map(summarize).collect();
            if inner.is_empty() {
                format!("({tag})")
            } else {
                format!("({tag} {})", inner.join(" "))
            }
        }
        Ast::BareTag(name) => name.clone(),
        Ast::Alt(branches) => {
            let inner: Vec<String> = branches.iter().map(summarize).collect();
            format!("{{{}}}", inner.join(" "))
        }
        Ast::Capture { name, inner } => format!("${name}:{}", summarize(inner)),
        Ast::Wildcard => "_".to_string(),
        Ast::Rest => "...".to_string(),
        Ast::Sym(s) => format!(":{s}"),
        Ast::Int(n) => n.to_string(),
        Ast::Str(s) => format!("\"{s}\""),
    }
}

#[cfg(test)]
mod tests {
    use super::super::lexer::tokenize;
    use super::*;

    fn parse_str(spec: &str) -> Result<Ast, PatternError> {
        parse(tokenize(spec)?)
    }

    #[test]
    fn parses_simple_send() {
        let ast = parse_str("(send nil :create ...)").unwrap();
        match ast {
            Ast::Node { tag, children } => {
                assert_eq!(tag, "send");
                assert_eq!(children.len(), 3);
                assert_eq!(children[0], Ast::BareTag("nil".to_string()));
                assert_eq!(children[1], Ast::Sym("create".to_string()));
                assert_eq!(children[2], Ast::Rest);
            }
            other => panic!("expected Node, got {other:?}"),
        }
    }

    #[test]
    fn parses_nested_node() {
        let ast = parse_str("(block (send int :times) _ _)").unwrap();
        match ast {
            Ast::Node { tag, children } => {
                assert_eq!(tag, "block");
                assert!(matches!(&children[0], Ast::Node { tag, .. } if tag == "send"));
            }
            other => panic!("expected Node, got {other:?}"),
        }
    }

    #[test]
    fn parses_capture_of_alternation() {
        let ast = parse_str("$desc:{str dstr}").unwrap();
        match ast {
            Ast::Capture { name, inner } => {
                assert_eq!(name, "desc");
                assert!(matches!(*inner, Ast::Alt(ref branches) if branches.len() == 2));
            }
            other => panic!("expected Capture, got {other:?}"),
        }
    }

    #[test]
    fn rejects_empty_alternation() {
        assert_eq!(parse_str("{}"), Err(PatternError::EmptyAlternation));
    }

    #[test]
    fn rejects_rest_in_alternation() {
        assert_eq!(parse_str("{... :x}"), Err(PatternError::MisplacedRest));
    }

    #[test]
    fn rejects_top_level_rest() {
        assert_eq!(parse_str("..."), Err(PatternError::MisplacedRest));
    }

    #[test]
    fn rejects_trailing_tokens() {
        assert_eq!(parse_str("(send) (send)"), Err(PatternError::TrailingInput));
    }

    #[test]
    fn rejects_missing_close() {
        assert_eq!(parse_str("(send nil"), Err(PatternError::UnexpectedEnd));
    }

    #[test]
    fn rejects_stray_close() {
        assert_eq!(
            parse_str(")"),
            Err(PatternError::UnbalancedGroup { expected: '(' })
        );
    }

    #[test]
    fn binding_names_flags_duplicates() {
        let ast = parse_str("(send $a:_ $a:_)").unwrap();
        assert_eq!(
            binding_names(&ast),
            Err(PatternError::DuplicateCapture("a".to_string()))
        );
    }

    #[test]
    fn binding_names_requires_equal_branches() {
        let ast = parse_str("{(send $a:_ ...) (block ...)}").unwrap();
        assert_eq!(
            binding_names(&ast),
            Err(PatternError::CaptureMismatch("a".to_string()))
        );
    }

    #[test]
    fn binding_names_accepts_matching_branches() {
        let ast = parse_str("{(send $a:_ ...) (block $a:_ ...)}").unwrap();
        let names = binding_names(&ast).unwrap();
        assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["a".to_string()]);
    }

    #[test]
    fn summary_round_trips_shape() {
        assert_eq!(
            pattern_summary("(send  nil {:a :b} $x:_ ...)"),
            "(send nil {:a :b} $x:_ ...)"
        );
        assert!(pattern_summary("(send").starts_with("<invalid pattern"));
    }
}
