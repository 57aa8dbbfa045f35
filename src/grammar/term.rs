//! Grammar-file parser.
//!
//! Reuses the Lox lexer to tokenize the grammar DSL itself — the grammar
//! file's `->`, `*`, `+`, `(`, `)`, identifiers, string literals and the
//! `or` keyword are exactly the `Minus`, `Gt`, `Star`, `Plus`, `ParenL`,
//! `ParenR`, `Identifier`, `String`, `Or` token kinds the lexer already
//! produces, so no separate DSL tokenizer is needed. Builds up terms on a
//! shift-only stack: identifiers and strings push directly, `(`/`)` pairs
//! collapse into a `Group`, and `*`/`+` wrap the immediately preceding
//! term.

use crate::error::GrammarError;
use crate::grammar::{EbnfGrammar, GrammarTerm};
use crate::lexer::{CodeStream, Lexer};
use crate::position::Position;
use crate::token::TokenKind;

struct Stack {
    terms: Vec<GrammarTerm>,
    /// Indices into `terms` at which an open `(` was seen but not yet
    /// closed.
    group_starts: Vec<usize>,
    /// True right after an `Alt` marker or an open `(`; `*`/`+` are
    /// rejected in this position since there is no preceding term to wrap.
    at_open_or_alt: bool,
}

impl Stack {
    fn new() -> Self {
        Self {
            terms: Vec::new(),
            group_starts: Vec::new(),
            at_open_or_alt: false,
        }
    }

    fn is_empty(&self) -> bool {
        self.terms.is_empty() && self.group_starts.is_empty()
    }

    fn take(&mut self) -> Vec<GrammarTerm> {
        self.group_starts.clear();
        self.at_open_or_alt = false;
        std::mem::take(&mut self.terms)
    }
}

/// Parses a grammar-file source string into an [`EbnfGrammar`].
pub fn parse_grammar_file(source: &str) -> Result<EbnfGrammar, GrammarError> {
    let mut lexer = Lexer::with_default_priority();
    let mut code = CodeStream::new(source);
    let mut grammar = EbnfGrammar::new();
    let mut stack = Stack::new();
    let mut current_name: Option<String> = None;
    let mut line_index: usize = 0;

    loop {
        let tok = lexer
            .read_token(&mut code)
            .map_err(|e| GrammarError::from_lex(e, Position::default()))?;

        match tok.kind {
            TokenKind::Whitespace | TokenKind::Comment => continue,
            TokenKind::Eof => {
                if let Some(name) = current_name.take() {
                    if !stack.group_starts.is_empty() {
                        return Err(GrammarError::InvalidGrammar {
                            reason: "unbalanced bracket: missing ')'".into(),
                            pos: Position::new(tok.line, tok.column),
                        });
                    }
                    grammar.insert(name, stack.take());
                }
                return Ok(grammar);
            }
            TokenKind::Newline => {
                if let Some(name) = current_name.take() {
                    if !stack.group_starts.is_empty() {
                        return Err(GrammarError::InvalidGrammar {
                            reason: "unbalanced bracket: missing ')'".into(),
                            pos: Position::new(tok.line, tok.column),
                        });
                    }
                    grammar.insert(name, stack.take());
                } else {
                    stack.take();
                }
                line_index = 0;
                continue;
            }
            _ => {}
        }

        let pos = Position::new(tok.line, tok.column);

        if line_index == 0 {
            if tok.kind != TokenKind::Identifier {
                return Err(GrammarError::InvalidGrammar {
                    reason: "left expression missing".into(),
                    pos,
                });
            }
            current_name = Some(tok.lexeme.clone());
            line_index += 1;
            continue;
        }
        if line_index == 1 {
            if tok.kind != TokenKind::Minus {
                return Err(GrammarError::InvalidGrammar {
                    reason: "separator (->) is missing".into(),
                    pos,
                });
            }
            line_index += 1;
            continue;
        }
        if line_index == 2 {
            if tok.kind != TokenKind::Gt {
                return Err(GrammarError::InvalidGrammar {
                    reason: "separator (->) is missing".into(),
                    pos,
                });
            }
            line_index += 1;
            continue;
        }

        match tok.kind {
            TokenKind::Identifier => {
                stack.terms.push(GrammarTerm::Nonterminal(tok.lexeme));
                stack.at_open_or_alt = false;
            }
            TokenKind::String => {
                let content = tok
                    .lexeme
                    .strip_prefix('"')
                    .and_then(|s| s.strip_suffix('"'))
                    .unwrap_or(&tok.lexeme)
                    .to_string();
                stack.terms.push(GrammarTerm::Terminal(content));
                stack.at_open_or_alt = false;
            }
            TokenKind::ParenL => {
                stack.group_starts.push(stack.terms.len());
                stack.at_open_or_alt = true;
            }
            TokenKind::ParenR => {
                let Some(start) = stack.group_starts.pop() else {
                    return Err(GrammarError::InvalidGrammar {
                        reason: "no matching '(' found for ')'".into(),
                        pos,
                    });
                };
                let contents = stack.terms.split_off(start);
                stack.terms.push(GrammarTerm::Group(contents));
                stack.at_open_or_alt = false;
            }
            TokenKind::Star | TokenKind::Plus => {
                if stack.terms.is_empty() || stack.at_open_or_alt {
                    let sym = if tok.kind == TokenKind::Star { "*" } else { "+" };
                    return Err(GrammarError::InvalidGrammar {
                        reason: format!("'{}' has no preceding term", sym),
                        pos,
                    });
                }
                let prev = stack.terms.pop().unwrap();
                let wrapped = if tok.kind == TokenKind::Star {
                    GrammarTerm::Star(Box::new(prev))
                } else {
                    GrammarTerm::Plus(Box::new(prev))
                };
                stack.terms.push(wrapped);
            }
            TokenKind::Or => {
                stack.terms.push(GrammarTerm::Alt);
                stack.at_open_or_alt = true;
            }
            other => {
                return Err(GrammarError::InvalidGrammar {
                    reason: format!("unexpected token {} in grammar body", other),
                    pos,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_rule() {
        let grammar = parse_grammar_file("expr -> \"NUMBER\"\n").unwrap();
        assert_eq!(grammar.start_symbol(), Some("expr"));
        assert_eq!(
            grammar.get("expr").unwrap(),
            &[GrammarTerm::Terminal("NUMBER".into())]
        );
    }

    #[test]
    fn parses_star_plus_group_or() {
        let grammar =
            parse_grammar_file("expr -> (\"a\" or \"b\")* \"c\"+\n").unwrap();
        let body = grammar.get("expr").unwrap();
        assert!(matches!(body[0], GrammarTerm::Star(_)));
        assert!(matches!(body[1], GrammarTerm::Plus(_)));
    }

    #[test]
    fn star_with_no_preceding_term_is_invalid() {
        let err = parse_grammar_file("bad -> * \"x\"\n").unwrap_err();
        match err {
            GrammarError::InvalidGrammar { reason, .. } => {
                assert!(reason.contains("no preceding term"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_left_side_is_invalid() {
        let err = parse_grammar_file("-> \"x\"\n").unwrap_err();
        assert!(matches!(err, GrammarError::InvalidGrammar { .. }));
    }

    #[test]
    fn unbalanced_bracket_is_invalid() {
        let err = parse_grammar_file("expr -> ( \"a\"\n").unwrap_err();
        assert!(matches!(err, GrammarError::InvalidGrammar { .. }));
    }

    #[test]
    fn blank_lines_and_comments_are_skipped() {
        let grammar = parse_grammar_file("\n// comment\nexpr -> \"a\"\n").unwrap();
        assert_eq!(grammar.start_symbol(), Some("expr"));
    }

    #[test]
    fn eof_flushes_last_rule_without_trailing_newline() {
        let grammar = parse_grammar_file("expr -> \"a\"").unwrap();
        assert_eq!(grammar.get("expr").unwrap().len(), 1);
    }
}
