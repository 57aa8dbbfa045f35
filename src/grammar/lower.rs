//! EBNF-to-BNF lowering: introduces synthetic nonterminals for `Star`,
//! `Plus`, `Group` and for each `Alt`-separated branch, producing a flat
//! [`BnfGrammar`] with every alternative a plain element sequence.
//!
//! `Plus` lowers by expanding its inner content twice (once for the
//! mandatory leading occurrence, once inside the trailing `Star`-shaped
//! synthetic), and alternation silently skips any zero-length path.

use std::collections::HashMap;

use crate::error::GrammarError;
use crate::grammar::{is_synthetic, BnfGrammar, EbnfGrammar, GrammarElement, GrammarTerm, SYNTHETIC_PREFIX};
use crate::token::{TokenKind, KEYWORDS, OPERATORS};

/// Resolves a grammar-file string literal (e.g. `"NUMBER"`, `"+"`, `"if"`)
/// to the [`TokenKind`] it names.
pub fn terminal_kind(literal: &str) -> Result<TokenKind, GrammarError> {
    use TokenKind::*;
    let class = match literal {
        "EOF" => Some(Eof),
        "IDENTIFIER" => Some(Identifier),
        "STRING" => Some(String),
        "NUMBER" => Some(Number),
        "COMMENT" => Some(Comment),
        "WHITESPACE" => Some(Whitespace),
        "NEWLINE" => Some(Newline),
        _ => None,
    };
    if let Some(kind) = class {
        return Ok(kind);
    }
    for (spelling, kind) in OPERATORS.iter().chain(KEYWORDS.iter()) {
        if *spelling == literal {
            return Ok(*kind);
        }
    }
    Err(GrammarError::UnknownTerminal {
        literal: literal.to_string(),
    })
}

struct Lowerer {
    rules: HashMap<String, Vec<Vec<GrammarElement>>>,
    synthetic_count: usize,
}

impl Lowerer {
    fn fresh_name(&mut self) -> String {
        let name = format!("{}{}", SYNTHETIC_PREFIX, self.synthetic_count);
        self.synthetic_count += 1;
        name
    }

    /// Splits `body` on top-level `Alt` markers and lowers each path into
    /// one alternative of `name`, skipping any empty path.
    fn process_or(&mut self, name: &str, body: &[GrammarTerm]) -> Result<(), GrammarError> {
        let mut alternatives: Vec<Vec<GrammarElement>> = Vec::new();
        for path in body.split(|t| matches!(t, GrammarTerm::Alt)) {
            if path.is_empty() {
                continue;
            }
            let mut elements = Vec::new();
            for term in path {
                self.process_term(term, &mut elements)?;
            }
            alternatives.push(elements);
        }
        self.rules.entry(name.to_string()).or_default().extend(alternatives);
        Ok(())
    }

    /// Lowers one EBNF term, appending the resulting element(s) to `out`.
    fn process_term(
        &mut self,
        term: &GrammarTerm,
        out: &mut Vec<GrammarElement>,
    ) -> Result<(), GrammarError> {
        match term {
            GrammarTerm::Terminal(lit) => {
                out.push(GrammarElement::Terminal(terminal_kind(lit)?));
                Ok(())
            }
            GrammarTerm::Nonterminal(name) => {
                out.push(GrammarElement::Nonterminal(name.clone()));
                Ok(())
            }
            GrammarTerm::Alt => Err(GrammarError::InvalidGrammar {
                reason: "'|' cannot appear inside a term".into(),
                pos: crate::position::Position::default(),
            }),
            GrammarTerm::Group(inner) => {
                let synth = self.fresh_name();
                self.process_or(&synth, inner)?;
                out.push(GrammarElement::Nonterminal(synth));
                Ok(())
            }
            GrammarTerm::Star(inner) => {
                // synth -> inner synth | <epsilon>
                let synth = self.fresh_name();
                let mut rep = Vec::new();
                self.process_term(inner, &mut rep)?;
                rep.push(GrammarElement::Nonterminal(synth.clone()));
                self.rules
                    .entry(synth.clone())
                    .or_default()
                    .push(rep);
                self.rules.entry(synth.clone()).or_default().push(Vec::new());
                out.push(GrammarElement::Nonterminal(synth));
                Ok(())
            }
            GrammarTerm::Plus(inner) => {
                // synth -> inner synth_star
                // synth_star -> inner synth_star | <epsilon>
                let star_synth = self.fresh_name();
                let mut star_rep = Vec::new();
                self.process_term(inner, &mut star_rep)?;
                star_rep.push(GrammarElement::Nonterminal(star_synth.clone()));
                self.rules.entry(star_synth.clone()).or_default().push(star_rep);
                self.rules.entry(star_synth.clone()).or_default().push(Vec::new());

                let mut lead = Vec::new();
                self.process_term(inner, &mut lead)?;
                lead.push(GrammarElement::Nonterminal(star_synth));
                out.extend(lead);
                Ok(())
            }
        }
    }
}

/// Lowers a parsed EBNF grammar into BNF.
pub fn lower_to_bnf(grammar: EbnfGrammar) -> Result<BnfGrammar, GrammarError> {
    let start = grammar
        .start_symbol()
        .ok_or_else(|| GrammarError::InvalidGrammar {
            reason: "grammar has no rules".into(),
            pos: crate::position::Position::default(),
        })?
        .to_string();

    let mut lowerer = Lowerer {
        rules: HashMap::new(),
        synthetic_count: 0,
    };
    for (name, body) in grammar.iter() {
        if is_synthetic(name) {
            return Err(GrammarError::InvalidGrammar {
                reason: format!("nonterminal '{}' uses the reserved synthetic prefix", name),
                pos: crate::position::Position::default(),
            });
        }
        lowerer.process_or(name, body)?;
    }

    Ok(BnfGrammar {
        start,
        rules: lowerer.rules,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::term::parse_grammar_file;

    fn lower(src: &str) -> BnfGrammar {
        lower_to_bnf(parse_grammar_file(src).unwrap()).unwrap()
    }

    #[test]
    fn terminal_resolves_class_and_literal() {
        assert_eq!(terminal_kind("NUMBER").unwrap(), TokenKind::Number);
        assert_eq!(terminal_kind("+").unwrap(), TokenKind::Plus);
        assert_eq!(terminal_kind("if").unwrap(), TokenKind::If);
        assert!(terminal_kind("nonsense").is_err());
    }

    #[test]
    fn plain_rule_lowers_unchanged() {
        let bnf = lower("expr -> \"NUMBER\" \"+\" \"NUMBER\"\n");
        let alts = bnf.get("expr").unwrap();
        assert_eq!(alts.len(), 1);
        assert_eq!(alts[0].len(), 3);
    }

    #[test]
    fn or_produces_one_alternative_per_path() {
        let bnf = lower("expr -> \"NUMBER\" or \"STRING\"\n");
        let alts = bnf.get("expr").unwrap();
        assert_eq!(alts.len(), 2);
    }

    #[test]
    fn star_introduces_nullable_synthetic() {
        let bnf = lower("list -> \"NUMBER\"*\n");
        let alts = bnf.get("list").unwrap();
        assert_eq!(alts.len(), 1);
        let synth_name = match &alts[0][0] {
            GrammarElement::Nonterminal(n) => n.clone(),
            other => panic!("expected nonterminal, got {other:?}"),
        };
        let synth_alts = bnf.get(&synth_name).unwrap();
        assert_eq!(synth_alts.len(), 2);
        assert!(synth_alts.iter().any(Vec::is_empty));
    }

    #[test]
    fn plus_requires_at_least_one() {
        let bnf = lower("list -> \"NUMBER\"+\n");
        let alts = bnf.get("list").unwrap();
        assert_eq!(alts.len(), 1);
        assert_eq!(alts[0][0], GrammarElement::Terminal(TokenKind::Number));
    }

    #[test]
    fn group_introduces_synthetic_alternatives() {
        let bnf = lower("expr -> (\"NUMBER\" or \"STRING\") \"+\"\n");
        let alts = bnf.get("expr").unwrap();
        assert_eq!(alts.len(), 1);
        assert_eq!(alts[0].len(), 2);
    }
}
