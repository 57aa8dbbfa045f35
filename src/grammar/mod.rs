//! Grammar pipeline: a user-authored EBNF grammar file is parsed (see
//! [`term`]), lowered to BNF by introducing synthetic nonterminals for
//! iteration and grouping (see [`lower`]), then analyzed for
//! per-production FIRST/FOLLOW tables suitable for LL(1) parsing (see
//! [`analysis`]).

pub mod analysis;
pub mod lower;
pub mod term;

use std::collections::HashMap;

use crate::token::TokenKind;

/// The reserved namespace for nonterminals introduced by lowering.
/// Disjoint from every name the grammar-file tokenizer (reusing the Lox
/// `Identifier` class) can ever produce, since `$` is not an identifier
/// character.
pub const SYNTHETIC_PREFIX: &str = "$syn_";

pub fn is_synthetic(name: &str) -> bool {
    name.starts_with(SYNTHETIC_PREFIX)
}

/// One EBNF grammar term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarTerm {
    Terminal(String),
    Nonterminal(String),
    /// The `|` alternation marker; only ever appears as a top-level
    /// element of a rule body or bracket contents, never nested inside
    /// `Star`/`Plus`/`Group`.
    Alt,
    Star(Box<GrammarTerm>),
    Plus(Box<GrammarTerm>),
    Group(Vec<GrammarTerm>),
}

/// An EBNF grammar: an insertion-ordered mapping from nonterminal name to
/// its (possibly `Alt`-separated) body. The first rule parsed from the
/// grammar file is the start symbol.
#[derive(Debug, Clone, Default)]
pub struct EbnfGrammar {
    order: Vec<String>,
    rules: HashMap<String, Vec<GrammarTerm>>,
}

impl EbnfGrammar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites a rule. Overwriting an existing name does not
    /// change its position in iteration order.
    pub fn insert(&mut self, name: String, body: Vec<GrammarTerm>) {
        if !self.rules.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.rules.insert(name, body);
    }

    pub fn start_symbol(&self) -> Option<&str> {
        self.order.first().map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Option<&[GrammarTerm]> {
        self.rules.get(name).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[GrammarTerm])> {
        self.order
            .iter()
            .map(|name| (name.as_str(), self.rules[name].as_slice()))
    }
}

/// One BNF grammar element: either a terminal token kind or a reference to
/// another nonterminal by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GrammarElement {
    Terminal(TokenKind),
    Nonterminal(String),
}

/// A lowered BNF grammar: nonterminal name to ordered alternatives, each a
/// flat element sequence, plus the inherited start symbol.
#[derive(Debug, Clone)]
pub struct BnfGrammar {
    pub start: String,
    pub rules: HashMap<String, Vec<Vec<GrammarElement>>>,
}

impl BnfGrammar {
    pub fn get(&self, name: &str) -> Option<&Vec<Vec<GrammarElement>>> {
        self.rules.get(name)
    }

    pub fn nonterminals(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }
}
