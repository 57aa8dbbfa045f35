//! FIRST/FOLLOW analysis and LL(1) table construction.
//!
//! The fixed-point loops below are iterative rather than recursive: an
//! EBNF grammar can have mutually recursive nonterminals
//! (`expr -> expr "+" term`), and an iterative worklist converges on the
//! same sets without needing a visited-set recursion guard.

use std::collections::{HashMap, HashSet};
use std::fmt::{self, Display, Formatter};

use crate::error::GrammarError;
use crate::grammar::{BnfGrammar, GrammarElement};
use crate::token::TokenKind;

/// One alternative (a flat element sequence) of a production, with its
/// LL(1) table-selector set precomputed.
#[derive(Debug, Clone)]
pub struct Alternative {
    pub elements: Vec<GrammarElement>,
    /// Whether this alternative can derive the empty string.
    pub nullable: bool,
    /// The *parse-table* selector set: raw `FIRST(alternative)`, plus
    /// `FOLLOW(name)` when the alternative is nullable. A lookahead token
    /// the real lexer never produces `TokenKind::Epsilon`, so a
    /// nullable alternative can only ever be selected via its
    /// containing nonterminal's FOLLOW set; this merged set is what
    /// `StreamingParser::parse_step` tests lookahead against.
    pub first: HashSet<TokenKind>,
}

/// One nonterminal's production: its ordered list of alternatives.
#[derive(Debug, Clone)]
pub struct ProductionRule {
    pub name: String,
    pub alternatives: Vec<Alternative>,
}

/// The complete analyzed grammar: per-nonterminal production rules plus
/// their FOLLOW sets, ready to drive the predictive parser.
#[derive(Debug, Clone)]
pub struct GrammarTables {
    pub start: String,
    pub productions: HashMap<String, ProductionRule>,
    pub follow: HashMap<String, HashSet<TokenKind>>,
}

impl GrammarTables {
    pub fn get(&self, name: &str) -> Option<&ProductionRule> {
        self.productions.get(name)
    }
}

fn first_of_sequence(
    elements: &[GrammarElement],
    first_sets: &HashMap<String, HashSet<TokenKind>>,
    nullable: &HashSet<String>,
) -> (HashSet<TokenKind>, bool) {
    let mut set = HashSet::new();
    for element in elements {
        match element {
            GrammarElement::Terminal(kind) => {
                set.insert(*kind);
                return (set, false);
            }
            GrammarElement::Nonterminal(name) => {
                if let Some(first) = first_sets.get(name) {
                    set.extend(first.iter().copied());
                }
                if !nullable.contains(name) {
                    return (set, false);
                }
            }
        }
    }
    (set, true)
}

fn compute_nullable(grammar: &BnfGrammar) -> HashSet<String> {
    let mut nullable: HashSet<String> = HashSet::new();
    loop {
        let mut changed = false;
        for name in grammar.nonterminals() {
            if nullable.contains(name) {
                continue;
            }
            let alts = grammar.get(name).expect("name came from nonterminals()");
            let is_nullable = alts.iter().any(|alt| {
                alt.iter().all(|el| match el {
                    GrammarElement::Terminal(_) => false,
                    GrammarElement::Nonterminal(n) => nullable.contains(n),
                })
            });
            if is_nullable {
                nullable.insert(name.to_string());
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    nullable
}

fn compute_first_sets(
    grammar: &BnfGrammar,
    nullable: &HashSet<String>,
) -> HashMap<String, HashSet<TokenKind>> {
    let mut first_sets: HashMap<String, HashSet<TokenKind>> = grammar
        .nonterminals()
        .map(|n| (n.to_string(), HashSet::new()))
        .collect();
    loop {
        let mut changed = false;
        for name in grammar.nonterminals() {
            let alts = grammar.get(name).expect("name came from nonterminals()");
            let mut accumulated = HashSet::new();
            for alt in alts {
                let (set, _) = first_of_sequence(alt, &first_sets, nullable);
                accumulated.extend(set);
            }
            let entry = first_sets.get_mut(name).unwrap();
            let before = entry.len();
            entry.extend(accumulated);
            if entry.len() != before {
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    first_sets
}

fn compute_follow_sets(
    grammar: &BnfGrammar,
    first_sets: &HashMap<String, HashSet<TokenKind>>,
    nullable: &HashSet<String>,
) -> HashMap<String, HashSet<TokenKind>> {
    let mut follow: HashMap<String, HashSet<TokenKind>> = grammar
        .nonterminals()
        .map(|n| (n.to_string(), HashSet::new()))
        .collect();
    follow
        .entry(grammar.start.clone())
        .or_default()
        .insert(TokenKind::Eof);

    loop {
        let mut changed = false;
        for name in grammar.nonterminals() {
            let alts = grammar.get(name).expect("name came from nonterminals()");
            for alt in alts {
                for (i, element) in alt.iter().enumerate() {
                    let GrammarElement::Nonterminal(target) = element else {
                        continue;
                    };
                    let (rest_first, rest_nullable) =
                        first_of_sequence(&alt[i + 1..], first_sets, nullable);

                    let addition: HashSet<TokenKind> = if rest_nullable {
                        let mut set = rest_first;
                        set.extend(follow.get(name).cloned().unwrap_or_default());
                        set
                    } else {
                        rest_first
                    };

                    let entry = follow.entry(target.clone()).or_default();
                    let before = entry.len();
                    entry.extend(addition);
                    if entry.len() != before {
                        changed = true;
                    }
                }
            }
        }
        if !changed {
            break;
        }
    }
    follow
}

/// Checks that `name`'s alternatives are pairwise disjoint in raw FIRST,
/// have at most one nullable alternative, and (if one is nullable) that
/// its FOLLOW set doesn't collide with any sibling's FIRST.
fn validate_ll1(
    name: &str,
    raw_firsts: &[HashSet<TokenKind>],
    nullable_flags: &[bool],
    follow_set: &HashSet<TokenKind>,
) -> Result<(), GrammarError> {
    for i in 0..raw_firsts.len() {
        for j in (i + 1)..raw_firsts.len() {
            if !raw_firsts[i].is_disjoint(&raw_firsts[j]) {
                return Err(GrammarError::GrammarNotLL1 {
                    nonterminal: name.to_string(),
                });
            }
        }
    }

    let nullable_count = nullable_flags.iter().filter(|n| **n).count();
    if nullable_count > 1 {
        return Err(GrammarError::GrammarNotLL1 {
            nonterminal: name.to_string(),
        });
    }
    if nullable_count == 1 {
        for (i, first) in raw_firsts.iter().enumerate() {
            if nullable_flags[i] {
                continue;
            }
            if !first.is_disjoint(follow_set) {
                return Err(GrammarError::GrammarNotLL1 {
                    nonterminal: name.to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Runs FIRST/FOLLOW analysis over a lowered BNF grammar and validates
/// LL(1)-ness, producing the tables the streaming parser parses against.
pub fn analyze(grammar: &BnfGrammar) -> Result<GrammarTables, GrammarError> {
    let nullable = compute_nullable(grammar);
    let first_sets = compute_first_sets(grammar, &nullable);
    let follow_sets = compute_follow_sets(grammar, &first_sets, &nullable);

    let mut productions = HashMap::new();
    for name in grammar.nonterminals() {
        let alts = grammar.get(name).expect("name came from nonterminals()");
        let follow_set = follow_sets.get(name).cloned().unwrap_or_default();

        let mut raw_firsts = Vec::with_capacity(alts.len());
        let mut nullable_flags = Vec::with_capacity(alts.len());
        for alt in alts {
            let (set, is_nullable) = first_of_sequence(alt, &first_sets, &nullable);
            raw_firsts.push(set);
            nullable_flags.push(is_nullable);
        }

        validate_ll1(name, &raw_firsts, &nullable_flags, &follow_set)?;

        let alternatives = alts
            .iter()
            .zip(raw_firsts.into_iter())
            .zip(nullable_flags.into_iter())
            .map(|((elements, raw_first), is_nullable)| {
                let mut table_first = raw_first;
                if is_nullable {
                    table_first.extend(follow_set.iter().copied());
                }
                Alternative {
                    elements: elements.clone(),
                    nullable: is_nullable,
                    first: table_first,
                }
            })
            .collect();

        productions.insert(
            name.to_string(),
            ProductionRule {
                name: name.to_string(),
                alternatives,
            },
        );
    }

    Ok(GrammarTables {
        start: grammar.start.clone(),
        productions,
        follow: follow_sets,
    })
}

impl Display for GrammarTables {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.productions.keys().collect();
        names.sort();
        for name in names {
            let rule = &self.productions[name];
            writeln!(f, "{} ::=", name)?;
            for alt in &rule.alternatives {
                let body = if alt.elements.is_empty() {
                    "<epsilon>".to_string()
                } else {
                    alt.elements
                        .iter()
                        .map(|el| match el {
                            GrammarElement::Terminal(k) => k.name().to_string(),
                            GrammarElement::Nonterminal(n) => n.clone(),
                        })
                        .collect::<Vec<_>>()
                        .join(" ")
                };
                let firsts: Vec<&str> = {
                    let mut v: Vec<&str> = alt.first.iter().map(|k| k.name()).collect();
                    v.sort();
                    v
                };
                writeln!(f, "    | {}    {{ first: {} }}", body, firsts.join(", "))?;
            }
        }
        Ok(())
    }
}
