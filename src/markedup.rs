//! Parsing of (markedup) category strings.
//!
//! The notation follows the markedup files: `[feature]` after an atom,
//! `{V}` for a variable (`{V*}` when the variable is long-range) and `<n>`
//! for a dependency slot. Slashes associate to the left, so `A/B\C` is
//! `(A/B)\C`. Slot numbers are kept in the relation field of the returned
//! category; the grammar swaps them for global relation ids.

use std::sync::Arc;

use pest::Parser;
use pest::error::InputLocation;
use pest::iterators::Pair;
use pest_derive::Parser;

use crate::category::{Atom, Category, Feature, RelId, Slash, VarId};
use crate::error::{CcgError, Result};

#[derive(Parser)]
#[grammar = "markedup.pest"]
struct MarkedupParser;

fn malformed(message: impl Into<String>) -> CcgError {
    CcgError::CategoryParse { message: message.into(), position: None }
}

pub fn parse_category(text: &str) -> Result<Category> {
    let mut pairs = MarkedupParser::parse(Rule::category, text.trim()).map_err(|e| {
        let position = match e.location {
            InputLocation::Pos(p) => p,
            InputLocation::Span((start, _)) => start,
        };
        CcgError::CategoryParse { message: e.to_string(), position: Some(position) }
    })?;
    let cat = pairs
        .next()
        .and_then(|category| category.into_inner().next())
        .ok_or_else(|| malformed(format!("empty category '{}'", text)))?;
    build_cat(cat)
}

fn build_cat(pair: Pair<Rule>) -> Result<Category> {
    let mut inner = pair.into_inner();
    let first = inner.next().ok_or_else(|| malformed("missing category term"))?;
    let mut cat = build_term(first)?;
    while let Some(slash) = inner.next() {
        let slash = match slash.as_str() {
            "/" => Slash::Fwd,
            _ => Slash::Bwd,
        };
        let term = inner.next().ok_or_else(|| malformed("slash without argument"))?;
        let argument = build_term(term)?;
        cat = Category::complex(
            Arc::new(cat),
            slash,
            Arc::new(argument),
            VarId::NONE,
            0,
            VarId::NONE,
        );
    }
    Ok(cat)
}

fn build_term(pair: Pair<Rule>) -> Result<Category> {
    let mut cat = None;
    let mut var = VarId::NONE;
    let mut lrange = VarId::NONE;
    let mut rel: RelId = 0;
    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::basic => cat = Some(build_basic(part)?),
            Rule::cat => cat = Some(build_cat(part)?),
            Rule::var => {
                for v in part.into_inner() {
                    match v.as_rule() {
                        Rule::var_name => {
                            let name = v.as_str().chars().next().unwrap_or('?');
                            var = VarId::from_name(name).ok_or_else(|| {
                                malformed(format!("unknown variable '{}'", name))
                            })?;
                        }
                        Rule::lrange => lrange = var,
                        _ => (),
                    }
                }
            }
            Rule::slot => {
                let digits = part.into_inner().as_str();
                rel = digits
                    .parse::<RelId>()
                    .map_err(|e| malformed(format!("bad slot '{}': {}", digits, e)))?;
            }
            _ => (),
        }
    }
    let cat = cat.ok_or_else(|| malformed("annotation without category"))?;
    if var.is_none() && rel == 0 {
        return Ok(cat);
    }
    Ok(cat.with_marks(var, rel, lrange))
}

fn build_basic(pair: Pair<Rule>) -> Result<Category> {
    let mut atom = Atom::None;
    let mut feature = Feature::None;
    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::atom => {
                atom = Atom::parse(part.as_str())
                    .ok_or_else(|| malformed(format!("unknown atom '{}'", part.as_str())))?;
            }
            Rule::feature => {
                let name = part.into_inner().as_str();
                feature = Feature::parse(name)
                    .ok_or_else(|| malformed(format!("unknown feature '{}'", name)))?;
            }
            _ => (),
        }
    }
    Ok(Category::atomic(atom, feature))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_transitive_verb_markup() {
        let cat = parse_category(r"((S[dcl]{_}\NP{Y}<1>){_}/NP{Z}<2>){_}").unwrap();
        assert_eq!(cat.to_string(), r"(S[dcl]\NP)/NP");
        assert_eq!(cat.var(), VarId::HEAD);
        let object = cat.argument().unwrap();
        assert_eq!(object.var(), VarId::from_name('Z').unwrap());
        assert_eq!(object.rel(), 2);
        let mut rels = Vec::new();
        cat.relations(&mut rels);
        assert_eq!(rels.len(), 2);
    }

    #[test]
    fn slashes_associate_left() {
        let cat = parse_category(r"S/NP\NP").unwrap();
        assert_eq!(cat.to_string(), r"(S/NP)\NP");
    }

    #[test]
    fn long_range_marker_sets_lrange() {
        let cat = parse_category(r"((S[dcl]{_}\NP{Y}<1>){_}/(S[b]{Z}<2>\NP{Y*}){Z}){_}").unwrap();
        let inner_np = cat.argument().unwrap().argument().unwrap();
        assert_eq!(inner_np.lrange(), inner_np.var());
    }

    #[test]
    fn rejects_unknown_atoms() {
        let err = parse_category("QP/NP").unwrap_err();
        assert!(matches!(err, CcgError::CategoryParse { .. }));
    }
}
