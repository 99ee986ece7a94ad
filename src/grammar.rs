//! Grammar tables consumed by the parser.
//!
//! Lexical categories are registered as plain/markedup string pairs and kept
//! as parsed, variable-renumbered [`Category`] values whose slot numbers have
//! been replaced by global relation ids. Unary rules (type-changing,
//! type-raising and the two comma type-changes) are pairs of markedup
//! categories sharing variable names.

use std::collections::{HashMap, HashSet};
use std::hash::BuildHasherDefault;
use std::sync::Arc;

use bimap::BiMap;
use lazy_static::lazy_static;
use seahash::SeaHasher;
use tracing::debug;

use crate::category::{Category, RelId, VarId};
use crate::error::{CcgError, Result};
use crate::markedup::parse_category;
use crate::rules::RuleKind;

type SeaBuild = BuildHasherDefault<SeaHasher>;

// ------------- UnaryRule -------------
#[derive(Debug, Clone)]
pub struct UnaryRule {
    pub from: Arc<Category>,
    pub to: Arc<Category>,
    pub kind: RuleKind,
}

lazy_static! {
    /// Markedup lexical categories of the standard English core.
    static ref STANDARD_CATEGORIES: Vec<(&'static str, &'static str)> = vec![
        ("N", "N{_}"),
        ("NP", "NP{_}"),
        ("PP", "PP{_}"),
        ("conj", "conj{_}"),
        (",", ",{_}"),
        (".", ".{_}"),
        (":", ":{_}"),
        (";", ";{_}"),
        ("LRB", "LRB{_}"),
        ("RRB", "RRB{_}"),
        ("LQU", "LQU{_}"),
        ("RQU", "RQU{_}"),
        ("NP/N", "(NP{Y}/N{Y}<1>){_}"),
        ("N/N", "(N{Y}/N{Y}<1>){_}"),
        ("NP\\NP", "(NP{Y}\\NP{Y}<1>){_}"),
        ("(NP\\NP)/NP", "((NP{Y}\\NP{Y}<1>){_}/NP{Z}<2>){_}"),
        ("PP/NP", "(PP{_}/NP{Y}<1>){_}"),
        ("S[dcl]\\NP", "(S[dcl]{_}\\NP{Y}<1>){_}"),
        ("S[b]\\NP", "(S[b]{_}\\NP{Y}<1>){_}"),
        ("S[ng]\\NP", "(S[ng]{_}\\NP{Y}<1>){_}"),
        ("S[pss]\\NP", "(S[pss]{_}\\NP{Y}<1>){_}"),
        ("S[adj]\\NP", "(S[adj]{_}\\NP{Y}<1>){_}"),
        ("(S[dcl]\\NP)/NP", "((S[dcl]{_}\\NP{Y}<1>){_}/NP{Z}<2>){_}"),
        ("(S[b]\\NP)/NP", "((S[b]{_}\\NP{Y}<1>){_}/NP{Z}<2>){_}"),
        ("(S[ng]\\NP)/NP", "((S[ng]{_}\\NP{Y}<1>){_}/NP{Z}<2>){_}"),
        ("(S[dcl]\\NP)/PP", "((S[dcl]{_}\\NP{Y}<1>){_}/PP{Z}<2>){_}"),
        ("((S[dcl]\\NP)/PP)/NP", "(((S[dcl]{_}\\NP{Y}<1>){_}/PP{W}<3>){_}/NP{Z}<2>){_}"),
        ("(S[dcl]\\NP)/S[dcl]", "((S[dcl]{_}\\NP{Y}<1>){_}/S[dcl]{Z}<2>){_}"),
        ("(S[dcl]\\NP)/(S[b]\\NP)", "((S[dcl]{_}\\NP{Y}<1>){_}/(S[b]{Z}<2>\\NP{Y*}){Z}){_}"),
        ("(S[dcl]\\NP)/(S[adj]\\NP)", "((S[dcl]{_}\\NP{Y}<1>){_}/(S[adj]{Z}<2>\\NP{Y*}){Z}){_}"),
        ("(S[to]\\NP)/(S[b]\\NP)", "((S[to]{_}\\NP{Z}){_}/(S[b]{Y}<1>\\NP{Z*}){Y}){_}"),
        ("(S[dcl]\\S[dcl])\\NP", "((S[dcl]{_}\\S[dcl]{Y}<2>){_}\\NP{Z}<1>){_}"),
        ("(S\\NP)\\(S\\NP)", "((S[X]{Y}\\NP{Z}){Y}\\(S[X]{Y}<1>\\NP{Z}){Y}){_}"),
        ("(S\\NP)/(S\\NP)", "((S[X]{Y}\\NP{Z}){Y}/(S[X]{Y}<1>\\NP{Z}){Y}){_}"),
        ("((S\\NP)\\(S\\NP))/NP", "(((S[X]{Y}\\NP{Z}){Y}\\(S[X]{Y}<1>\\NP{Z}){Y}){_}/NP{W}<2>){_}"),
        ("S[X]/S[X]", "(S[X]{Y}/S[X]{Y}<1>){_}"),
        ("S\\S", "(S[X]{Y}\\S[X]{Y}<1>){_}"),
        ("(NP\\NP)/(S[dcl]\\NP)", "((NP{Y}\\NP{Y}<1>){_}/(S[dcl]{Z}<2>\\NP{Y}){Z}){_}"),
        ("(NP\\NP)/(S[dcl]/NP)", "((NP{Y}\\NP{Y}<1>){_}/(S[dcl]{Z}<2>/NP{Y}){Z}){_}"),
    ];

    /// `(kind, from, to)` unary rules of the standard English core.
    static ref STANDARD_UNARY_RULES: Vec<(RuleKind, &'static str, &'static str)> = vec![
        (RuleKind::TypeChange, "N{_}", "NP{_}"),
        (RuleKind::TypeChange, "(S[pss]{_}\\NP{Y}){_}", "(NP{Y}\\NP{Y}){_}"),
        (RuleKind::TypeChange, "(S[ng]{_}\\NP{Y}){_}", "(NP{Y}\\NP{Y}){_}"),
        (RuleKind::TypeChange, "(S[adj]{_}\\NP{Y}){_}", "(NP{Y}\\NP{Y}){_}"),
        (RuleKind::TypeChange, "(S[to]{_}\\NP{Y}){_}", "(NP{Y}\\NP{Y}){_}"),
        (RuleKind::TypeChange, "(S[dcl]{_}/NP{Y}){_}", "(NP{Y}\\NP{Y}){_}"),
        (RuleKind::TypeChange, "(S[ng]{_}\\NP{Y}){_}", "((S[X]{Z}\\NP{Y}){Z}\\(S[X]{Z}<1>\\NP{Y}){Z}){_}"),
        (RuleKind::TypeRaise, "NP{_}", "(S[X]{Y}/(S[X]{Y}\\NP{_}){Y}){Y}"),
        (RuleKind::TypeRaise, "NP{_}", "((S[X]{Y}\\NP{Z}){Y}\\((S[X]{Y}\\NP{Z}){Y}/NP{_}){Y}){Y}"),
        (RuleKind::TypeRaise, "PP{_}", "((S[X]{Y}\\NP{Z}){Y}\\((S[X]{Y}\\NP{Z}){Y}/PP{_}){Y}){Y}"),
        (RuleKind::LeftCommaTypeChange, "NP{_}", "((S[X]{Y}\\NP{Z}){Y}\\(S[X]{Y}<1>\\NP{Z}){Y}){_}"),
        (RuleKind::RightCommaTypeChange, "S[dcl]{_}", "(S[X]{Y}/S[X]{Y}<1>){_}"),
    ];
}

// ------------- Grammar -------------
#[derive(Debug, Default)]
pub struct Grammar {
    /// plain category string <-> markedup category string
    markedup: BiMap<String, String>,
    categories: HashMap<String, Arc<Category>, SeaBuild>,
    /// (plain category, slot number) <-> relation id
    relations: BiMap<(String, u32), RelId>,
    type_changes: Vec<UnaryRule>,
    type_raises: Vec<UnaryRule>,
    left_comma: Vec<UnaryRule>,
    right_comma: Vec<UnaryRule>,
    seen: Option<HashSet<(u64, u64), SeaBuild>>,
}

fn plain_key(text: &str) -> Result<String> {
    Ok(parse_category(text)?.to_string())
}

impl Grammar {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in English core: common lexical categories plus the usual
    /// type-raising and type-changing rules.
    pub fn standard() -> Result<Self> {
        let mut grammar = Self::new();
        for (plain, markedup) in STANDARD_CATEGORIES.iter() {
            grammar.add_category(plain, markedup)?;
        }
        for (kind, from, to) in STANDARD_UNARY_RULES.iter() {
            grammar.add_unary_rule(*kind, from, to)?;
        }
        debug!(
            categories = grammar.num_categories(),
            relations = grammar.num_relations(),
            "standard grammar loaded"
        );
        Ok(grammar)
    }

    fn intern_relation(relations: &mut BiMap<(String, u32), RelId>, plain: &str, slot: u32) -> RelId {
        let key = (plain.to_string(), slot);
        if let Some(rel) = relations.get_by_left(&key) {
            return *rel;
        }
        let rel = relations.len() as RelId + 1;
        relations.insert(key, rel);
        rel
    }

    /// Registers a lexical category. The markedup form must have the same
    /// shape as the plain one and carry the head variable on its outside.
    pub fn add_category(&mut self, plain: &str, markedup: &str) -> Result<Arc<Category>> {
        let key = plain_key(plain)?;
        let parsed = parse_category(markedup)?;
        if parsed.to_string() != key {
            return Err(CcgError::grammar(format!(
                "markedup category {} does not match {}",
                markedup, key
            )));
        }
        if parsed.var() != VarId::HEAD {
            return Err(CcgError::grammar(format!(
                "markedup category {} is not headed by its lexical item",
                markedup
            )));
        }
        let (cat, _) = parsed.reorder();
        let relations = &mut self.relations;
        let cat = Arc::new(cat.map_relations(&mut |slot| Self::intern_relation(relations, &key, slot)));
        self.markedup.insert(key.clone(), markedup.to_string());
        self.categories.insert(key, cat.clone());
        Ok(cat)
    }

    /// Registers a plain category with an automatic markup: the outer
    /// variable is the head, every argument gets a fresh variable and no
    /// dependencies are created.
    pub fn add_plain(&mut self, plain: &str) -> Result<Arc<Category>> {
        let parsed = parse_category(plain)?;
        let mut next = VarId::HEAD.0;
        let cat = auto_markup(&parsed, VarId::HEAD, &mut next)?;
        let markedup = cat.markedup().to_string();
        self.add_category(plain, &markedup)
    }

    pub fn add_unary_rule(&mut self, kind: RuleKind, from: &str, to: &str) -> Result<()> {
        let from = parse_category(from)?;
        let to = parse_category(to)?;
        let key = to.to_string();
        let relations = &mut self.relations;
        let to = to.map_relations(&mut |slot| Self::intern_relation(relations, &key, slot));
        let rule = UnaryRule { from: Arc::new(from), to: Arc::new(to), kind };
        match kind {
            RuleKind::TypeChange => self.type_changes.push(rule),
            RuleKind::TypeRaise => self.type_raises.push(rule),
            RuleKind::LeftCommaTypeChange => self.left_comma.push(rule),
            RuleKind::RightCommaTypeChange => self.right_comma.push(rule),
            other => {
                return Err(CcgError::grammar(format!("{} is not a unary rule", other)));
            }
        }
        Ok(())
    }

    /// Restricts binary combination to category pairs registered here.
    pub fn allow_rule(&mut self, left: &str, right: &str) -> Result<()> {
        let l = parse_category(left)?.ehash();
        let r = parse_category(right)?.ehash();
        self.seen.get_or_insert_with(HashSet::default).insert((l, r));
        Ok(())
    }

    /// Always true while no rule has been registered with `allow_rule`.
    pub fn is_seen(&self, left: &Category, right: &Category) -> bool {
        match &self.seen {
            Some(seen) => seen.contains(&(left.ehash(), right.ehash())),
            None => true,
        }
    }

    /// Lexical category for a plain category string.
    pub fn lexical(&self, plain: &str) -> Option<Arc<Category>> {
        if let Some(cat) = self.categories.get(plain) {
            return Some(cat.clone());
        }
        let key = plain_key(plain).ok()?;
        self.categories.get(&key).cloned()
    }

    pub fn markedup(&self, plain: &str) -> Option<&str> {
        self.markedup.get_by_left(plain).map(|s| s.as_str())
    }
    pub fn plain(&self, markedup: &str) -> Option<&str> {
        self.markedup.get_by_right(markedup).map(|s| s.as_str())
    }
    /// Relation id of a slot; `plain` need not be in canonical form.
    pub fn relation(&self, plain: &str, slot: u32) -> Option<RelId> {
        if let Some(rel) = self.relations.get_by_left(&(plain.to_string(), slot)) {
            return Some(*rel);
        }
        let key = plain_key(plain).ok()?;
        self.relations.get_by_left(&(key, slot)).copied()
    }
    /// Plain category and slot number a relation id stands for.
    pub fn slot(&self, rel: RelId) -> Option<(&str, u32)> {
        self.relations.get_by_right(&rel).map(|(p, s)| (p.as_str(), *s))
    }

    pub fn type_changes(&self) -> &[UnaryRule] {
        &self.type_changes
    }
    pub fn type_raises(&self) -> &[UnaryRule] {
        &self.type_raises
    }
    pub fn left_comma_rules(&self) -> &[UnaryRule] {
        &self.left_comma
    }
    pub fn right_comma_rules(&self) -> &[UnaryRule] {
        &self.right_comma
    }
    pub fn num_categories(&self) -> usize {
        self.categories.len()
    }
    pub fn num_relations(&self) -> usize {
        self.relations.len()
    }
}

fn auto_markup(cat: &Category, head: VarId, next: &mut u8) -> Result<Category> {
    match (cat.result(), cat.slash(), cat.argument()) {
        (Some(result), Some(slash), Some(argument)) => {
            let result = auto_markup(result, head, next)?;
            *next += 1;
            if *next as usize >= VarId::MAX {
                return Err(CcgError::grammar(format!("too many arguments in {}", cat)));
            }
            let argument = auto_markup(argument, VarId(*next), next)?;
            Ok(Category::complex(Arc::new(result), slash, Arc::new(argument), head, 0, VarId::NONE))
        }
        _ => Ok(Category::basic(cat.atom(), cat.feature(), head, 0, VarId::NONE)),
    }
}
