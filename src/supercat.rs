//! Chart nodes.
//!
//! A [`SuperCategory`] is a category together with the state future
//! combinations depend on: the fillers bound to each of its variables and the
//! dependencies still waiting for a filler. Nodes are immutable once built
//! and live in the chart's arena, addressed by [`NodeId`]; children are ids of
//! nodes in smaller spans.

use std::fmt;
use std::hash::Hasher;
use std::sync::Arc;

use seahash::SeaHasher;
use serde::Serialize;

use crate::category::{empty_var_map, Category, Feature, VarId};
use crate::dependency::{sort_dependencies, Dependency, FilledDependency};
use crate::error::{CcgError, Result};
use crate::rules::RuleKind;
use crate::variable::{Position, Variable};

// ------------- NodeId -------------
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A node taking part in a combination, with its arena id.
#[derive(Clone, Copy)]
pub struct Child<'a> {
    pub id: NodeId,
    pub node: &'a SuperCategory,
}

impl<'a> Child<'a> {
    pub fn new(id: NodeId, node: &'a SuperCategory) -> Self {
        Self { id, node }
    }
}

// ------------- Flags -------------
pub const LEXICAL: u8 = 1;
/// `X[conj]`: a conjunction (or comma) followed by its right conjunct.
pub const CONJ: u8 = 1 << 1;
pub const COMMA_CONJ: u8 = 1 << 2;
pub const TYPE_RAISED: u8 = 1 << 3;
pub const TYPE_CHANGED: u8 = 1 << 4;
pub const COORDINATED: u8 = 1 << 5;
pub const UNARY: u8 = TYPE_RAISED | TYPE_CHANGED;
const EQUIVALENCE_MASK: u8 = CONJ | COMMA_CONJ | UNARY;

// ------------- SuperCategory -------------
#[derive(Debug, Clone)]
pub struct SuperCategory {
    pub cat: Arc<Category>,
    vars: Vec<Variable>,
    num_active: usize,
    unfilled: Vec<Dependency>,
    filled: Vec<FilledDependency>,
    left: Option<NodeId>,
    right: Option<NodeId>,
    rule: RuleKind,
    flags: u8,
    dep_total: u32,
    ehash: u64,
}

impl SuperCategory {
    /// Leaf for the word at `position`. The category's outer variable must be
    /// the head variable.
    pub fn lexical(cat: Arc<Category>, position: Position) -> Result<SuperCategory> {
        if cat.var() != VarId::HEAD {
            return Err(CcgError::invariant(format!(
                "lexical category {} has no head variable",
                cat.markedup()
            )));
        }
        let mut vars = vec![Variable::new(); cat.max_var().index() + 1];
        vars[VarId::HEAD.index()] = Variable::filled(position);
        let deps = Dependency::from_category(&cat, position, RuleKind::Lexical);
        Draft {
            cat: (*cat).clone(),
            vars,
            deps,
            rule: RuleKind::Lexical,
            flags: LEXICAL,
            left: None,
            right: None,
            child_deps: 0,
        }
        .finish()
    }

    pub fn vars(&self) -> &[Variable] {
        &self.vars
    }
    pub fn var(&self, var: VarId) -> Variable {
        self.vars.get(var.index()).copied().unwrap_or_default()
    }
    /// Variables appearing in the category; the rest only carry unfilled
    /// dependencies.
    pub fn num_active_vars(&self) -> usize {
        self.num_active
    }
    pub fn num_vars(&self) -> usize {
        self.vars.len().saturating_sub(1)
    }
    pub fn unfilled(&self) -> &[Dependency] {
        &self.unfilled
    }
    /// Dependencies filled by the rule that built this node.
    pub fn filled(&self) -> &[FilledDependency] {
        &self.filled
    }
    pub fn left(&self) -> Option<NodeId> {
        self.left
    }
    pub fn right(&self) -> Option<NodeId> {
        self.right
    }
    pub fn children(&self) -> impl Iterator<Item = NodeId> {
        self.left.into_iter().chain(self.right)
    }
    pub fn rule(&self) -> RuleKind {
        self.rule
    }
    pub fn flags(&self) -> u8 {
        self.flags
    }
    pub fn ehash(&self) -> u64 {
        self.ehash
    }
    /// Filled dependencies in the whole subtree below and including this node.
    pub fn dep_total(&self) -> u32 {
        self.dep_total
    }

    pub fn is_lexical(&self) -> bool {
        self.flags & LEXICAL != 0
    }
    pub fn is_conj_marked(&self) -> bool {
        self.flags & CONJ != 0
    }
    pub fn is_comma_conj(&self) -> bool {
        self.flags & COMMA_CONJ != 0
    }
    pub fn is_type_raised(&self) -> bool {
        self.flags & TYPE_RAISED != 0
    }
    pub fn is_type_changed(&self) -> bool {
        self.flags & TYPE_CHANGED != 0
    }
    pub fn is_unary(&self) -> bool {
        self.flags & UNARY != 0
    }

    /// Word positions bound to the category's outer variable.
    pub fn heads(&self) -> Variable {
        self.var(self.cat.var())
    }

    /// True when the two nodes are interchangeable for every future
    /// combination.
    pub fn equivalent(&self, other: &SuperCategory) -> bool {
        self.ehash == other.ehash
            && self.flags & EQUIVALENCE_MASK == other.flags & EQUIVALENCE_MASK
            && self.num_active == other.num_active
            && self.cat.same_vars(&other.cat)
            && self.vars[1..=self.num_active] == other.vars[1..=other.num_active]
            && self.unfilled == other.unfilled
    }

    fn compute_ehash(&self) -> u64 {
        let mut hasher = SeaHasher::default();
        hasher.write_u64(self.cat.ehash());
        hasher.write_u8(self.flags & EQUIVALENCE_MASK);
        for dep in &self.unfilled {
            hasher.write_u32(dep.rel);
        }
        for var in &self.vars[1..=self.num_active] {
            for filler in var.fillers() {
                hasher.write_u16(filler);
            }
            hasher.write_u16(0);
        }
        hasher.finish()
    }
}

impl fmt::Display for SuperCategory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} [{}]", self.cat, self.rule)?;
        if self.is_conj_marked() {
            write!(f, "[conj]")?;
        }
        Ok(())
    }
}

// ------------- Draft -------------
/// A node under construction: translated category, merged variables and
/// translated dependencies of the children. `finish` fills what can be filled
/// and renumbers the variables.
pub(crate) struct Draft {
    pub cat: Category,
    pub vars: Vec<Variable>,
    pub deps: Vec<Dependency>,
    pub rule: RuleKind,
    pub flags: u8,
    pub left: Option<NodeId>,
    pub right: Option<NodeId>,
    pub child_deps: u32,
}

impl Draft {
    pub fn finish(self) -> Result<SuperCategory> {
        let Draft { cat, vars, deps, rule, flags, left, right, child_deps } = self;

        let mut filled = Vec::new();
        let mut waiting = Vec::with_capacity(deps.len());
        for dep in deps {
            if dep.var.is_none() {
                continue;
            }
            let var = vars.get(dep.var.index()).copied().unwrap_or_default();
            if var.is_filled() {
                filled.extend(dep.fill(&var, rule));
            } else {
                waiting.push(dep);
            }
        }

        // active variables first, in category order, then the ones only
        // unfilled dependencies still point at
        let mut order = Vec::with_capacity(VarId::MAX);
        cat.vars_in_order(&mut order);
        let num_active = order.len();
        for dep in &waiting {
            for v in [dep.var, dep.lrange] {
                if !v.is_none() && !order.contains(&v) {
                    order.push(v);
                }
            }
        }
        if order.len() >= VarId::MAX {
            return Err(CcgError::invariant(format!(
                "{} variables needed for {}, capacity is {}",
                order.len(),
                cat,
                VarId::MAX - 1
            )));
        }
        let mut trans = empty_var_map();
        let mut renumbered = vec![Variable::new(); order.len() + 1];
        for (i, v) in order.iter().enumerate() {
            trans[v.index()] = VarId(i as u8 + 1);
            renumbered[i + 1] = vars.get(v.index()).copied().unwrap_or_default();
        }
        let cat = cat.translate(&trans, Feature::None);
        let mut unfilled: Vec<Dependency> = waiting.iter().map(|d| d.translate(&trans)).collect();
        sort_dependencies(&mut unfilled);
        filled.sort_unstable();
        filled.dedup();

        let dep_total = child_deps + filled.len() as u32;
        let mut sc = SuperCategory {
            cat: Arc::new(cat),
            vars: renumbered,
            num_active,
            unfilled,
            filled,
            left,
            right,
            rule,
            flags,
            dep_total,
            ehash: 0,
        };
        sc.ehash = sc.compute_ehash();
        Ok(sc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markedup::parse_category;

    fn lex(markedup: &str, position: Position) -> SuperCategory {
        let (cat, _) = parse_category(markedup).unwrap().reorder();
        SuperCategory::lexical(Arc::new(cat), position).unwrap()
    }

    #[test]
    fn lexical_node_binds_head_and_keeps_slots_open() {
        let sc = lex(r"((S[dcl]{_}\NP{Y}<1>){_}/NP{Z}<2>){_}", 2);
        assert_eq!(sc.heads(), Variable::filled(2));
        assert_eq!(sc.unfilled().len(), 2);
        assert!(sc.filled().is_empty());
        assert_eq!(sc.num_active_vars(), 3);
        assert!(sc.is_lexical());
    }

    #[test]
    fn same_word_same_category_is_equivalent() {
        let a = lex(r"(NP{Y}/N{Y}<1>){_}", 1);
        let b = lex(r"(NP{Y}/N{Y}<1>){_}", 1);
        let c = lex(r"(NP{Y}/N{Y}<1>){_}", 2);
        assert!(a.equivalent(&b));
        assert_eq!(a.ehash(), b.ehash());
        assert!(!a.equivalent(&c));
    }

    #[test]
    fn rejects_category_without_head() {
        let cat = parse_category(r"(NP{Y}/N{Y}<1>){Y}").unwrap();
        assert!(SuperCategory::lexical(Arc::new(cat), 1).is_err());
    }
}
