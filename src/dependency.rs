//! Predicate-argument dependencies.
//!
//! An unfilled [`Dependency`] waits on a category variable; once that
//! variable is bound to word positions it turns into one
//! [`FilledDependency`] per filler.

use std::fmt;

use serde::Serialize;

use crate::category::{Category, RelId, VarId, VarMap};
use crate::rules::RuleKind;
use crate::variable::{Position, Variable};

// ------------- Dependency -------------
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Dependency {
    // field order is the sort order of a dependency list
    pub var: VarId,
    pub rel: RelId,
    pub head: Position,
    pub lrange: VarId,
    pub rule: RuleKind,
}

impl Dependency {
    /// Dependencies a lexical category introduces for the word at `head`.
    pub fn from_category(cat: &Category, head: Position, rule: RuleKind) -> Vec<Dependency> {
        let mut slots = Vec::new();
        cat.relations(&mut slots);
        let mut deps: Vec<Dependency> = slots
            .into_iter()
            .map(|(var, rel, lrange)| Dependency { var, rel, head, lrange, rule })
            .collect();
        sort_dependencies(&mut deps);
        deps
    }

    pub fn translate(&self, trans: &VarMap) -> Dependency {
        Dependency {
            var: trans[self.var.index()],
            lrange: trans[self.lrange.index()],
            ..*self
        }
    }

    /// One filled dependency per filler of `var`.
    pub fn fill<'a>(
        &'a self,
        var: &'a Variable,
        rule: RuleKind,
    ) -> impl Iterator<Item = FilledDependency> + 'a {
        let conj = var.len() as u8;
        var.fillers().map(move |filler| FilledDependency {
            rel: self.rel,
            head: self.head,
            filler,
            rule,
            lrange: !self.lrange.is_none(),
            conj,
        })
    }
}

pub fn sort_dependencies(deps: &mut Vec<Dependency>) {
    deps.sort_unstable();
    deps.dedup();
}

// ------------- FilledDependency -------------
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
pub struct FilledDependency {
    pub rel: RelId,
    pub head: Position,
    pub filler: Position,
    pub rule: RuleKind,
    pub lrange: bool,
    /// Number of coordinated fillers sharing the slot, used to average
    /// their contribution.
    pub conj: u8,
}

impl FilledDependency {
    /// The (relation, head, filler) triple evaluation compares on.
    pub fn triple(&self) -> (RelId, Position, Position) {
        (self.rel, self.head, self.filler)
    }
}

impl fmt::Display for FilledDependency {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {} {}", self.head, self.rel, self.filler)?;
        if self.lrange {
            write!(f, " *")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markedup::parse_category;

    #[test]
    fn lexical_dependencies_follow_slots() {
        let cat = parse_category(r"((S[dcl]{_}\NP{Y}<1>){_}/NP{Z}<2>){_}").unwrap();
        let deps = Dependency::from_category(&cat, 2, RuleKind::Lexical);
        assert_eq!(deps.len(), 2);
        assert!(deps.iter().all(|d| d.head == 2));
        assert_eq!(deps[0].var, VarId::from_name('Y').unwrap());
        assert_eq!(deps[1].rel, 2);
    }

    #[test]
    fn filling_with_coordinated_fillers_records_conj_factor() {
        let dep = Dependency { var: VarId(2), rel: 7, head: 1, lrange: VarId::NONE, rule: RuleKind::Lexical };
        let var = Variable::filled(4).unify(&Variable::filled(6));
        let filled: Vec<_> = dep.fill(&var, RuleKind::FwdApp).collect();
        assert_eq!(filled.len(), 2);
        assert_eq!(filled[0].filler, 4);
        assert_eq!(filled[1].filler, 6);
        assert!(filled.iter().all(|d| d.conj == 2 && d.rule == RuleKind::FwdApp));
    }
}
