//! Unification of category structures.
//!
//! Side 1 is always the left-hand category of a combination and side 2 the
//! right-hand one. A successful run leaves two translation tables mapping
//! each side's variables to shared new ids, plus the feature an open `S[X]`
//! got bound to.
//!
//! Running out of variable ids is an error, not a failed unification: no
//! category of a well-formed grammar needs more than `VarId::MAX - 1`.

use crate::category::{empty_var_map, Atom, Category, Feature, VarId, VarMap};
use crate::dependency::Dependency;
use crate::error::{CcgError, Result};
use crate::variable::Variable;

#[derive(Debug, Clone)]
pub struct Unify {
    pub trans1: VarMap,
    pub trans2: VarMap,
    pairs: Vec<(VarId, VarId)>,
    nvars: usize,
    feature: Feature,
}

impl Default for Unify {
    fn default() -> Self {
        Self::new()
    }
}

impl Unify {
    pub fn new() -> Self {
        Self {
            trans1: empty_var_map(),
            trans2: empty_var_map(),
            pairs: Vec::with_capacity(VarId::MAX),
            nvars: 0,
            feature: Feature::None,
        }
    }

    fn reset(&mut self) {
        self.trans1 = empty_var_map();
        self.trans2 = empty_var_map();
        self.pairs.clear();
        self.nvars = 0;
        self.feature = Feature::None;
    }

    /// Highest new variable id handed out so far.
    pub fn nvars(&self) -> usize {
        self.nvars
    }
    /// Feature bound to open `S` features, `None` if nothing was bound.
    pub fn feature(&self) -> Feature {
        self.feature
    }

    /// `Ok(false)` when the categories do not unify.
    pub fn unify(&mut self, c1: &Category, c2: &Category) -> Result<bool> {
        self.reset();
        if !self.unify_structure(c1, c2) {
            return Ok(false);
        }
        self.new_vars_for_unified_pairs()?;
        Ok(true)
    }

    fn unify_structure(&mut self, c1: &Category, c2: &Category) -> bool {
        if c1.uhash() != c2.uhash() {
            return false;
        }
        match (c1.result(), c2.result()) {
            (None, None) => {
                if c1.atom() != c2.atom() || !self.unify_features(c1.atom(), c1.feature(), c2.feature()) {
                    return false;
                }
            }
            (Some(r1), Some(r2)) => {
                if c1.slash() != c2.slash() || !self.unify_structure(r1, r2) {
                    return false;
                }
                match (c1.argument(), c2.argument()) {
                    (Some(a1), Some(a2)) => {
                        if !self.unify_structure(a1, a2) {
                            return false;
                        }
                    }
                    _ => return false,
                }
            }
            _ => return false,
        }
        if !c1.var().is_none() && !c2.var().is_none() {
            self.pairs.push((c1.var(), c2.var()));
        }
        true
    }

    fn unify_features(&mut self, atom: Atom, f1: Feature, f2: Feature) -> bool {
        if f1 == f2 {
            return true;
        }
        if atom != Atom::S {
            return false;
        }
        if f1.is_free() {
            self.bind_feature(f2)
        } else if f2.is_free() {
            self.bind_feature(f1)
        } else {
            false
        }
    }

    fn bind_feature(&mut self, feature: Feature) -> bool {
        if feature.is_free() {
            return true;
        }
        if self.feature == Feature::None {
            self.feature = feature;
            return true;
        }
        self.feature == feature
    }

    fn fresh(&mut self) -> Result<VarId> {
        if self.nvars + 1 >= VarId::MAX {
            return Err(CcgError::invariant(format!(
                "out of variables: combination needs more than {}",
                VarId::MAX - 1
            )));
        }
        self.nvars += 1;
        Ok(VarId(self.nvars as u8))
    }

    fn new_vars_for_unified_pairs(&mut self) -> Result<()> {
        for i in 0..self.pairs.len() {
            let (v1, v2) = self.pairs[i];
            let t1 = self.trans1[v1.index()];
            let t2 = self.trans2[v2.index()];
            match (t1.is_none(), t2.is_none()) {
                (true, true) => {
                    let n = self.fresh()?;
                    self.trans1[v1.index()] = n;
                    self.trans2[v2.index()] = n;
                }
                (false, true) => self.trans2[v2.index()] = t1,
                (true, false) => self.trans1[v1.index()] = t2,
                (false, false) => {
                    if t1 != t2 {
                        // two classes meet: fold t2 into t1 everywhere
                        for t in self.trans1.iter_mut().chain(self.trans2.iter_mut()) {
                            if *t == t2 {
                                *t = t1;
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Gives a new id to a side-1 variable untouched by unification.
    pub fn add_var1(&mut self, var: VarId) -> Result<()> {
        if !var.is_none() && self.trans1[var.index()].is_none() {
            self.trans1[var.index()] = self.fresh()?;
        }
        Ok(())
    }
    pub fn add_var2(&mut self, var: VarId) -> Result<()> {
        if !var.is_none() && self.trans2[var.index()].is_none() {
            self.trans2[var.index()] = self.fresh()?;
        }
        Ok(())
    }

    /// `add_var1` for every variable of a surviving side-1 category.
    pub fn add_vars1(&mut self, cat: &Category) -> Result<()> {
        let mut order = Vec::with_capacity(VarId::MAX);
        cat.vars_in_order(&mut order);
        order.into_iter().try_for_each(|v| self.add_var1(v))
    }
    pub fn add_vars2(&mut self, cat: &Category) -> Result<()> {
        let mut order = Vec::with_capacity(VarId::MAX);
        cat.vars_in_order(&mut order);
        order.into_iter().try_for_each(|v| self.add_var2(v))
    }

    /// New ids for the variables unfilled dependencies still point at.
    pub fn add_dep_vars1(&mut self, deps: &[Dependency]) -> Result<()> {
        deps.iter().try_for_each(|d| {
            self.add_var1(d.var)?;
            self.add_var1(d.lrange)
        })
    }
    pub fn add_dep_vars2(&mut self, deps: &[Dependency]) -> Result<()> {
        deps.iter().try_for_each(|d| {
            self.add_var2(d.var)?;
            self.add_var2(d.lrange)
        })
    }

    fn sources<'a>(
        trans: &'a VarMap,
        vars: &'a [Variable],
        n: VarId,
    ) -> impl Iterator<Item = &'a Variable> + 'a {
        vars.iter()
            .enumerate()
            .skip(1)
            .filter(move |(old, _)| *old < VarId::MAX && trans[*old] == n)
            .map(|(_, v)| v)
    }

    /// False if some new variable would merge two already filled ones.
    pub fn check_constants(&self, vars1: &[Variable], vars2: &[Variable]) -> bool {
        (1..=self.nvars).all(|n| {
            let n = VarId(n as u8);
            Self::sources(&self.trans1, vars1, n)
                .chain(Self::sources(&self.trans2, vars2, n))
                .filter(|v| v.is_filled())
                .count()
                <= 1
        })
    }

    /// Variables of the combined node, indexed by new id: the union of the
    /// fillers of every old variable mapped onto it.
    pub fn merged_vars(&self, vars1: &[Variable], vars2: &[Variable]) -> Vec<Variable> {
        let mut merged = vec![Variable::new(); self.nvars + 1];
        for (n, slot) in merged.iter_mut().enumerate().skip(1) {
            let n = VarId(n as u8);
            for v in Self::sources(&self.trans1, vars1, n).chain(Self::sources(&self.trans2, vars2, n)) {
                *slot = slot.unify(v);
            }
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markedup::parse_category;

    #[test]
    fn s_feature_variable_binds_to_concrete_feature() {
        let mut u = Unify::new();
        let c1 = parse_category("S[X]{Y}").unwrap();
        let c2 = parse_category("S[dcl]{_}").unwrap();
        assert!(u.unify(&c1, &c2).unwrap());
        assert_eq!(u.feature(), Feature::Dcl);
        assert_eq!(u.trans1[2], u.trans2[1]);
    }

    #[test]
    fn np_features_must_match_exactly() {
        let mut u = Unify::new();
        let c1 = parse_category("NP").unwrap();
        let c2 = parse_category("NP[nb]").unwrap();
        assert!(!u.unify(&c1, &c2).unwrap());
    }

    #[test]
    fn shared_variables_collapse_into_one_class() {
        // Y appears twice on side 1, so both side-2 variables end up equal
        let mut u = Unify::new();
        let c1 = parse_category(r"(NP{Y}\NP{Y}){_}").unwrap();
        let c2 = parse_category(r"(NP{Z}\NP{W}){_}").unwrap();
        assert!(u.unify(&c1, &c2).unwrap());
        let z = VarId::from_name('Z').unwrap().index();
        let w = VarId::from_name('W').unwrap().index();
        assert_eq!(u.trans2[z], u.trans2[w]);
    }

    #[test]
    fn constant_check_rejects_two_filled_variables() {
        let mut u = Unify::new();
        let c1 = parse_category("NP{_}").unwrap();
        let c2 = parse_category("NP{_}").unwrap();
        assert!(u.unify(&c1, &c2).unwrap());
        let filled = vec![Variable::new(), Variable::filled(1)];
        let other = vec![Variable::new(), Variable::filled(3)];
        let unfilled = vec![Variable::new(), Variable::new()];
        assert!(!u.check_constants(&filled, &other));
        assert!(u.check_constants(&filled, &unfilled));
        let merged = u.merged_vars(&filled, &unfilled);
        assert_eq!(merged[u.trans1[1].index()], Variable::filled(1));
    }

    #[test]
    fn running_out_of_ids_is_an_error() {
        let mut u = Unify::new();
        let c = parse_category("NP{_}").unwrap();
        assert!(u.unify(&c, &c).unwrap());
        for v in 2..VarId::MAX as u8 {
            u.add_var1(VarId(v)).unwrap();
        }
        assert_eq!(u.nvars(), VarId::MAX - 1);
        // already mapped, no new id needed
        u.add_var1(VarId(3)).unwrap();
        assert!(matches!(u.add_var2(VarId(2)), Err(CcgError::InvariantViolation(_))));
    }
}
