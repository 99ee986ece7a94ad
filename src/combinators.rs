//! The CCG combinators.
//!
//! Every rule follows the same two steps: a cheap structural check that
//! rejects ineligible pairs without touching the unifier, then the shared
//! builder that unifies, assembles the result category and hands a
//! [`Draft`] to [`Draft::finish`]. A rule returns `Ok(true)` when it pushed
//! at least one node onto `out`.

use std::sync::Arc;

use crate::category::{Category, Slash, VarId, VarMap};
use crate::dependency::Dependency;
use crate::error::Result;
use crate::grammar::UnaryRule;
use crate::rules::RuleKind;
use crate::supercat::{Child, Draft, SuperCategory, COMMA_CONJ, CONJ, COORDINATED, TYPE_CHANGED, TYPE_RAISED};
use crate::unify::Unify;
use crate::variable::Variable;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

fn add_vars(u: &mut Unify, side: Side, cat: &Category) -> Result<()> {
    match side {
        Side::Left => u.add_vars1(cat),
        Side::Right => u.add_vars2(cat),
    }
}

fn trans(u: &Unify, side: Side) -> VarMap {
    match side {
        Side::Left => u.trans1,
        Side::Right => u.trans2,
    }
}

fn child_deps(left: Child, right: Child) -> u32 {
    left.node.dep_total() + right.node.dep_total()
}

/// Finishes a binary combination once `result` is built from the unified
/// pieces: maps the dependency variables, refuses to merge two filled
/// variables and assembles the node.
fn binary(
    u: &mut Unify,
    left: Child,
    right: Child,
    result: Category,
    rule: RuleKind,
    out: &mut Vec<SuperCategory>,
) -> Result<bool> {
    u.add_dep_vars1(left.node.unfilled())?;
    u.add_dep_vars2(right.node.unfilled())?;
    if !u.check_constants(left.node.vars(), right.node.vars()) {
        return Ok(false);
    }
    let vars = u.merged_vars(left.node.vars(), right.node.vars());
    let deps = translated_deps(u, left, right);
    let node = Draft {
        cat: result,
        vars,
        deps,
        rule,
        flags: 0,
        left: Some(left.id),
        right: Some(right.id),
        child_deps: child_deps(left, right),
    }
    .finish()?;
    out.push(node);
    Ok(true)
}

fn translated_deps(u: &Unify, left: Child, right: Child) -> Vec<Dependency> {
    left.node
        .unfilled()
        .iter()
        .map(|d| d.translate(&u.trans1))
        .chain(right.node.unfilled().iter().map(|d| d.translate(&u.trans2)))
        .collect()
}

// ------------- Application -------------
fn application(
    u: &mut Unify,
    dir: Slash,
    left: Child,
    right: Child,
    out: &mut Vec<SuperCategory>,
) -> Result<bool> {
    let (functor, argument, side) = match dir {
        Slash::Fwd => (left, right, Side::Left),
        Slash::Bwd => (right, left, Side::Right),
    };
    let fcat = &functor.node.cat;
    if fcat.slash() != Some(dir) {
        return Ok(false);
    }
    let (Some(x), Some(y)) = (fcat.result(), fcat.argument()) else {
        return Ok(false);
    };
    if y.uhash() != argument.node.cat.uhash() {
        return Ok(false);
    }
    let unified = match side {
        Side::Left => u.unify(y, &argument.node.cat)?,
        Side::Right => u.unify(&argument.node.cat, y)?,
    };
    if !unified {
        return Ok(false);
    }
    add_vars(u, side, x)?;
    let result = x.translate(&trans(u, side), u.feature());
    let rule = match dir {
        Slash::Fwd => RuleKind::FwdApp,
        Slash::Bwd => RuleKind::BwdApp,
    };
    binary(u, left, right, result, rule, out)
}

/// `X/Y Y => X`
pub fn forward_application(u: &mut Unify, left: Child, right: Child, out: &mut Vec<SuperCategory>) -> Result<bool> {
    application(u, Slash::Fwd, left, right, out)
}

/// `Y X\Y => X`
pub fn backward_application(u: &mut Unify, left: Child, right: Child, out: &mut Vec<SuperCategory>) -> Result<bool> {
    application(u, Slash::Bwd, left, right, out)
}

// ------------- Composition -------------
/// Rebuilds the secondary functor's arguments around `head`, innermost first.
fn wrap_arguments(secondary: &Category, depth: usize, head: Category, trans: &VarMap, u: &Unify) -> Option<Category> {
    if depth == 0 {
        return Some(head);
    }
    let var = head.var();
    let inner = wrap_arguments(secondary.result()?, depth - 1, head, trans, u)?;
    let argument = secondary.argument()?.translate(trans, u.feature());
    Some(Category::complex(
        Arc::new(inner),
        secondary.slash()?,
        Arc::new(argument),
        var,
        0,
        VarId::NONE,
    ))
}

/// Secondary functor of `depth` arguments whose slashes are all `slash`.
fn spine_matches(cat: &Category, depth: usize, slash: Slash) -> bool {
    (0..depth).all(|d| cat.result_at(d).is_some_and(|c| c.slash() == Some(slash)))
}

#[allow(clippy::too_many_arguments)]
fn composition(
    u: &mut Unify,
    dir: Slash,
    secondary_slash: Slash,
    depth: usize,
    left: Child,
    right: Child,
    rule: RuleKind,
    out: &mut Vec<SuperCategory>,
) -> Result<bool> {
    let (primary, secondary, primary_side) = match dir {
        Slash::Fwd => (left, right, Side::Left),
        Slash::Bwd => (right, left, Side::Right),
    };
    let secondary_side = match primary_side {
        Side::Left => Side::Right,
        Side::Right => Side::Left,
    };
    let pcat = &primary.node.cat;
    let scat = &secondary.node.cat;
    if pcat.slash() != Some(dir) || !spine_matches(scat, depth, secondary_slash) {
        return Ok(false);
    }
    let (Some(x), Some(y), Some(sy)) = (pcat.result(), pcat.argument(), scat.result_at(depth)) else {
        return Ok(false);
    };
    if y.uhash() != sy.uhash() {
        return Ok(false);
    }
    let unified = match primary_side {
        Side::Left => u.unify(y, sy)?,
        Side::Right => u.unify(sy, y)?,
    };
    if !unified {
        return Ok(false);
    }
    add_vars(u, primary_side, x)?;
    for d in 0..depth {
        if let Some(arg) = scat.result_at(d).and_then(|c| c.argument()) {
            add_vars(u, secondary_side, arg)?;
        }
    }
    let head = x.translate(&trans(u, primary_side), u.feature());
    let secondary_trans = trans(u, secondary_side);
    let Some(result) = wrap_arguments(scat, depth, head, &secondary_trans, u) else {
        return Ok(false);
    };
    binary(u, left, right, result, rule, out)
}

/// `X/Y Y/Z => X/Z`
pub fn forward_composition(u: &mut Unify, left: Child, right: Child, out: &mut Vec<SuperCategory>) -> Result<bool> {
    composition(u, Slash::Fwd, Slash::Fwd, 1, left, right, RuleKind::FwdComp, out)
}

/// `Y\Z X\Y => X\Z`
pub fn backward_composition(u: &mut Unify, left: Child, right: Child, out: &mut Vec<SuperCategory>) -> Result<bool> {
    composition(u, Slash::Bwd, Slash::Bwd, 1, left, right, RuleKind::BwdComp, out)
}

/// `Y/Z X\Y => X/Z`, only for verb phrase modifiers on the right.
pub fn backward_crossed_composition(
    u: &mut Unify,
    left: Child,
    right: Child,
    out: &mut Vec<SuperCategory>,
) -> Result<bool> {
    if !right.node.cat.argument().is_some_and(|a| a.is_verb_phrase()) {
        return Ok(false);
    }
    composition(u, Slash::Bwd, Slash::Fwd, 1, left, right, RuleKind::BwdCross, out)
}

/// `X/Y (Y/Z)/W => (X/Z)/W`, then one level deeper.
pub fn generalised_forward_composition(
    u: &mut Unify,
    left: Child,
    right: Child,
    out: &mut Vec<SuperCategory>,
) -> Result<bool> {
    Ok(composition(u, Slash::Fwd, Slash::Fwd, 2, left, right, RuleKind::GenFwdComp, out)?
        || composition(u, Slash::Fwd, Slash::Fwd, 3, left, right, RuleKind::GenFwdComp, out)?)
}

/// `(Y\Z)\W X\Y => (X\Z)\W`. Only allowed when the left side has the
/// `(S\S)\NP` shape of a reporting verb; the check does not look at the
/// features of either `S`.
pub fn generalised_backward_composition(
    u: &mut Unify,
    left: Child,
    right: Child,
    out: &mut Vec<SuperCategory>,
) -> Result<bool> {
    if !left.node.cat.is_sdclb_sdclb_np() {
        return Ok(false);
    }
    composition(u, Slash::Bwd, Slash::Bwd, 2, left, right, RuleKind::GenBwdComp, out)
}

/// `(Y/Z)/W X\Y => (X/Z)/W`, verb phrase modifiers only.
pub fn generalised_backward_crossed_composition(
    u: &mut Unify,
    left: Child,
    right: Child,
    out: &mut Vec<SuperCategory>,
) -> Result<bool> {
    if !right.node.cat.argument().is_some_and(|a| a.is_verb_phrase()) {
        return Ok(false);
    }
    Ok(composition(u, Slash::Bwd, Slash::Fwd, 2, left, right, RuleKind::GenBwdCross, out)?
        || composition(u, Slash::Bwd, Slash::Fwd, 3, left, right, RuleKind::GenBwdCross, out)?)
}

// ------------- Coordination -------------
/// `X X[conj] => X`. Fillers of unified variables are merged, so the
/// coordinated head holds both conjuncts.
pub fn coordination(u: &mut Unify, left: Child, right: Child, out: &mut Vec<SuperCategory>) -> Result<bool> {
    let (lcat, rcat) = (&left.node.cat, &right.node.cat);
    if lcat.is_punct() || lcat.is_conj() || left.node.is_conj_marked() || lcat.ehash() != rcat.ehash() {
        return Ok(false);
    }
    if !u.unify(lcat, rcat)? {
        return Ok(false);
    }
    u.add_dep_vars1(left.node.unfilled())?;
    u.add_dep_vars2(right.node.unfilled())?;
    let result = lcat.translate(&u.trans1, u.feature());
    let vars = u.merged_vars(left.node.vars(), right.node.vars());
    let deps = translated_deps(u, left, right);
    let node = Draft {
        cat: result,
        vars,
        deps,
        rule: RuleKind::Coord,
        flags: COORDINATED,
        left: Some(left.id),
        right: Some(right.id),
        child_deps: child_deps(left, right),
    }
    .finish()?;
    out.push(node);
    Ok(true)
}

/// A copy of `source` under a new rule, keeping its variables and
/// dependencies.
fn headed_copy(
    source: Child,
    left: Child,
    right: Child,
    rule: RuleKind,
    flags: u8,
    out: &mut Vec<SuperCategory>,
) -> Result<bool> {
    let node = Draft {
        cat: (*source.node.cat).clone(),
        vars: source.node.vars().to_vec(),
        deps: source.node.unfilled().to_vec(),
        rule,
        flags,
        left: Some(left.id),
        right: Some(right.id),
        child_deps: child_deps(left, right),
    }
    .finish()?;
    out.push(node);
    Ok(true)
}

fn conjoinable(cat: &Category) -> bool {
    !cat.is_punct() && !cat.is_conj()
}

/// `conj X => X[conj]`; with `comma` set the conjunction is a comma and the
/// result may also start an apposition.
pub fn conj(left: Child, right: Child, comma: bool, out: &mut Vec<SuperCategory>) -> Result<bool> {
    if !conjoinable(&right.node.cat) || right.node.is_type_raised() {
        return Ok(false);
    }
    let flags = if comma { CONJ | COMMA_CONJ } else { CONJ };
    headed_copy(right, left, right, RuleKind::Conj, flags, out)
}

/// `conj N => N`, the conjunction simply dropped.
pub fn funny_conj(left: Child, right: Child, out: &mut Vec<SuperCategory>) -> Result<bool> {
    if !right.node.cat.is_n() {
        return Ok(false);
    }
    headed_copy(right, left, right, RuleKind::FunnyConj, 0, out)
}

/// `NP NP[conj] => NP` where the conjunction was a comma; the appositive
/// contributes nothing to the head.
pub fn apposition(left: Child, right: Child, out: &mut Vec<SuperCategory>) -> Result<bool> {
    if !left.node.cat.is_np() || !right.node.cat.is_np() || left.node.is_conj_marked() {
        return Ok(false);
    }
    headed_copy(left, left, right, RuleKind::Apposition, 0, out)
}

// ------------- Punctuation -------------
/// `punct X => X`
pub fn left_punct(left: Child, right: Child, out: &mut Vec<SuperCategory>) -> Result<bool> {
    if right.node.cat.is_punct() || right.node.cat.is_conj() {
        return Ok(false);
    }
    headed_copy(right, left, right, RuleKind::LeftPunct, 0, out)
}

/// `X punct => X`
pub fn right_punct(left: Child, right: Child, out: &mut Vec<SuperCategory>) -> Result<bool> {
    if left.node.cat.is_punct() || left.node.cat.is_conj() {
        return Ok(false);
    }
    headed_copy(left, left, right, RuleKind::RightPunct, 0, out)
}

// ------------- Unary rules -------------
/// Shared by type-changing, type-raising and the comma type-changes:
/// unify the node with `rule.from` and rebuild `rule.to` around the result.
/// `comma` is the absorbed comma and whether it stood to the left.
fn unary(
    u: &mut Unify,
    child: Child,
    comma: Option<(Child, Side)>,
    rule: &UnaryRule,
    flags: u8,
    out: &mut Vec<SuperCategory>,
) -> Result<bool> {
    if !u.unify(&child.node.cat, &rule.from)? {
        return Ok(false);
    }
    u.add_vars2(&rule.to)?;
    u.add_dep_vars1(child.node.unfilled())?;
    let vars = u.merged_vars(child.node.vars(), &[]);
    let mut deps: Vec<Dependency> = child.node.unfilled().iter().map(|d| d.translate(&u.trans1)).collect();
    let rule_head = u.trans2[VarId::HEAD.index()];
    let heads = vars.get(rule_head.index()).copied().unwrap_or_else(Variable::new);
    for dep in Dependency::from_category(&rule.to, 0, rule.kind) {
        for head in heads.fillers() {
            deps.push(Dependency { head, ..dep.translate(&u.trans2) });
        }
    }
    let cat = rule.to.translate(&u.trans2, u.feature());
    let (left, right) = match comma {
        None => (Some(child.id), None),
        Some((c, Side::Left)) => (Some(c.id), Some(child.id)),
        Some((c, Side::Right)) => (Some(child.id), Some(c.id)),
    };
    let node = Draft {
        cat,
        vars,
        deps,
        rule: rule.kind,
        flags,
        left,
        right,
        child_deps: child.node.dep_total() + comma.map_or(0, |(c, _)| c.node.dep_total()),
    }
    .finish()?;
    out.push(node);
    Ok(true)
}

/// `X => Y` for a type-changing rule of the grammar.
pub fn type_change(u: &mut Unify, child: Child, rule: &UnaryRule, out: &mut Vec<SuperCategory>) -> Result<bool> {
    if child.node.is_unary() || child.node.is_conj_marked() {
        return Ok(false);
    }
    unary(u, child, None, rule, TYPE_CHANGED, out)
}

/// `X => T|(T|X)` for a type-raising rule of the grammar.
pub fn type_raise(u: &mut Unify, child: Child, rule: &UnaryRule, out: &mut Vec<SuperCategory>) -> Result<bool> {
    if child.node.is_type_raised() || child.node.is_conj_marked() {
        return Ok(false);
    }
    unary(u, child, None, rule, TYPE_RAISED, out)
}

/// `, NP => (S\NP)\(S\NP)` or `S[dcl] , => S/S`: the comma is absorbed and
/// the other side changes type.
pub fn comma_type_change(
    u: &mut Unify,
    left: Child,
    right: Child,
    rule: &UnaryRule,
    out: &mut Vec<SuperCategory>,
) -> Result<bool> {
    let (child, comma) = if left.node.cat.is_comma() {
        (right, (left, Side::Left))
    } else {
        (left, (right, Side::Right))
    };
    if child.node.is_conj_marked() {
        return Ok(false);
    }
    unary(u, child, Some(comma), rule, TYPE_CHANGED, out)
}
