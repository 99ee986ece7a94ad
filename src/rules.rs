//! Rule kinds, application counters and the binary rule dispatch table.

use std::fmt;
use std::ops::AddAssign;

use serde::Serialize;

use crate::category::Category;
use crate::combinators as comb;
use crate::error::Result;
use crate::grammar::Grammar;
use crate::supercat::{Child, SuperCategory};
use crate::unify::Unify;

// ------------- RuleKind -------------
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
pub enum RuleKind {
    Lexical,
    FwdApp,
    BwdApp,
    FwdComp,
    BwdComp,
    BwdCross,
    GenFwdComp,
    GenBwdComp,
    GenBwdCross,
    Conj,
    Coord,
    FunnyConj,
    LeftPunct,
    RightPunct,
    LeftCommaTypeChange,
    RightCommaTypeChange,
    Apposition,
    TypeChange,
    TypeRaise,
}

impl RuleKind {
    pub const ALL: [RuleKind; 19] = [
        RuleKind::Lexical,
        RuleKind::FwdApp,
        RuleKind::BwdApp,
        RuleKind::FwdComp,
        RuleKind::BwdComp,
        RuleKind::BwdCross,
        RuleKind::GenFwdComp,
        RuleKind::GenBwdComp,
        RuleKind::GenBwdCross,
        RuleKind::Conj,
        RuleKind::Coord,
        RuleKind::FunnyConj,
        RuleKind::LeftPunct,
        RuleKind::RightPunct,
        RuleKind::LeftCommaTypeChange,
        RuleKind::RightCommaTypeChange,
        RuleKind::Apposition,
        RuleKind::TypeChange,
        RuleKind::TypeRaise,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RuleKind::Lexical => "lex",
            RuleKind::FwdApp => "fa",
            RuleKind::BwdApp => "ba",
            RuleKind::FwdComp => "fc",
            RuleKind::BwdComp => "bc",
            RuleKind::BwdCross => "bx",
            RuleKind::GenFwdComp => "gfc",
            RuleKind::GenBwdComp => "gbc",
            RuleKind::GenBwdCross => "gbx",
            RuleKind::Conj => "conj",
            RuleKind::Coord => "coord",
            RuleKind::FunnyConj => "funny",
            RuleKind::LeftPunct => "lp",
            RuleKind::RightPunct => "rp",
            RuleKind::LeftCommaTypeChange => "ltc",
            RuleKind::RightCommaTypeChange => "rtc",
            RuleKind::Apposition => "appo",
            RuleKind::TypeChange => "tc",
            RuleKind::TypeRaise => "tr",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ------------- RuleStats -------------
/// Successful rule applications, per rule kind.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuleStats {
    counts: [u64; RuleKind::ALL.len()],
}

impl RuleStats {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn record(&mut self, rule: RuleKind) {
        self.counts[rule as usize] += 1;
    }
    pub fn count(&self, rule: RuleKind) -> u64 {
        self.counts[rule as usize]
    }
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
    /// Non-zero counters in rule order.
    pub fn iter(&self) -> impl Iterator<Item = (RuleKind, u64)> + '_ {
        RuleKind::ALL
            .iter()
            .map(|r| (*r, self.counts[*r as usize]))
            .filter(|(_, c)| *c > 0)
    }
}

impl AddAssign<&RuleStats> for RuleStats {
    fn add_assign(&mut self, other: &RuleStats) {
        for (mine, theirs) in self.counts.iter_mut().zip(other.counts.iter()) {
            *mine += theirs;
        }
    }
}

impl AddAssign for RuleStats {
    fn add_assign(&mut self, other: RuleStats) {
        *self += &other;
    }
}

impl fmt::Display for RuleStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut first = true;
        for (rule, count) in self.iter() {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{}={}", rule, count)?;
            first = false;
        }
        Ok(())
    }
}

// ------------- Dispatch -------------
/// Mutually exclusive classification of one side of a combination.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum SideFlag {
    Fwd = 0,
    Bwd = 1,
    Conj = 2,
    Period = 3,
    Colon = 4,
    Comma = 5,
    Bracket = 6,
    None = 7,
}

impl SideFlag {
    pub fn of(cat: &Category) -> SideFlag {
        if cat.is_fwd() {
            SideFlag::Fwd
        } else if cat.is_bwd() {
            SideFlag::Bwd
        } else if cat.is_conj() {
            SideFlag::Conj
        } else if cat.is_period() {
            SideFlag::Period
        } else if cat.is_colon_or_semicolon() {
            SideFlag::Colon
        } else if cat.is_comma() {
            SideFlag::Comma
        } else if cat.is_bracket() {
            SideFlag::Bracket
        } else {
            SideFlag::None
        }
    }
}

/// Dense key of a left/right flag pair.
pub fn dispatch_key(left: SideFlag, right: SideFlag) -> u8 {
    left as u8 * 8 + right as u8
}

const FWD_FWD: u8 = SideFlag::Fwd as u8 * 8 + SideFlag::Fwd as u8;
const FWD_BWD: u8 = SideFlag::Fwd as u8 * 8 + SideFlag::Bwd as u8;
const FWD_NONE: u8 = SideFlag::Fwd as u8 * 8 + SideFlag::None as u8;
const NONE_BWD: u8 = SideFlag::None as u8 * 8 + SideFlag::Bwd as u8;
const BWD_BWD: u8 = SideFlag::Bwd as u8 * 8 + SideFlag::Bwd as u8;

/// Per-parse state the binary rules need: the grammar's category tables,
/// a reusable unification workspace and the seen-rule switch.
pub struct RuleContext<'g> {
    pub grammar: &'g Grammar,
    pub unify: Unify,
    pub seen_rules: bool,
}

impl<'g> RuleContext<'g> {
    pub fn new(grammar: &'g Grammar, seen_rules: bool) -> Self {
        Self { grammar, unify: Unify::new(), seen_rules }
    }

    /// Tries every rule the dispatch table allows for `left` followed by
    /// `right`, pushing the results onto `out`.
    pub fn combine(&mut self, left: Child, right: Child, out: &mut Vec<SuperCategory>) -> Result<()> {
        let (lcat, rcat) = (&left.node.cat, &right.node.cat);
        if self.seen_rules && !self.grammar.is_seen(lcat, rcat) {
            return Ok(());
        }
        let u = &mut self.unify;

        // conjunction-marked constituents only ever combine to their left
        if left.node.is_conj_marked() {
            return Ok(());
        }
        if right.node.is_conj_marked() {
            comb::coordination(u, left, right, out)?;
            if right.node.is_comma_conj() {
                comb::apposition(left, right, out)?;
            }
            return Ok(());
        }

        let lflag = SideFlag::of(lcat);
        let rflag = SideFlag::of(rcat);
        match (lflag, rflag) {
            (SideFlag::Conj, _) => {
                if !comb::conj(left, right, false, out)? || rcat.is_n() {
                    comb::funny_conj(left, right, out)?;
                }
            }
            (SideFlag::Comma, _) => {
                comb::conj(left, right, true, out)?;
                if rcat.is_np() {
                    for rule in self.grammar.left_comma_rules() {
                        comb::comma_type_change(u, left, right, rule, out)?;
                    }
                }
            }
            (SideFlag::Colon, _) => {
                comb::conj(left, right, false, out)?;
                comb::left_punct(left, right, out)?;
            }
            (SideFlag::Bracket, _) => {
                comb::left_punct(left, right, out)?;
            }
            (_, SideFlag::Period | SideFlag::Comma | SideFlag::Colon | SideFlag::Bracket) => {
                comb::right_punct(left, right, out)?;
                if rflag == SideFlag::Comma && lcat.is_sdcl() {
                    for rule in self.grammar.right_comma_rules() {
                        comb::comma_type_change(u, left, right, rule, out)?;
                    }
                }
            }
            _ => match dispatch_key(lflag, rflag) {
                FWD_FWD => {
                    let _ = comb::forward_application(u, left, right, out)?
                        || comb::forward_composition(u, left, right, out)?
                        || comb::generalised_forward_composition(u, left, right, out)?;
                }
                FWD_BWD => {
                    let _ = comb::forward_application(u, left, right, out)?
                        || comb::backward_application(u, left, right, out)?
                        || comb::backward_crossed_composition(u, left, right, out)?
                        || comb::generalised_backward_crossed_composition(u, left, right, out)?;
                }
                FWD_NONE => {
                    comb::forward_application(u, left, right, out)?;
                }
                NONE_BWD => {
                    comb::backward_application(u, left, right, out)?;
                }
                BWD_BWD => {
                    let _ = comb::backward_application(u, left, right, out)?
                        || comb::backward_composition(u, left, right, out)?
                        || comb::generalised_backward_composition(u, left, right, out)?;
                }
                _ => (),
            },
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markedup::parse_category;

    #[test]
    fn side_flags_are_exclusive() {
        let flag = |s: &str| SideFlag::of(&parse_category(s).unwrap());
        assert_eq!(flag(r"S\NP"), SideFlag::Bwd);
        assert_eq!(flag("NP/N"), SideFlag::Fwd);
        assert_eq!(flag("conj"), SideFlag::Conj);
        assert_eq!(flag(";"), SideFlag::Colon);
        assert_eq!(flag("RRB"), SideFlag::Bracket);
        assert_eq!(flag("N"), SideFlag::None);
        assert_eq!(dispatch_key(SideFlag::Fwd, SideFlag::Bwd), FWD_BWD);
    }

    #[test]
    fn stats_accumulate() {
        let mut a = RuleStats::new();
        a.record(RuleKind::FwdApp);
        let mut b = RuleStats::new();
        b.record(RuleKind::FwdApp);
        b.record(RuleKind::Coord);
        a += &b;
        assert_eq!(a.count(RuleKind::FwdApp), 2);
        assert_eq!(a.total(), 3);
        assert_eq!(a.to_string(), "fa=2 coord=1");
    }

    #[test]
    fn rule_table_follows_declaration_order() {
        for (i, rule) in RuleKind::ALL.iter().enumerate() {
            assert_eq!(*rule as usize, i);
        }
        let names: std::collections::HashSet<&str> = RuleKind::ALL.iter().map(|r| r.name()).collect();
        assert_eq!(names.len(), RuleKind::ALL.len());
    }
}
