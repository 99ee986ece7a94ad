//! Immutable CCG categories.
//!
//! A category is either basic (`NP`, `S[dcl]`, ...) or complex
//! (`result/argument`, `result\argument`). Every node carries a variable used
//! by unification to track heads, an optional relation id marking a
//! dependency slot, and an optional long-range marker. Two hashes are fixed
//! at construction: the *unification hash* ignores features and variables and
//! is a necessary condition for two categories to unify; the *equivalence
//! hash* includes features and is what the chart packs on.

use std::fmt;
use std::hash::Hasher;
use std::sync::Arc;

use seahash::SeaHasher;

// ------------- VarId -------------
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct VarId(pub u8);

/// Translation table from old variables to new ones, indexed by the old id.
pub type VarMap = [VarId; VarId::MAX];

impl VarId {
    pub const NONE: VarId = VarId(0);
    /// `_` in markedup categories, bound to the lexical item itself.
    pub const HEAD: VarId = VarId(1);
    /// Capacity of a variable table, including the `NONE` slot.
    pub const MAX: usize = 16;
    const NAMES: [char; VarId::MAX] = [
        '-', '_', 'Y', 'Z', 'W', 'V', 'U', 'T', 'R', 'Q', 'A', 'B', 'C', 'D', 'E', 'F',
    ];

    pub fn from_name(c: char) -> Option<VarId> {
        Self::NAMES
            .iter()
            .skip(1)
            .position(|n| *n == c)
            .map(|i| VarId(i as u8 + 1))
    }
    pub fn name(self) -> char {
        Self::NAMES.get(self.index()).copied().unwrap_or('?')
    }
    pub fn is_none(self) -> bool {
        self.0 == 0
    }
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

pub fn empty_var_map() -> VarMap {
    [VarId::NONE; VarId::MAX]
}

// ------------- Atom -------------
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[repr(u8)]
pub enum Atom {
    None,
    N,
    NP,
    PP,
    S,
    Conj,
    Comma,
    Period,
    Colon,
    Semicolon,
    Lrb,
    Rrb,
    Lqu,
    Rqu,
}

impl Atom {
    pub fn parse(s: &str) -> Option<Atom> {
        let atom = match s {
            "N" => Atom::N,
            "NP" => Atom::NP,
            "PP" => Atom::PP,
            "S" => Atom::S,
            "conj" => Atom::Conj,
            "," => Atom::Comma,
            "." => Atom::Period,
            ":" => Atom::Colon,
            ";" => Atom::Semicolon,
            "LRB" => Atom::Lrb,
            "RRB" => Atom::Rrb,
            "LQU" => Atom::Lqu,
            "RQU" => Atom::Rqu,
            _ => return None,
        };
        Some(atom)
    }
    pub fn as_str(self) -> &'static str {
        match self {
            Atom::None => "NONE",
            Atom::N => "N",
            Atom::NP => "NP",
            Atom::PP => "PP",
            Atom::S => "S",
            Atom::Conj => "conj",
            Atom::Comma => ",",
            Atom::Period => ".",
            Atom::Colon => ":",
            Atom::Semicolon => ";",
            Atom::Lrb => "LRB",
            Atom::Rrb => "RRB",
            Atom::Lqu => "LQU",
            Atom::Rqu => "RQU",
        }
    }
    pub fn is_punct(self) -> bool {
        self >= Atom::Comma
    }
}

// ------------- Feature -------------
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[repr(u8)]
pub enum Feature {
    #[default]
    None,
    X,
    Adj,
    As,
    Asup,
    B,
    Bem,
    Dcl,
    Em,
    Expl,
    For,
    Frg,
    Intj,
    Inv,
    Nb,
    Ng,
    Num,
    Poss,
    Pss,
    Pt,
    Q,
    Qem,
    Thr,
    To,
    Wq,
}

impl Feature {
    const NAMES: [&'static str; 25] = [
        "", "X", "adj", "as", "asup", "b", "bem", "dcl", "em", "expl", "for", "frg", "intj",
        "inv", "nb", "ng", "num", "poss", "pss", "pt", "q", "qem", "thr", "to", "wq",
    ];
    const ALL: [Feature; 25] = [
        Feature::None, Feature::X, Feature::Adj, Feature::As, Feature::Asup, Feature::B,
        Feature::Bem, Feature::Dcl, Feature::Em, Feature::Expl, Feature::For, Feature::Frg,
        Feature::Intj, Feature::Inv, Feature::Nb, Feature::Ng, Feature::Num, Feature::Poss,
        Feature::Pss, Feature::Pt, Feature::Q, Feature::Qem, Feature::Thr, Feature::To,
        Feature::Wq,
    ];

    pub fn parse(s: &str) -> Option<Feature> {
        Self::NAMES
            .iter()
            .position(|n| !n.is_empty() && *n == s)
            .map(|i| Self::ALL[i])
    }
    pub fn as_str(self) -> &'static str {
        Self::NAMES[self as usize]
    }
    /// True for the feature variable and for an absent feature; both leave an
    /// `S` open to any concrete feature.
    pub fn is_free(self) -> bool {
        matches!(self, Feature::None | Feature::X)
    }
}

// ------------- Slash -------------
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Slash {
    Fwd,
    Bwd,
}

impl Slash {
    pub fn as_char(self) -> char {
        match self {
            Slash::Fwd => '/',
            Slash::Bwd => '\\',
        }
    }
}

/// Global relation (dependency slot) identifier, 0 when a node marks no slot.
pub type RelId = u32;

// ------------- Category -------------
#[derive(Debug, Clone)]
enum Shape {
    Basic {
        atom: Atom,
        feature: Feature,
    },
    Complex {
        result: Arc<Category>,
        slash: Slash,
        argument: Arc<Category>,
    },
}

#[derive(Debug, Clone)]
pub struct Category {
    shape: Shape,
    var: VarId,
    rel: RelId,
    lrange: VarId,
    nargs: u8,
    ehash: u64,
    uhash: u64,
}

fn mix(values: &[u64]) -> u64 {
    let mut hasher = SeaHasher::default();
    for v in values {
        hasher.write_u64(*v);
    }
    hasher.finish()
}

impl Category {
    pub fn basic(atom: Atom, feature: Feature, var: VarId, rel: RelId, lrange: VarId) -> Self {
        // S carries an open feature either way, normalise so hashes agree
        let hashed_feature = if atom == Atom::S && feature.is_free() {
            Feature::X
        } else {
            feature
        };
        Self {
            shape: Shape::Basic { atom, feature },
            var,
            rel,
            lrange,
            nargs: 0,
            ehash: mix(&[1, atom as u64, hashed_feature as u64]),
            uhash: mix(&[1, atom as u64]),
        }
    }

    pub fn complex(
        result: Arc<Category>,
        slash: Slash,
        argument: Arc<Category>,
        var: VarId,
        rel: RelId,
        lrange: VarId,
    ) -> Self {
        let ehash = mix(&[2, result.ehash, slash as u64, argument.ehash]);
        let uhash = mix(&[2, result.uhash, slash as u64, argument.uhash]);
        let nargs = result.nargs.saturating_add(1);
        Self {
            shape: Shape::Complex { result, slash, argument },
            var,
            rel,
            lrange,
            nargs,
            ehash,
            uhash,
        }
    }

    /// Same node with new variable, relation and long-range marks.
    pub fn with_marks(&self, var: VarId, rel: RelId, lrange: VarId) -> Category {
        Category { var, rel, lrange, ..self.clone() }
    }

    /// Shorthand for a variable-free basic category.
    pub fn atomic(atom: Atom, feature: Feature) -> Self {
        Self::basic(atom, feature, VarId::NONE, 0, VarId::NONE)
    }

    pub fn var(&self) -> VarId {
        self.var
    }
    pub fn rel(&self) -> RelId {
        self.rel
    }
    pub fn lrange(&self) -> VarId {
        self.lrange
    }
    pub fn num_args(&self) -> usize {
        self.nargs as usize
    }
    pub fn ehash(&self) -> u64 {
        self.ehash
    }
    pub fn uhash(&self) -> u64 {
        self.uhash
    }
    pub fn is_basic(&self) -> bool {
        matches!(self.shape, Shape::Basic { .. })
    }
    pub fn is_complex(&self) -> bool {
        !self.is_basic()
    }
    pub fn atom(&self) -> Atom {
        match &self.shape {
            Shape::Basic { atom, .. } => *atom,
            Shape::Complex { .. } => Atom::None,
        }
    }
    pub fn feature(&self) -> Feature {
        match &self.shape {
            Shape::Basic { feature, .. } => *feature,
            Shape::Complex { .. } => Feature::None,
        }
    }
    pub fn result(&self) -> Option<&Arc<Category>> {
        match &self.shape {
            Shape::Complex { result, .. } => Some(result),
            Shape::Basic { .. } => None,
        }
    }
    pub fn argument(&self) -> Option<&Arc<Category>> {
        match &self.shape {
            Shape::Complex { argument, .. } => Some(argument),
            Shape::Basic { .. } => None,
        }
    }
    pub fn slash(&self) -> Option<Slash> {
        match &self.shape {
            Shape::Complex { slash, .. } => Some(*slash),
            Shape::Basic { .. } => None,
        }
    }
    pub fn is_fwd(&self) -> bool {
        self.slash() == Some(Slash::Fwd)
    }
    pub fn is_bwd(&self) -> bool {
        self.slash() == Some(Slash::Bwd)
    }

    // atom predicates used by the rule eligibility checks
    pub fn is_atom(&self, atom: Atom) -> bool {
        self.atom() == atom
    }
    pub fn is_n(&self) -> bool {
        self.is_atom(Atom::N)
    }
    pub fn is_np(&self) -> bool {
        self.is_atom(Atom::NP)
    }
    pub fn is_s(&self) -> bool {
        self.is_atom(Atom::S)
    }
    pub fn is_sdcl(&self) -> bool {
        self.is_s() && self.feature() == Feature::Dcl
    }
    pub fn is_conj(&self) -> bool {
        self.is_atom(Atom::Conj)
    }
    pub fn is_comma(&self) -> bool {
        self.is_atom(Atom::Comma)
    }
    pub fn is_period(&self) -> bool {
        self.is_atom(Atom::Period)
    }
    pub fn is_colon_or_semicolon(&self) -> bool {
        self.is_atom(Atom::Colon) || self.is_atom(Atom::Semicolon)
    }
    pub fn is_bracket(&self) -> bool {
        matches!(self.atom(), Atom::Lrb | Atom::Rrb | Atom::Lqu | Atom::Rqu)
    }
    pub fn is_punct(&self) -> bool {
        self.atom().is_punct()
    }

    /// `S\NP` with any feature on the `S`.
    pub fn is_verb_phrase(&self) -> bool {
        self.is_bwd()
            && self.result().is_some_and(|r| r.is_s())
            && self.argument().is_some_and(|a| a.is_np())
    }

    /// `(S\NP)|(S\NP)`: a verb phrase modifier.
    pub fn is_verb_phrase_modifier(&self) -> bool {
        self.result().is_some_and(|r| r.is_verb_phrase())
            && self.argument().is_some_and(|a| a.is_verb_phrase())
    }

    /// `(S[dcl]\S[dcl])\NP`, the reporting-verb shape allowed in generalised
    /// backward composition. Features on both `S` are not inspected, so any
    /// `(S\S)\NP` passes.
    pub fn is_sdclb_sdclb_np(&self) -> bool {
        if !self.is_bwd() || !self.argument().is_some_and(|a| a.is_np()) {
            return false;
        }
        match self.result() {
            Some(r) => {
                r.is_bwd()
                    && r.result().is_some_and(|x| x.is_s())
                    && r.argument().is_some_and(|x| x.is_s())
            }
            None => false,
        }
    }

    /// Walks `depth` steps down the result spine.
    pub fn result_at(&self, depth: usize) -> Option<&Category> {
        let mut current = self;
        for _ in 0..depth {
            current = current.result()?;
        }
        Some(current)
    }

    pub fn contains_var(&self, var: VarId) -> bool {
        if var.is_none() {
            return false;
        }
        if self.var == var || self.lrange == var {
            return true;
        }
        match &self.shape {
            Shape::Basic { .. } => false,
            Shape::Complex { result, argument, .. } => {
                result.contains_var(var) || argument.contains_var(var)
            }
        }
    }

    /// Variables in pre-order (node before result before argument), each once.
    pub fn vars_in_order(&self, out: &mut Vec<VarId>) {
        for v in [self.var, self.lrange] {
            if !v.is_none() && !out.contains(&v) {
                out.push(v);
            }
        }
        if let Shape::Complex { result, argument, .. } = &self.shape {
            result.vars_in_order(out);
            argument.vars_in_order(out);
        }
    }

    /// Largest variable id used anywhere in the category.
    pub fn max_var(&self) -> VarId {
        let own = self.var.max(self.lrange);
        match &self.shape {
            Shape::Basic { .. } => own,
            Shape::Complex { result, argument, .. } => {
                own.max(result.max_var()).max(argument.max_var())
            }
        }
    }

    /// Rebuilds the category with every variable sent through `trans` and
    /// every open `S` feature replaced by `feature` (unless that is `None`).
    pub fn translate(&self, trans: &VarMap, feature: Feature) -> Category {
        let var = trans[self.var.index()];
        let lrange = trans[self.lrange.index()];
        match &self.shape {
            Shape::Basic { atom, feature: own } => {
                let f = if *atom == Atom::S && *own == Feature::X && feature != Feature::None {
                    feature
                } else {
                    *own
                };
                Category::basic(*atom, f, var, self.rel, lrange)
            }
            Shape::Complex { result, slash, argument } => Category::complex(
                Arc::new(result.translate(trans, feature)),
                *slash,
                Arc::new(argument.translate(trans, feature)),
                var,
                self.rel,
                lrange,
            ),
        }
    }

    /// Rewrites relation ids, used when the grammar turns slot numbers into
    /// global relation ids.
    pub fn map_relations(&self, f: &mut dyn FnMut(RelId) -> RelId) -> Category {
        let rel = if self.rel == 0 { 0 } else { f(self.rel) };
        match &self.shape {
            Shape::Basic { atom, feature } => {
                Category::basic(*atom, *feature, self.var, rel, self.lrange)
            }
            Shape::Complex { result, slash, argument } => {
                let result = Arc::new(result.map_relations(f));
                let argument = Arc::new(argument.map_relations(f));
                Category::complex(result, *slash, argument, self.var, rel, self.lrange)
            }
        }
    }

    /// Renumbers the variables 1.. in pre-order. Returns the renumbered
    /// category and the old-to-new table.
    pub fn reorder(&self) -> (Category, VarMap) {
        let mut order = Vec::with_capacity(VarId::MAX);
        self.vars_in_order(&mut order);
        let mut trans = empty_var_map();
        for (i, v) in order.iter().enumerate() {
            trans[v.index()] = VarId(i as u8 + 1);
        }
        (self.translate(&trans, Feature::None), trans)
    }

    /// Relation slots in pre-order: `(node variable, relation, long-range)`.
    pub fn relations(&self, out: &mut Vec<(VarId, RelId, VarId)>) {
        if self.rel != 0 {
            out.push((self.var, self.rel, self.lrange));
        }
        if let Shape::Complex { result, argument, .. } = &self.shape {
            result.relations(out);
            argument.relations(out);
        }
    }

    /// Structural equality including variables, relations and markers.
    pub fn identical(&self, other: &Category) -> bool {
        if self.var != other.var || self.rel != other.rel || self.lrange != other.lrange {
            return false;
        }
        match (&self.shape, &other.shape) {
            (Shape::Basic { atom: a1, feature: f1 }, Shape::Basic { atom: a2, feature: f2 }) => {
                a1 == a2 && f1 == f2
            }
            (
                Shape::Complex { result: r1, slash: s1, argument: g1 },
                Shape::Complex { result: r2, slash: s2, argument: g2 },
            ) => s1 == s2 && r1.identical(r2) && g1.identical(g2),
            _ => false,
        }
    }

    /// `==` plus matching variables and long-range markers; relation ids are
    /// not compared.
    pub fn same_vars(&self, other: &Category) -> bool {
        if self.var != other.var || self.lrange != other.lrange || self != other {
            return false;
        }
        match (&self.shape, &other.shape) {
            (
                Shape::Complex { result: r1, argument: g1, .. },
                Shape::Complex { result: r2, argument: g2, .. },
            ) => r1.same_vars(r2) && g1.same_vars(g2),
            _ => true,
        }
    }

    pub fn markedup(&self) -> Markedup<'_> {
        Markedup(self)
    }
}

/// Equality on slash structure and features; variables are ignored and an
/// open `S` feature compares equal to an absent one.
impl PartialEq for Category {
    fn eq(&self, other: &Self) -> bool {
        if self.ehash != other.ehash {
            return false;
        }
        match (&self.shape, &other.shape) {
            (Shape::Basic { atom: a1, feature: f1 }, Shape::Basic { atom: a2, feature: f2 }) => {
                a1 == a2 && (f1 == f2 || (*a1 == Atom::S && f1.is_free() && f2.is_free()))
            }
            (
                Shape::Complex { result: r1, slash: s1, argument: g1 },
                Shape::Complex { result: r2, slash: s2, argument: g2 },
            ) => s1 == s2 && r1 == r2 && g1 == g2,
            _ => false,
        }
    }
}
impl Eq for Category {}

fn write_basic(atom: Atom, feature: Feature, f: &mut fmt::Formatter, show_x: bool) -> fmt::Result {
    write!(f, "{}", atom.as_str())?;
    if feature != Feature::None && (show_x || feature != Feature::X) {
        write!(f, "[{}]", feature.as_str())?;
    }
    Ok(())
}

// plain categories never show the feature variable: S[X] prints as S
fn write_plain(cat: &Category, f: &mut fmt::Formatter, nested: bool) -> fmt::Result {
    match &cat.shape {
        Shape::Basic { atom, feature } => write_basic(*atom, *feature, f, false),
        Shape::Complex { result, slash, argument } => {
            if nested {
                write!(f, "(")?;
            }
            write_plain(result, f, true)?;
            write!(f, "{}", slash.as_char())?;
            write_plain(argument, f, true)?;
            if nested {
                write!(f, ")")?;
            }
            Ok(())
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write_plain(self, f, false)
    }
}

/// Displays a category with its variables and relation ids.
pub struct Markedup<'a>(&'a Category);

impl fmt::Display for Markedup<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let cat = self.0;
        match &cat.shape {
            Shape::Basic { atom, feature } => write_basic(*atom, *feature, f, true)?,
            Shape::Complex { result, slash, argument } => {
                write!(f, "({}{}{})", Markedup(result), slash.as_char(), Markedup(argument))?;
            }
        }
        if !cat.var.is_none() {
            write!(f, "{{{}", cat.var.name())?;
            if !cat.lrange.is_none() {
                write!(f, "*")?;
            }
            write!(f, "}}")?;
        }
        if cat.rel != 0 {
            write!(f, "<{}>", cat.rel)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn np(var: u8) -> Arc<Category> {
        Arc::new(Category::basic(Atom::NP, Feature::None, VarId(var), 0, VarId::NONE))
    }
    fn s(feature: Feature, var: u8) -> Arc<Category> {
        Arc::new(Category::basic(Atom::S, feature, VarId(var), 0, VarId::NONE))
    }

    #[test]
    fn display_brackets_nested_complex_categories() {
        let vp = Arc::new(Category::complex(s(Feature::Dcl, 1), Slash::Bwd, np(2), VarId(1), 0, VarId::NONE));
        let tv = Category::complex(vp, Slash::Fwd, np(3), VarId(1), 0, VarId::NONE);
        assert_eq!(tv.to_string(), "(S[dcl]\\NP)/NP");
        assert_eq!(tv.num_args(), 2);
    }

    #[test]
    fn open_s_features_share_an_equivalence_hash() {
        assert_eq!(s(Feature::None, 1).ehash(), s(Feature::X, 2).ehash());
        assert_ne!(s(Feature::Dcl, 1).ehash(), s(Feature::X, 1).ehash());
        assert_eq!(s(Feature::Dcl, 1).uhash(), s(Feature::X, 1).uhash());
        assert_eq!(*s(Feature::None, 1), *s(Feature::X, 4));
    }

    #[test]
    fn var_names_round_trip() {
        for i in 1..VarId::MAX as u8 {
            let v = VarId(i);
            assert_eq!(VarId::from_name(v.name()), Some(v));
        }
        assert_eq!(VarId::from_name('_'), Some(VarId::HEAD));
    }
}
