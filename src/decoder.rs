//! Derivation extraction.
//!
//! Every decoder shares one walk: the value of a node is its own
//! contribution plus the best value of each child class, and the best
//! member of a class is picked by that value. Decoders differ in what a
//! node contributes and in how the root classes are compared.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::category::RelId;
use crate::chart::Chart;
use crate::dependency::FilledDependency;
use crate::error::{CcgError, Result};
use crate::sentence::Sentence;
use crate::supercat::NodeId;
use crate::variable::Position;

/// Gold (relation, head, filler) triples the oracle decoders count against.
pub type GoldDeps = BTreeSet<(RelId, Position, Position)>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Derivation {
    pub root: NodeId,
    pub score: f64,
    /// Nodes of the chosen derivation, root first.
    pub nodes: Vec<NodeId>,
    pub dependencies: BTreeSet<FilledDependency>,
}

impl Derivation {
    pub fn triples(&self) -> BTreeSet<(RelId, Position, Position)> {
        self.dependencies.iter().map(|d| d.triple()).collect()
    }
}

/// Per-node memo of the walk.
struct Walk {
    value: Vec<Option<f64>>,
    best_member: Vec<Option<(NodeId, f64)>>,
}

pub trait Decoder {
    /// What `node` contributes on its own, children excluded.
    fn node_score(&self, chart: &Chart, node: NodeId, sentence: &Sentence) -> f64;

    /// Value used to compare root classes, given the best derivation value
    /// of the class.
    fn root_score(&self, chart: &Chart, rep: NodeId, value: f64) -> f64 {
        let _ = (chart, rep);
        value
    }

    fn decode(&self, chart: &Chart, sentence: &Sentence) -> Result<Option<Derivation>>
    where
        Self: Sized,
    {
        decode_with(self, chart, sentence)
    }
}

fn node_value<D: Decoder + ?Sized>(
    decoder: &D,
    chart: &Chart,
    sentence: &Sentence,
    walk: &mut Walk,
    id: NodeId,
) -> Result<f64> {
    if let Some(v) = walk.value[id.index()] {
        return Ok(v);
    }
    let mut value = decoder.node_score(chart, id, sentence);
    for child in chart.node(id).children() {
        value += class_best(decoder, chart, sentence, walk, child)?.1;
    }
    walk.value[id.index()] = Some(value);
    Ok(value)
}

fn class_best<D: Decoder + ?Sized>(
    decoder: &D,
    chart: &Chart,
    sentence: &Sentence,
    walk: &mut Walk,
    rep: NodeId,
) -> Result<(NodeId, f64)> {
    if let Some(best) = walk.best_member[rep.index()] {
        return Ok(best);
    }
    let mut best: Option<(NodeId, f64)> = None;
    for member in chart.members(rep) {
        let value = node_value(decoder, chart, sentence, walk, member)?;
        if best.is_none_or(|(_, b)| value > b) {
            best = Some((member, value));
        }
    }
    match best {
        Some((id, value)) if !value.is_nan() => {
            walk.best_member[rep.index()] = Some((id, value));
            Ok((id, value))
        }
        _ => Err(CcgError::invariant(format!("equivalence class {} has no best member", rep))),
    }
}

/// The shared walk behind [`Decoder::decode`].
pub fn decode_with<D: Decoder + ?Sized>(
    decoder: &D,
    chart: &Chart,
    sentence: &Sentence,
) -> Result<Option<Derivation>> {
    let Some(root) = chart.root() else {
        return Ok(None);
    };
    let mut walk = Walk { value: vec![None; chart.len()], best_member: vec![None; chart.len()] };
    let mut best: Option<(NodeId, f64, f64)> = None;
    for rep in root.nodes() {
        let (member, value) = class_best(decoder, chart, sentence, &mut walk, *rep)?;
        let score = decoder.root_score(chart, *rep, value);
        if best.is_none_or(|(_, _, b)| score > b) {
            best = Some((member, value, score));
        }
    }
    let Some((root, _, score)) = best else {
        return Ok(None);
    };

    let mut nodes = Vec::new();
    let mut dependencies = BTreeSet::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        nodes.push(id);
        let node = chart.node(id);
        dependencies.extend(node.filled().iter().copied());
        let children: Vec<NodeId> = node.children().collect();
        for child in children.into_iter().rev() {
            let (member, _) = class_best(decoder, chart, sentence, &mut walk, child)?;
            stack.push(member);
        }
    }
    Ok(Some(Derivation { root, score, nodes, dependencies }))
}

fn gold_matches(chart: &Chart, node: NodeId, gold: &GoldDeps) -> f64 {
    chart.node(node).filled().iter().filter(|d| gold.contains(&d.triple())).count() as f64
}

// ------------- Decoders -------------
/// Highest model score.
#[derive(Debug, Default, Clone, Copy)]
pub struct ViterbiDecoder;

impl Decoder for ViterbiDecoder {
    fn node_score(&self, chart: &Chart, node: NodeId, _sentence: &Sentence) -> f64 {
        chart.score(node).local
    }
}

/// Most gold dependencies along the derivation.
#[derive(Debug, Clone)]
pub struct DepsSumDecoder {
    pub gold: GoldDeps,
}

impl Decoder for DepsSumDecoder {
    fn node_score(&self, chart: &Chart, node: NodeId, _sentence: &Sentence) -> f64 {
        gold_matches(chart, node, &self.gold)
    }
}

/// Highest dependency F-score against the gold set. Only exact when the
/// chart was packed with `Packing::SplitByOutside`, so that all members of
/// a class produce the same number of dependencies.
#[derive(Debug, Clone)]
pub struct FscoreDecoder {
    pub gold: GoldDeps,
}

impl Decoder for FscoreDecoder {
    fn node_score(&self, chart: &Chart, node: NodeId, _sentence: &Sentence) -> f64 {
        gold_matches(chart, node, &self.gold)
    }

    fn root_score(&self, chart: &Chart, rep: NodeId, value: f64) -> f64 {
        let total = chart.node(rep).dep_total() as f64 + self.gold.len() as f64;
        if total == 0.0 { 0.0 } else { 2.0 * value / total }
    }
}
