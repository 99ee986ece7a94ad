//! The packed chart.
//!
//! Nodes live in one arena, in creation order, and are addressed by
//! [`NodeId`]. A [`Cell`] lists the representatives of the equivalence
//! classes covering its (position, span). Further members of a class hang
//! off the representative through the `next` links and never appear in a
//! cell. Scores are kept beside the arena in [`ScoreCell`]s so the nodes
//! themselves stay immutable.

use std::collections::HashMap;
use std::hash::BuildHasherDefault;

use seahash::SeaHasher;

use crate::config::Packing;
use crate::error::{CcgError, Result};
use crate::supercat::{NodeId, SuperCategory};

// ------------- ScoreCell -------------
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreCell {
    /// Best derivation score through this node: children's class maxima plus
    /// the local score.
    pub score: f64,
    /// Score of the features fired by this node alone.
    pub local: f64,
    /// Highest `score` in the class; only maintained on representatives.
    pub max_equiv: f64,
    /// Member holding `max_equiv`.
    pub best: NodeId,
}

// ------------- Cell -------------
#[derive(Debug, Clone, Default)]
pub struct Cell {
    nodes: Vec<NodeId>,
}

impl Cell {
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Result of adding a node to the chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Added {
    /// The node starts a new equivalence class.
    New(NodeId),
    /// The node joined the class of the given representative.
    Packed { node: NodeId, rep: NodeId },
}

impl Added {
    pub fn node(self) -> NodeId {
        match self {
            Added::New(id) => id,
            Added::Packed { node, .. } => node,
        }
    }
}

type PackKey = (u16, u16, u64, u32);

// ------------- Chart -------------
#[derive(Debug)]
pub struct Chart {
    nwords: usize,
    packing: Packing,
    cells: Vec<Cell>,
    nodes: Vec<SuperCategory>,
    scores: Vec<ScoreCell>,
    next: Vec<Option<NodeId>>,
    classes: HashMap<PackKey, Vec<NodeId>, BuildHasherDefault<SeaHasher>>,
}

impl Chart {
    pub fn new(nwords: usize, packing: Packing) -> Self {
        Self {
            nwords,
            packing,
            cells: vec![Cell::default(); nwords * (nwords + 1) / 2],
            nodes: Vec::new(),
            scores: Vec::new(),
            next: Vec::new(),
            classes: HashMap::default(),
        }
    }

    /// Empties the chart for a sentence of `nwords`, keeping allocations.
    pub fn reset(&mut self, nwords: usize, packing: Packing) {
        self.nwords = nwords;
        self.packing = packing;
        self.cells.clear();
        self.cells.resize(nwords * (nwords + 1) / 2, Cell::default());
        self.nodes.clear();
        self.scores.clear();
        self.next.clear();
        self.classes.clear();
    }

    pub fn num_words(&self) -> usize {
        self.nwords
    }
    /// Number of nodes built so far, packed ones included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn index(&self, position: usize, span: usize) -> usize {
        // cells of span s start after all cells of smaller spans
        let before = (span - 1) * (2 * self.nwords + 2 - span) / 2;
        before + position
    }

    fn check_span(&self, position: usize, span: usize) -> Result<usize> {
        if span == 0 || position + span > self.nwords {
            return Err(CcgError::invariant(format!(
                "cell ({}, {}) outside a chart of {} words",
                position, span, self.nwords
            )));
        }
        Ok(self.index(position, span))
    }

    /// Cell covering `span` words from `position`. Panics outside the chart.
    pub fn cell(&self, position: usize, span: usize) -> &Cell {
        &self.cells[self.index(position, span)]
    }

    pub fn root(&self) -> Option<&Cell> {
        if self.nwords == 0 {
            return None;
        }
        Some(self.cell(0, self.nwords))
    }

    pub fn node(&self, id: NodeId) -> &SuperCategory {
        &self.nodes[id.index()]
    }
    pub fn score(&self, id: NodeId) -> &ScoreCell {
        &self.scores[id.index()]
    }

    /// Members of the class `rep` represents, `rep` first.
    pub fn members(&self, rep: NodeId) -> Members<'_> {
        Members { chart: self, current: Some(rep) }
    }

    /// Adds a node with its local and total score. An equivalent node
    /// already in the cell absorbs it into its class.
    pub fn add(
        &mut self,
        position: usize,
        span: usize,
        node: SuperCategory,
        local: f64,
        score: f64,
    ) -> Result<Added> {
        let cell = self.check_span(position, span)?;
        let id = u32::try_from(self.nodes.len())
            .map(NodeId)
            .map_err(|_| CcgError::ResourceExceeded(format!("{} nodes in one chart", self.nodes.len())))?;
        let split = match self.packing {
            Packing::Exact => 0,
            Packing::SplitByOutside => node.dep_total(),
        };
        let key = (position as u16, span as u16, node.ehash(), split);
        let reps = self.classes.entry(key).or_default();
        let rep = reps.iter().copied().find(|r| {
            let other = &self.nodes[r.index()];
            other.equivalent(&node)
                && (self.packing == Packing::Exact || other.dep_total() == node.dep_total())
        });
        self.scores.push(ScoreCell { score, local, max_equiv: score, best: id });
        match rep {
            Some(rep) => {
                self.next.push(self.next[rep.index()]);
                self.next[rep.index()] = Some(id);
                self.nodes.push(node);
                let best = &mut self.scores[rep.index()];
                if score > best.max_equiv {
                    best.max_equiv = score;
                    best.best = id;
                }
                Ok(Added::Packed { node: id, rep })
            }
            None => {
                reps.push(id);
                self.next.push(None);
                self.nodes.push(node);
                self.cells[cell].nodes.push(id);
                Ok(Added::New(id))
            }
        }
    }

    /// Adds `extra` to a representative's score, e.g. root features.
    pub fn add_to_class(&mut self, rep: NodeId, extra: f64) {
        let mut current = Some(rep);
        while let Some(id) = current {
            let s = &mut self.scores[id.index()];
            s.score += extra;
            s.local += extra;
            current = self.next[id.index()];
        }
        let s = &mut self.scores[rep.index()];
        s.max_equiv += extra;
    }

    /// Sorts a cell by class score, best first.
    pub fn sort_cell(&mut self, position: usize, span: usize) {
        let index = self.index(position, span);
        let scores = &self.scores;
        self.cells[index]
            .nodes
            .sort_by(|a, b| scores[b.index()].max_equiv.total_cmp(&scores[a.index()].max_equiv));
    }

    /// Sorts the cell and keeps at most `beam_size` classes scoring within
    /// `beta` of the best.
    pub fn apply_beam(&mut self, position: usize, span: usize, beam_size: usize, beta: f64) {
        self.sort_cell(position, span);
        let index = self.index(position, span);
        let scores = &self.scores;
        let cell = &mut self.cells[index];
        let Some(best) = cell.nodes.first().map(|id| scores[id.index()].max_equiv) else {
            return;
        };
        let cutoff = best - beta.abs();
        let keep = cell
            .nodes
            .iter()
            .take(beam_size)
            .take_while(|id| scores[id.index()].max_equiv >= cutoff)
            .count();
        cell.nodes.truncate(keep);
    }
}

/// Iterator over the members of one equivalence class.
pub struct Members<'a> {
    chart: &'a Chart,
    current: Option<NodeId>,
}

impl Iterator for Members<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.current?;
        self.current = self.chart.next[id.index()];
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_indexes_cover_the_triangle_once() {
        let chart = Chart::new(4, Packing::Exact);
        let mut seen = vec![false; 10];
        for span in 1..=4 {
            for position in 0..=(4 - span) {
                let i = chart.index(position, span);
                assert!(!seen[i]);
                seen[i] = true;
            }
        }
        assert!(seen.iter().all(|s| *s));
        assert!(chart.check_span(2, 3).is_err());
    }
}
