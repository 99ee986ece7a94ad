//! Beam-search chart parsing.
//!
//! Cells are filled by increasing span and, within a span, left to right,
//! so every cell only reads cells that are already final. Each cell goes
//! through combine (all splits, cube pruning when a split is large),
//! unary rules (type-changing before type-raising) and the beam.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use roaring::RoaringBitmap;
use tracing::{debug, info, trace, warn};

use crate::chart::{Added, Cell, Chart};
use crate::combinators as comb;
use crate::config::ParserConfig;
use crate::error::{CcgError, Result};
use crate::grammar::Grammar;
use crate::rules::{RuleContext, RuleStats};
use crate::scoring::{FeatureId, Scorer};
use crate::sentence::Sentence;
use crate::supercat::{Child, NodeId, SuperCategory};
use crate::variable::Position;

// ------------- ParseStatus -------------
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseStatus {
    /// The root cell holds at least one node.
    pub success: bool,
    /// The sentence was longer than `max_words` and not parsed.
    pub too_long: bool,
    /// The last attempt built more than `max_supercats` nodes and was abandoned.
    pub exceeded_supercats: bool,
    pub beta_level: usize,
    pub beta: f64,
    pub attempts: usize,
    /// Nodes built by the last attempt.
    pub num_supercats: usize,
    pub stats: RuleStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Parsed,
    NoRoot,
    Exceeded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Leaf,
    Unary,
    Binary,
}

fn local_score<S: Scorer>(
    scorer: &S,
    node: &SuperCategory,
    step: Step,
    root: bool,
    sentence: &Sentence,
    feats: &mut Vec<FeatureId>,
) -> f64 {
    feats.clear();
    match step {
        Step::Leaf => scorer.leaf_features(node, sentence, feats),
        Step::Unary => scorer.unary_features(node, sentence, feats),
        Step::Binary => scorer.binary_features(node, sentence, feats),
    }
    if root {
        scorer.root_features(node, sentence, feats);
    }
    scorer.score(feats)
}

/// A pair of cell entries waiting on the cube pruning frontier.
struct Candidate {
    priority: f64,
    i: usize,
    j: usize,
    results: Vec<(SuperCategory, f64, f64)>,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for Candidate {}
impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // max-heap on priority, earlier pairs first on ties
        self.priority
            .total_cmp(&other.priority)
            .then_with(|| (other.i + other.j).cmp(&(self.i + self.j)))
            .then_with(|| other.i.cmp(&self.i))
    }
}

// ------------- BeamParser -------------
pub struct BeamParser<'g, S: Scorer> {
    grammar: &'g Grammar,
    scorer: S,
    config: ParserConfig,
    chart: Chart,
    stats: RuleStats,
    parsed: bool,
    feats: Vec<FeatureId>,
}

impl<'g, S: Scorer> BeamParser<'g, S> {
    pub fn new(grammar: &'g Grammar, scorer: S, config: ParserConfig) -> Result<Self> {
        config.validate()?;
        let packing = config.packing;
        Ok(Self {
            grammar,
            scorer,
            config,
            chart: Chart::new(0, packing),
            stats: RuleStats::new(),
            parsed: false,
            feats: Vec::new(),
        })
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }
    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }
    pub fn scorer(&self) -> &S {
        &self.scorer
    }
    pub fn scorer_mut(&mut self) -> &mut S {
        &mut self.scorer
    }
    pub fn chart(&self) -> &Chart {
        &self.chart
    }

    /// Root cell of the last successful parse.
    pub fn root(&self) -> Option<&Cell> {
        if !self.parsed {
            return None;
        }
        self.chart.root().filter(|cell| !cell.is_empty())
    }

    /// Parses with the configured supertagger cutoffs.
    pub fn parse(&mut self, sentence: &Sentence) -> Result<ParseStatus> {
        let betas = self.config.betas.clone();
        self.parse_sentence(sentence, &betas)
    }

    /// Parses `sentence`, taking supertags within `betas[level]` of each
    /// word's best tag. In beam mode a single pass is made at the start
    /// level. Otherwise an empty root retries at the next looser level and
    /// a blown supercat budget retries at the next tighter one, each level
    /// being tried at most once.
    pub fn parse_sentence(&mut self, sentence: &Sentence, betas: &[f64]) -> Result<ParseStatus> {
        self.parsed = false;
        self.stats = RuleStats::new();
        let mut status = ParseStatus::default();
        let n = sentence.len();
        debug!(words = n, "parsing sentence");
        if n == 0 {
            self.chart.reset(0, self.config.packing);
            return Ok(status);
        }
        if n > self.config.max_words {
            warn!(words = n, max = self.config.max_words, "sentence too long, skipped");
            self.chart.reset(0, self.config.packing);
            status.too_long = true;
            return Ok(status);
        }
        if betas.is_empty() {
            return Err(CcgError::Config("no supertagger beta levels".into()));
        }

        let mut level = self.config.start_level.min(betas.len() - 1);
        let mut tried = vec![false; betas.len()];
        let mut tightened = false;
        loop {
            tried[level] = true;
            status.attempts += 1;
            status.beta_level = level;
            status.beta = betas[level];
            let outcome = self.parse_once(sentence, betas[level])?;
            status.exceeded_supercats = outcome == Outcome::Exceeded;
            status.num_supercats = self.chart.len();
            if self.config.use_beam {
                break;
            }
            match outcome {
                Outcome::Parsed => break,
                Outcome::Exceeded if level > 0 && !tried[level - 1] => {
                    level -= 1;
                    tightened = true;
                    info!(level, beta = betas[level], "too many supercats, tightening beta");
                }
                Outcome::NoRoot if !tightened && level + 1 < betas.len() && !tried[level + 1] => {
                    level += 1;
                    info!(level, beta = betas[level], "no spanning analysis, loosening beta");
                }
                _ => break,
            }
        }

        if status.exceeded_supercats {
            warn!(
                words = n,
                supercats = status.num_supercats,
                max = self.config.max_supercats,
                "supercat budget exceeded, parse abandoned"
            );
            self.chart.reset(n, self.config.packing);
        }
        status.success = !status.exceeded_supercats && self.chart.root().is_some_and(|c| !c.is_empty());
        self.parsed = status.success;
        status.stats = self.stats.clone();
        debug!(
            success = status.success,
            supercats = status.num_supercats,
            attempts = status.attempts,
            "sentence done"
        );
        Ok(status)
    }

    fn exceeded(&self) -> bool {
        self.chart.len() > self.config.max_supercats
    }

    fn add(&mut self, position: usize, span: usize, node: SuperCategory, local: f64, score: f64) -> Result<Added> {
        self.stats.record(node.rule());
        self.chart.add(position, span, node, local, score)
    }

    fn parse_once(&mut self, sentence: &Sentence, beta: f64) -> Result<Outcome> {
        let n = sentence.len();
        self.chart.reset(n, self.config.packing);
        let mut ctx = RuleContext::new(self.grammar, self.config.seen_rules);

        for i in 0..n {
            for tag in sentence.supertags_at(i, beta) {
                let Some(cat) = self.grammar.lexical(&tag.category) else {
                    debug!(word = i, category = %tag.category, "unknown supertag dropped");
                    continue;
                };
                let node = SuperCategory::lexical(cat, (i + 1) as Position)?;
                let local = local_score(&self.scorer, &node, Step::Leaf, n == 1, sentence, &mut self.feats);
                self.add(i, 1, node, local, local)?;
                if self.exceeded() {
                    return Ok(Outcome::Exceeded);
                }
            }
            if !self.unary(&mut ctx, i, 1, sentence)? {
                return Ok(Outcome::Exceeded);
            }
            self.finish_cell(i, 1);
        }

        for span in 2..=n {
            for position in 0..=(n - span) {
                for split in 1..span {
                    if !self.combine_split(&mut ctx, position, span, split, sentence)? {
                        return Ok(Outcome::Exceeded);
                    }
                }
                if !self.unary(&mut ctx, position, span, sentence)? {
                    return Ok(Outcome::Exceeded);
                }
                self.finish_cell(position, span);
            }
        }

        match self.chart.root() {
            Some(root) if !root.is_empty() => Ok(Outcome::Parsed),
            _ => Ok(Outcome::NoRoot),
        }
    }

    fn finish_cell(&mut self, position: usize, span: usize) {
        if self.config.use_beam {
            self.chart.apply_beam(position, span, self.config.beam_size, self.config.beam_beta);
        } else {
            self.chart.sort_cell(position, span);
        }
        trace!(position, span, size = self.chart.cell(position, span).len(), "cell complete");
    }

    /// Scores `results` as combinations with children worth `base`.
    fn score_results(
        &mut self,
        results: &mut Vec<SuperCategory>,
        step: Step,
        base: f64,
        root: bool,
        sentence: &Sentence,
    ) -> Vec<(SuperCategory, f64, f64)> {
        results
            .drain(..)
            .map(|node| {
                let local = local_score(&self.scorer, &node, step, root, sentence, &mut self.feats);
                (node, local, base + local)
            })
            .collect()
    }

    fn combine_pair(
        &mut self,
        ctx: &mut RuleContext<'g>,
        left: NodeId,
        right: NodeId,
        root: bool,
        sentence: &Sentence,
    ) -> Result<Vec<(SuperCategory, f64, f64)>> {
        let mut results = Vec::new();
        ctx.combine(
            Child::new(left, self.chart.node(left)),
            Child::new(right, self.chart.node(right)),
            &mut results,
        )?;
        let base = self.chart.score(left).max_equiv + self.chart.score(right).max_equiv;
        Ok(self.score_results(&mut results, Step::Binary, base, root, sentence))
    }

    /// Combines the cells on either side of `split`. Returns false when the
    /// supercat budget ran out.
    fn combine_split(
        &mut self,
        ctx: &mut RuleContext<'g>,
        position: usize,
        span: usize,
        split: usize,
        sentence: &Sentence,
    ) -> Result<bool> {
        let left: Vec<NodeId> = self.chart.cell(position, split).nodes().to_vec();
        let right: Vec<NodeId> = self.chart.cell(position + split, span - split).nodes().to_vec();
        if left.is_empty() || right.is_empty() {
            return Ok(true);
        }
        let root = span == sentence.len();
        if self.config.use_beam && self.config.cube_pruning && left.len() * right.len() > self.config.beam_size {
            return self.cube_prune(ctx, position, span, &left, &right, root, sentence);
        }
        for l in &left {
            for r in &right {
                for (node, local, score) in self.combine_pair(ctx, *l, *r, root, sentence)? {
                    self.add(position, span, node, local, score)?;
                    if self.exceeded() {
                        return Ok(false);
                    }
                }
            }
        }
        Ok(true)
    }

    fn candidate(
        &mut self,
        ctx: &mut RuleContext<'g>,
        left: &[NodeId],
        right: &[NodeId],
        i: usize,
        j: usize,
        root: bool,
        sentence: &Sentence,
    ) -> Result<Candidate> {
        let results = self.combine_pair(ctx, left[i], right[j], root, sentence)?;
        let priority = results
            .iter()
            .map(|(_, _, score)| *score)
            .max_by(|a, b| a.total_cmp(b))
            .unwrap_or_else(|| self.chart.score(left[i]).max_equiv + self.chart.score(right[j]).max_equiv);
        Ok(Candidate { priority, i, j, results })
    }

    /// Best-first walk over the `left` x `right` grid, both sorted best
    /// first, until `beam_size` new classes have been added.
    #[allow(clippy::too_many_arguments)]
    fn cube_prune(
        &mut self,
        ctx: &mut RuleContext<'g>,
        position: usize,
        span: usize,
        left: &[NodeId],
        right: &[NodeId],
        root: bool,
        sentence: &Sentence,
    ) -> Result<bool> {
        let width = right.len();
        let mut frontier = BinaryHeap::new();
        let mut visited = RoaringBitmap::new();
        visited.insert(0);
        frontier.push(self.candidate(ctx, left, right, 0, 0, root, sentence)?);
        let mut classes = 0;
        while let Some(best) = frontier.pop() {
            for (node, local, score) in best.results {
                if let Added::New(_) = self.add(position, span, node, local, score)? {
                    classes += 1;
                }
                if self.exceeded() {
                    return Ok(false);
                }
            }
            if classes >= self.config.beam_size {
                break;
            }
            for (i, j) in [(best.i + 1, best.j), (best.i, best.j + 1)] {
                if i < left.len() && j < width && visited.insert((i * width + j) as u32) {
                    frontier.push(self.candidate(ctx, left, right, i, j, root, sentence)?);
                }
            }
        }
        trace!(position, span, classes, visited = visited.len(), "cube pruning done");
        Ok(true)
    }

    /// Type-changing over the cell, then type-raising over the cell
    /// including the type-changed nodes.
    fn unary(&mut self, ctx: &mut RuleContext<'g>, position: usize, span: usize, sentence: &Sentence) -> Result<bool> {
        let root = span == sentence.len();
        let grammar = self.grammar;
        for raise in [false, true] {
            let rules = if raise { grammar.type_raises() } else { grammar.type_changes() };
            if rules.is_empty() {
                continue;
            }
            let ids: Vec<NodeId> = self.chart.cell(position, span).nodes().to_vec();
            for id in ids {
                let mut results = Vec::new();
                for rule in rules {
                    let child = Child::new(id, self.chart.node(id));
                    if raise {
                        comb::type_raise(&mut ctx.unify, child, rule, &mut results)?;
                    } else {
                        comb::type_change(&mut ctx.unify, child, rule, &mut results)?;
                    }
                }
                let base = self.chart.score(id).max_equiv;
                for (node, local, score) in self.score_results(&mut results, Step::Unary, base, root, sentence) {
                    self.add(position, span, node, local, score)?;
                    if self.exceeded() {
                        return Ok(false);
                    }
                }
            }
        }
        Ok(true)
    }
}
