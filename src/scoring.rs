//! The scoring capability the parser calls into.
//!
//! A [`Scorer`] turns nodes into feature ids and feature ids into weights;
//! the parser only ever adds weights up. [`FeatureScorer`] is a small
//! interned-feature model whose weights are set by the caller.

use std::collections::HashMap;
use std::hash::BuildHasherDefault;

use seahash::SeaHasher;

use crate::category::RelId;
use crate::rules::RuleKind;
use crate::sentence::Sentence;
use crate::supercat::SuperCategory;

pub type FeatureId = u32;

pub trait Scorer {
    fn leaf_features(&self, node: &SuperCategory, sentence: &Sentence, out: &mut Vec<FeatureId>);
    fn unary_features(&self, node: &SuperCategory, sentence: &Sentence, out: &mut Vec<FeatureId>);
    fn binary_features(&self, node: &SuperCategory, sentence: &Sentence, out: &mut Vec<FeatureId>);
    fn root_features(&self, node: &SuperCategory, sentence: &Sentence, out: &mut Vec<FeatureId>);
    fn weight(&self, id: FeatureId) -> f64;

    fn score(&self, ids: &[FeatureId]) -> f64 {
        ids.iter().map(|id| self.weight(*id)).sum()
    }
}

// ------------- FeatureScorer -------------
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum FeatureKey {
    /// Lexical category assigned to a word.
    Lexical { category: String, word: String },
    /// Lexical category regardless of the word.
    Category(String),
    /// Rule producing a category.
    Rule { rule: RuleKind, category: String },
    /// Filled dependency between two words.
    Dependency { rel: RelId, head: String, filler: String },
    /// Category spanning the whole sentence.
    Root(String),
}

#[derive(Debug, Default, Clone)]
pub struct FeatureScorer {
    ids: HashMap<FeatureKey, FeatureId, BuildHasherDefault<SeaHasher>>,
    weights: Vec<f64>,
}

impl FeatureScorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns `key` if needed and sets its weight.
    pub fn set_weight(&mut self, key: FeatureKey, weight: f64) -> FeatureId {
        let next = self.weights.len() as FeatureId;
        let id = *self.ids.entry(key).or_insert(next);
        if id == next {
            self.weights.push(weight);
        } else {
            self.weights[id as usize] = weight;
        }
        id
    }

    pub fn id(&self, key: &FeatureKey) -> Option<FeatureId> {
        self.ids.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    fn push(&self, key: FeatureKey, out: &mut Vec<FeatureId>) {
        if let Some(id) = self.id(&key) {
            out.push(id);
        }
    }

    fn rule_features(&self, node: &SuperCategory, sentence: &Sentence, out: &mut Vec<FeatureId>) {
        if self.is_empty() {
            return;
        }
        self.push(FeatureKey::Rule { rule: node.rule(), category: node.cat.to_string() }, out);
        for dep in node.filled() {
            let (Some(head), Some(filler)) = (sentence.word(dep.head), sentence.word(dep.filler)) else {
                continue;
            };
            self.push(
                FeatureKey::Dependency { rel: dep.rel, head: head.to_string(), filler: filler.to_string() },
                out,
            );
        }
    }
}

impl Scorer for FeatureScorer {
    fn leaf_features(&self, node: &SuperCategory, sentence: &Sentence, out: &mut Vec<FeatureId>) {
        if self.is_empty() {
            return;
        }
        let category = node.cat.to_string();
        if let Some(word) = node.heads().fillers().next().and_then(|p| sentence.word(p)) {
            self.push(FeatureKey::Lexical { category: category.clone(), word: word.to_string() }, out);
        }
        self.push(FeatureKey::Category(category), out);
    }

    fn unary_features(&self, node: &SuperCategory, sentence: &Sentence, out: &mut Vec<FeatureId>) {
        self.rule_features(node, sentence, out);
    }

    fn binary_features(&self, node: &SuperCategory, sentence: &Sentence, out: &mut Vec<FeatureId>) {
        self.rule_features(node, sentence, out);
    }

    fn root_features(&self, node: &SuperCategory, _sentence: &Sentence, out: &mut Vec<FeatureId>) {
        if !self.is_empty() {
            self.push(FeatureKey::Root(node.cat.to_string()), out);
        }
    }

    fn weight(&self, id: FeatureId) -> f64 {
        self.weights.get(id as usize).copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_weight_keeps_id() {
        let mut scorer = FeatureScorer::new();
        let a = scorer.set_weight(FeatureKey::Root("S[dcl]".into()), 1.0);
        let b = scorer.set_weight(FeatureKey::Root("NP".into()), -0.5);
        let a2 = scorer.set_weight(FeatureKey::Root("S[dcl]".into()), 2.0);
        assert_eq!(a, a2);
        assert_ne!(a, b);
        assert_eq!(scorer.weight(a), 2.0);
        assert_eq!(scorer.score(&[a, b]), 1.5);
        assert_eq!(scorer.weight(99), 0.0);
    }
}
