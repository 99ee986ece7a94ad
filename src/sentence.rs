//! Input sentences: words, part-of-speech tags and ranked supertags.

use serde::{Deserialize, Serialize};

use crate::variable::Position;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supertag {
    /// Plain category string, e.g. `(S[dcl]\NP)/NP`.
    pub category: String,
    pub prob: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sentence {
    pub words: Vec<String>,
    pub pos: Vec<String>,
    /// One list per word, highest probability first.
    pub supertags: Vec<Vec<Supertag>>,
}

impl Sentence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a word with its candidate categories.
    pub fn push(&mut self, word: &str, pos: &str, supertags: &[(&str, f64)]) {
        let mut tags: Vec<Supertag> = supertags
            .iter()
            .map(|(c, p)| Supertag { category: c.to_string(), prob: *p })
            .collect();
        tags.sort_by(|a, b| b.prob.total_cmp(&a.prob));
        self.words.push(word.to_string());
        self.pos.push(pos.to_string());
        self.supertags.push(tags);
    }

    /// Builder form of [`Sentence::push`].
    pub fn with(mut self, word: &str, pos: &str, supertags: &[(&str, f64)]) -> Self {
        self.push(word, pos, supertags);
        self
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Word at a 1-based dependency position.
    pub fn word(&self, position: Position) -> Option<&str> {
        let index = (position as usize).checked_sub(1)?;
        self.words.get(index).map(|w| w.as_str())
    }

    /// Supertags of word `index` (0-based) within `beta` of the best one.
    pub fn supertags_at(&self, index: usize, beta: f64) -> impl Iterator<Item = &Supertag> + '_ {
        let tags = self.supertags.get(index).map(|t| t.as_slice()).unwrap_or(&[]);
        let cutoff = tags.first().map_or(0.0, |best| best.prob * beta);
        tags.iter().filter(move |t| t.prob >= cutoff)
    }
}
