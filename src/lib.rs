//! ccgchart – a beam-search chart parser for Combinatory Categorial Grammar.
//!
//! Given a sentence whose words carry ranked candidate lexical categories
//! ("supertags"), the parser builds every derivation the CCG combinators
//! allow, bottom-up, packing derivations that are indistinguishable for
//! further combination into equivalence classes, and keeps each chart cell
//! within a beam. A decoder then walks the classes from the root and returns
//! the best derivation together with its predicate-argument dependencies.
//!
//! ## Modules
//! * [`category`] – Immutable slash categories with variables, features and
//!   the unification/equivalence hashes.
//! * [`markedup`] – Parser for (markedup) category strings.
//! * [`unify`] – Unification of two categories into shared variables.
//! * [`variable`] / [`dependency`] – Filler chains and (un)filled dependencies.
//! * [`combinators`] / [`rules`] – The rule set and the table deciding which
//!   rules a left/right pair gets.
//! * [`supercat`] – Chart nodes.
//! * [`chart`] – Cells, the node arena and equivalence packing.
//! * [`parser`] – The beam-search chart filler with cube pruning and
//!   adaptive supertagging.
//! * [`decoder`] – Viterbi and oracle decoders.
//! * [`grammar`], [`sentence`], [`scoring`], [`config`] – The tables,
//!   input, model and settings the parser is driven by.
//!
//! ## Quick Start
//! ```
//! use ccgchart::{BeamParser, Decoder, FeatureScorer, Grammar, ParserConfig, Sentence, ViterbiDecoder};
//!
//! let grammar = Grammar::standard().unwrap();
//! let sentence = Sentence::new()
//!     .with("John", "NNP", &[("NP", 0.9)])
//!     .with("sleeps", "VBZ", &[(r"S[dcl]\NP", 0.9)]);
//! let mut parser = BeamParser::new(&grammar, FeatureScorer::new(), ParserConfig::default()).unwrap();
//! let status = parser.parse(&sentence).unwrap();
//! assert!(status.success);
//! let derivation = ViterbiDecoder.decode(parser.chart(), &sentence).unwrap().unwrap();
//! assert_eq!(derivation.dependencies.len(), 1);
//! ```

pub mod category;
pub mod chart;
pub mod combinators;
pub mod config;
pub mod decoder;
pub mod dependency;
pub mod error;
pub mod grammar;
pub mod logging;
pub mod markedup;
pub mod parser;
pub mod rules;
pub mod scoring;
pub mod sentence;
pub mod supercat;
pub mod unify;
pub mod variable;

pub use category::{Atom, Category, Feature, RelId, Slash, VarId};
pub use chart::{Cell, Chart, ScoreCell};
pub use config::{Packing, ParserConfig};
pub use decoder::{Decoder, DepsSumDecoder, Derivation, FscoreDecoder, GoldDeps, ViterbiDecoder};
pub use dependency::{Dependency, FilledDependency};
pub use error::{CcgError, Result};
pub use grammar::{Grammar, UnaryRule};
pub use markedup::parse_category;
pub use parser::{BeamParser, ParseStatus};
pub use rules::{RuleKind, RuleStats};
pub use scoring::{FeatureKey, FeatureScorer, Scorer};
pub use sentence::{Sentence, Supertag};
pub use supercat::{NodeId, SuperCategory};
pub use variable::{Position, Variable};
