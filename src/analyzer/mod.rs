//! Analyzer module - compliance evaluation engine

pub mod criteria;
pub mod engine;
pub mod nlp;
pub mod scoring;

pub use engine::{EvaluationEngine, EvaluationSummary};
pub use scoring::ScoreCalculator;
