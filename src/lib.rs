//! Local subgraph similarity ranking for knowledge graphs.
//!
//! Ground truth comes from graph edit distance between local subgraphs; the
//! ranking under test comes from a spectral relaxation of graph matching.

pub mod config;
pub mod context;
pub mod data;
pub mod error;
pub mod evaluator;
pub mod ground_truth;
pub mod matcher;
pub mod types;

pub(crate) mod tools;

pub use error::{Error, Result};
