//! The knowledge graph and the per-node data derived from it.

pub use graph::KnowledgeGraph;
pub use info::GraphInfo;
pub use stats::{NeighborhoodStats, NodeStats};
pub use subgraph::LocalSubgraph;
pub use triples::{parse_triples, read_triples, Triple, TripleRule};

mod graph;
mod info;
mod stats;
mod subgraph;
mod triples;
