use super::KnowledgeGraph;
use crate::types::VId;
use rayon::prelude::*;

/// The per-node metrics that candidate pruning is based on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeStats {
    /// `|pred(v) ∪ succ(v)|`.
    pub neighbor_count: usize,
    /// `in_deg(v) + out_deg(v)`.
    pub degree: usize,
    /// Arcs with both ends among the neighbors of `v`.
    pub neighbor_edge_count: usize,
}

impl NodeStats {
    fn new(graph: &KnowledgeGraph, vid: VId) -> Self {
        let neighbors = graph.neighbors(vid);
        Self {
            neighbor_count: neighbors.len(),
            degree: graph.degree(vid),
            neighbor_edge_count: graph.count_induced_edges(&neighbors),
        }
    }
}

/// [`NodeStats`] for every node of a graph.
///
/// There is no update path: rebuild it if the graph changes.
pub struct NeighborhoodStats {
    stats: Vec<NodeStats>,
}

impl NeighborhoodStats {
    pub fn new(graph: &KnowledgeGraph) -> Self {
        Self {
            stats: graph
                .nodes()
                .into_par_iter()
                .map(|vid| NodeStats::new(graph, vid))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    pub fn get(&self, vid: VId) -> &NodeStats {
        &self.stats[vid]
    }

    pub fn iter(&self) -> impl Iterator<Item = (VId, &NodeStats)> {
        self.stats.iter().enumerate()
    }
}
