use super::KnowledgeGraph;
use crate::types::{ELabel, VId};
use std::collections::HashMap;

/// The induced subgraph on a root and its direct neighbors.
///
/// Members are relabeled into `0..num_nodes()`: the root is always 0, the
/// other members follow in ascending node id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSubgraph {
    nodes: Vec<VId>,
    edges: Vec<(usize, usize, ELabel)>,
}

impl LocalSubgraph {
    pub fn new(graph: &KnowledgeGraph, root: VId) -> Self {
        let mut members = graph.neighbors(root);
        members.insert(root);
        let nodes: Vec<VId> = std::iter::once(root)
            .chain(members.iter().copied().filter(|&v| v != root))
            .collect();
        let local: HashMap<VId, usize> = nodes.iter().enumerate().map(|(i, &v)| (v, i)).collect();
        let edges = graph
            .induced_edges(&members)
            .into_iter()
            .map(|(head, tail, elabel)| (local[&head], local[&tail], elabel))
            .collect();
        Self { nodes, edges }
    }

    /// Builds a subgraph directly from local indices; node 0 is the root.
    pub fn from_edges(nodes: Vec<VId>, edges: Vec<(usize, usize, ELabel)>) -> Self {
        Self { nodes, edges }
    }

    pub fn root(&self) -> VId {
        self.nodes[0]
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// The graph node behind local index `i`.
    pub fn node(&self, i: usize) -> VId {
        self.nodes[i]
    }

    /// Arcs in local indices.
    pub fn edges(&self) -> &[(usize, usize, ELabel)] {
        &self.edges
    }
}
