use super::{GraphInfo, Triple};
use crate::types::{ELabel, Edge, VId};
use std::collections::{BTreeMap, BTreeSet, HashSet};

struct GraphNode {
    predecessors: BTreeSet<VId>,
    successors: BTreeMap<VId, ELabel>,
}

impl GraphNode {
    fn new() -> Self {
        Self {
            predecessors: BTreeSet::new(),
            successors: BTreeMap::new(),
        }
    }
}

/// The knowledge graph: a directed graph with one label per ordered pair.
///
/// Nodes are `0..num_nodes()`. Adding an arc that already exists overwrites its
/// label, so the last triple for a `(head, tail)` pair wins.
pub struct KnowledgeGraph {
    nodes: Vec<GraphNode>,
    num_edges: usize,
}

impl KnowledgeGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self {
            nodes: vec![],
            num_edges: 0,
        }
    }

    pub fn from_triples<T>(triples: T) -> Self
    where
        T: IntoIterator<Item = Triple>,
    {
        let mut graph = Self::new();
        for (head, relation, tail) in triples {
            graph.add_arc(head, tail, relation);
        }
        graph
    }

    /// Makes sure `vid` is a node, growing the id space if needed.
    pub fn add_node(&mut self, vid: VId) {
        if vid >= self.nodes.len() {
            self.nodes.resize_with(vid + 1, GraphNode::new);
        }
    }

    pub fn add_arc(&mut self, head: VId, tail: VId, elabel: ELabel) {
        self.add_node(head.max(tail));
        if self.nodes[head].successors.insert(tail, elabel).is_none() {
            self.nodes[tail].predecessors.insert(head);
            self.num_edges += 1;
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    pub fn contains(&self, vid: VId) -> bool {
        vid < self.nodes.len()
    }

    pub fn nodes(&self) -> std::ops::Range<VId> {
        0..self.nodes.len()
    }

    pub fn predecessors(&self, vid: VId) -> &BTreeSet<VId> {
        &self.nodes[vid].predecessors
    }

    pub fn successors(&self, vid: VId) -> &BTreeMap<VId, ELabel> {
        &self.nodes[vid].successors
    }

    pub fn in_deg(&self, vid: VId) -> usize {
        self.nodes[vid].predecessors.len()
    }

    pub fn out_deg(&self, vid: VId) -> usize {
        self.nodes[vid].successors.len()
    }

    pub fn degree(&self, vid: VId) -> usize {
        self.in_deg(vid) + self.out_deg(vid)
    }

    /// The label of the arc `head -> tail`, if any.
    pub fn elabel(&self, head: VId, tail: VId) -> Option<ELabel> {
        self.nodes
            .get(head)
            .and_then(|node| node.successors.get(&tail).copied())
    }

    /// `pred(vid) ∪ succ(vid)`, sorted.
    pub fn neighbors(&self, vid: VId) -> BTreeSet<VId> {
        let node = &self.nodes[vid];
        node.predecessors
            .iter()
            .chain(node.successors.keys())
            .copied()
            .collect()
    }

    /// Every arc `(head, tail, elabel)`, sorted by `(head, tail)`.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.nodes.iter().enumerate().flat_map(|(head, node)| {
            node.successors
                .iter()
                .map(move |(&tail, &elabel)| (head, tail, elabel))
        })
    }

    /// The arcs with both ends in `vertices`, labels preserved.
    pub fn induced_edges(&self, vertices: &BTreeSet<VId>) -> Vec<Edge> {
        let mut edges = vec![];
        for &head in vertices {
            for (&tail, &elabel) in &self.nodes[head].successors {
                if vertices.contains(&tail) {
                    edges.push((head, tail, elabel));
                }
            }
        }
        edges
    }

    /// Number of arcs with both ends in `vertices`.
    pub fn count_induced_edges(&self, vertices: &BTreeSet<VId>) -> usize {
        vertices
            .iter()
            .map(|&head| {
                self.nodes[head]
                    .successors
                    .keys()
                    .filter(|tail| vertices.contains(tail))
                    .count()
            })
            .sum()
    }

    pub fn info(&self) -> GraphInfo {
        let elabels: HashSet<ELabel> = self.edges().map(|(_, _, elabel)| elabel).collect();
        GraphInfo::new(self.num_nodes(), self.num_edges(), elabels.len())
    }
}

impl Default for KnowledgeGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_toy_graph() -> KnowledgeGraph {
        KnowledgeGraph::from_triples(vec![(0, 5, 1), (1, 5, 2), (0, 7, 2), (3, 5, 3)])
    }

    #[test]
    fn test_last_write_wins() {
        let mut graph = KnowledgeGraph::new();
        graph.add_arc(0, 1, 5);
        graph.add_arc(0, 1, 7);
        assert_eq!(graph.num_edges(), 1);
        assert_eq!(graph.elabel(0, 1), Some(7));
        assert_eq!(graph.elabel(1, 0), None);
        assert_eq!(graph.degree(0), 1);
        assert_eq!(graph.degree(1), 1);
    }

    #[test]
    fn test_node_space() {
        let graph = KnowledgeGraph::from_triples(vec![(0, 1, 4)]);
        assert_eq!(graph.num_nodes(), 5);
        assert!(graph.contains(2));
        assert!(!graph.contains(5));
        assert_eq!(graph.degree(2), 0);
        assert!(graph.neighbors(2).is_empty());
    }

    #[test]
    fn test_neighbors() {
        let mut graph = KnowledgeGraph::new();
        graph.add_arc(0, 1, 1);
        graph.add_arc(1, 0, 2);
        graph.add_arc(2, 0, 1);
        assert_eq!(graph.neighbors(0).into_iter().collect::<Vec<_>>(), [1, 2]);
        assert_eq!(graph.degree(0), 3);
        assert_eq!(graph.in_deg(0), 2);
        assert_eq!(graph.out_deg(0), 1);
    }

    #[test]
    fn test_edges() {
        let graph = create_toy_graph();
        assert_eq!(
            graph.edges().collect::<Vec<_>>(),
            [(0, 1, 5), (0, 2, 7), (1, 2, 5), (3, 3, 5)]
        );
        let vertices: BTreeSet<VId> = vec![1, 2, 3].into_iter().collect();
        assert_eq!(graph.induced_edges(&vertices), [(1, 2, 5), (3, 3, 5)]);
        assert_eq!(graph.count_induced_edges(&vertices), 2);
    }

    #[test]
    fn test_info() {
        assert_eq!(create_toy_graph().info().to_string(), "4 4 2");
    }
}
