use crate::{
    config::Params,
    data::{read_triples, KnowledgeGraph, LocalSubgraph, NeighborhoodStats},
    error::{Error, Result},
    matcher::CandidateFilter,
    types::VId,
};
use log::info;
use std::path::Path;

/// The graph and its node stats, built once per run and read-only afterwards.
///
/// Every phase borrows it, so workers share one snapshot without locking.
pub struct GraphContext {
    graph: KnowledgeGraph,
    stats: NeighborhoodStats,
}

impl GraphContext {
    pub fn new(graph: KnowledgeGraph) -> Self {
        info!("calculating stats...");
        let stats = NeighborhoodStats::new(&graph);
        Self { graph, stats }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let triples = read_triples(path)?;
        info!("building graph from {} triples...", triples.len());
        Ok(Self::new(KnowledgeGraph::from_triples(triples)))
    }

    pub fn graph(&self) -> &KnowledgeGraph {
        &self.graph
    }

    pub fn local_subgraph(&self, vid: VId) -> Result<LocalSubgraph> {
        if self.graph.contains(vid) {
            Ok(LocalSubgraph::new(&self.graph, vid))
        } else {
            Err(Error::InvalidNode(vid))
        }
    }

    /// The filter for `query`, whose local subgraph is `subgraph`.
    pub fn candidate_filter(&self, subgraph: &LocalSubgraph, params: &Params) -> CandidateFilter {
        CandidateFilter::new(
            &self.stats,
            subgraph.root(),
            params.max_distance(subgraph.num_edges()),
        )
    }

    /// The nodes eligible as ground-truth queries, ascending.
    pub fn query_nodes(&self, params: &Params) -> Vec<VId> {
        info!("calculating query nodes...");
        self.stats
            .iter()
            .filter(|(_, s)| params.is_query_size(s.neighbor_count, s.neighbor_edge_count))
            .map(|(vid, _)| vid)
            .collect()
    }
}
