use crate::{
    data::{NeighborhoodStats, NodeStats},
    tools::abs_diff,
    types::VId,
};

/// Cheap structural pruning of the nodes that may match a query.
///
/// A node `n` survives iff it has exactly as many neighbors as the query and
/// `|deg(n) - deg(q)| + |nec(n) - nec(q)| <= max_distance`, where `nec` is the
/// neighbor edge count. The tolerance depends on the query only.
pub struct CandidateFilter<'a> {
    stats: &'a NeighborhoodStats,
    query: VId,
    max_distance: usize,
}

impl<'a> CandidateFilter<'a> {
    pub fn new(stats: &'a NeighborhoodStats, query: VId, max_distance: usize) -> Self {
        Self {
            stats,
            query,
            max_distance,
        }
    }

    pub fn max_distance(&self) -> usize {
        self.max_distance
    }

    pub fn accepts(&self, vid: VId) -> bool {
        vid != self.query && self.stats_will_match(self.stats.get(vid))
    }

    /// All surviving nodes in ascending id.
    pub fn candidates(&self) -> impl Iterator<Item = VId> + '_ {
        (0..self.stats.len()).filter(move |&vid| self.accepts(vid))
    }

    fn stats_will_match(&self, n: &NodeStats) -> bool {
        let q = self.stats.get(self.query);
        n.neighbor_count == q.neighbor_count
            && abs_diff(n.degree, q.degree) + abs_diff(n.neighbor_edge_count, q.neighbor_edge_count)
                <= self.max_distance
    }
}
