//! Tunable parameters shared by the ground-truth and evaluation phases.

use std::time::Duration;

/// The cutoffs `k` reported by precision@k and recall@k.
pub const TOPK_LIST: [usize; 7] = [1, 2, 5, 10, 20, 50, 100];

#[derive(Debug, Clone, PartialEq)]
pub struct Params {
    query_size_min: usize,
    query_size_max: usize,
    min_neighbor_edges: usize,
    distance_divisor: usize,
    ged_timeout: Duration,
    tolerance: f64,
    max_iterations: usize,
    cutoffs: Vec<usize>,
    shards: usize,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            query_size_min: 4,
            query_size_max: 9,
            min_neighbor_edges: 2,
            distance_divisor: 3,
            ged_timeout: Duration::from_secs(10),
            tolerance: 0.01,
            max_iterations: 1000,
            cutoffs: TOPK_LIST.to_vec(),
            shards: default_shards(),
        }
    }
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Smallest local subgraph (root included) a query node may have.
    pub fn query_size_min(mut self, size: usize) -> Self {
        self.query_size_min = size;
        self
    }

    /// Largest local subgraph (root included) a query node may have.
    pub fn query_size_max(mut self, size: usize) -> Self {
        self.query_size_max = size;
        self
    }

    pub fn min_neighbor_edges(mut self, count: usize) -> Self {
        self.min_neighbor_edges = count;
        self
    }

    /// The accepted edit distance is `edge_count / divisor`, rounded down.
    pub fn distance_divisor(mut self, divisor: usize) -> Self {
        self.distance_divisor = divisor.max(1);
        self
    }

    pub fn ged_timeout(mut self, timeout: Duration) -> Self {
        self.ged_timeout = timeout;
        self
    }

    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn cutoffs(mut self, cutoffs: Vec<usize>) -> Self {
        self.cutoffs = cutoffs;
        self
    }

    pub fn shards(mut self, shards: usize) -> Self {
        self.shards = shards.max(1);
        self
    }

    /// The largest edit distance tolerated for a query whose local subgraph has
    /// `edge_count` edges.
    ///
    /// Both candidate pruning and ground-truth acceptance go through here.
    pub fn max_distance(&self, edge_count: usize) -> usize {
        edge_count / self.distance_divisor
    }

    /// Whether a node with the given stats qualifies as a query node.
    pub fn is_query_size(&self, neighbor_count: usize, neighbor_edge_count: usize) -> bool {
        self.query_size_min <= neighbor_count + 1
            && neighbor_count + 1 <= self.query_size_max
            && neighbor_edge_count >= self.min_neighbor_edges
    }

    pub fn get_ged_timeout(&self) -> Duration {
        self.ged_timeout
    }

    pub fn get_tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn get_max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn get_cutoffs(&self) -> &[usize] {
        &self.cutoffs
    }

    pub fn get_shards(&self) -> usize {
        self.shards
    }
}

fn default_shards() -> usize {
    sys_info::cpu_num()
        .map(|n| n as usize)
        .unwrap_or_else(|_| rayon::current_num_threads())
        .max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_distance_rounds_down() {
        let params = Params::new();
        assert_eq!(params.max_distance(0), 0);
        assert_eq!(params.max_distance(2), 0);
        assert_eq!(params.max_distance(3), 1);
        assert_eq!(params.max_distance(8), 2);
        assert_eq!(params.max_distance(9), 3);
    }

    #[test]
    fn test_is_query_size() {
        let params = Params::new();
        assert!(!params.is_query_size(2, 5));
        assert!(params.is_query_size(3, 2));
        assert!(params.is_query_size(8, 2));
        assert!(!params.is_query_size(9, 2));
        assert!(!params.is_query_size(5, 1));
    }

    #[test]
    fn test_setters() {
        let params = Params::new()
            .shards(0)
            .distance_divisor(0)
            .tolerance(0.5)
            .cutoffs(vec![1, 3]);
        assert_eq!(params.get_shards(), 1);
        assert_eq!(params.max_distance(7), 7);
        assert_eq!(params.get_tolerance(), 0.5);
        assert_eq!(params.get_cutoffs(), &[1, 3]);
    }
}
