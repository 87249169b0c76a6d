use crate::{
    data::{KnowledgeGraph, LocalSubgraph},
    error::{Error, Result},
    types::{ELabel, VId},
};
use log::debug;
use rayon::prelude::*;
use std::collections::HashMap;

/// Spectral relaxation of graph matching between a query local subgraph and
/// the whole graph.
///
/// The graph side is indexed by edge label once and reused for every query.
pub struct SpectralMatcher {
    num_nodes: usize,
    arcs: HashMap<ELabel, Vec<(VId, VId)>>,
    tolerance: f64,
    max_iterations: usize,
}

impl SpectralMatcher {
    pub fn new(graph: &KnowledgeGraph, tolerance: f64, max_iterations: usize) -> Self {
        let mut arcs: HashMap<ELabel, Vec<(VId, VId)>> = HashMap::new();
        for (head, tail, elabel) in graph.edges() {
            arcs.entry(elabel).or_default().push((head, tail));
        }
        Self {
            num_nodes: graph.num_nodes(),
            arcs,
            tolerance,
            max_iterations,
        }
    }

    /// `A[(i, a), (j, b)] = 1` iff the query has `i -> j` and the graph has
    /// `a -> b` with the same label, plus the identity.
    pub fn affinity(&self, query: &LocalSubgraph) -> AffinityMatrix {
        let mut rows = vec![vec![]; query.num_nodes()];
        for &(i, j, elabel) in query.edges() {
            if let Some(arcs) = self.arcs.get(&elabel) {
                rows[i].push((j, arcs.as_slice()));
            }
        }
        AffinityMatrix {
            n: query.num_nodes(),
            m: self.num_nodes,
            rows,
        }
    }

    /// The soft assignment of query nodes to graph nodes: the dominant
    /// eigenvector of the affinity matrix, reshaped to `n × m`.
    pub fn assignment(&self, query: &LocalSubgraph) -> Result<AssignmentMatrix> {
        let affinity = self.affinity(query);
        let (scores, iterations) =
            power_iteration(&affinity, self.tolerance, self.max_iterations)?;
        debug!(
            "query {}: converged after {} iterations",
            query.root(),
            iterations
        );
        Ok(AssignmentMatrix {
            rows: affinity.n,
            cols: affinity.m,
            scores,
            iterations,
        })
    }
}

/// A sparse `(n·m) × (n·m)` affinity matrix, kept factored by query arc.
///
/// Row and column `(i, a)` is `i·m + a`.
pub struct AffinityMatrix<'a> {
    n: usize,
    m: usize,
    // rows[i]: (j, graph arcs labeled like the query arc i -> j)
    rows: Vec<Vec<(usize, &'a [(VId, VId)])>>,
}

impl<'a> AffinityMatrix<'a> {
    pub fn dim(&self) -> usize {
        self.n * self.m
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        let (i, a) = (row / self.m, row % self.m);
        let (j, b) = (col / self.m, col % self.m);
        let mut value = if row == col { 1.0 } else { 0.0 };
        for &(k, arcs) in &self.rows[i] {
            if k == j && arcs.binary_search(&(a, b)).is_ok() {
                value += 1.0;
            }
        }
        value
    }

    /// Number of structurally non-zero entries.
    #[cfg(test)]
    fn nnz(&self) -> usize {
        let mut nnz = self.dim();
        for (i, row) in self.rows.iter().enumerate() {
            for &(j, arcs) in row {
                nnz += arcs.len();
                if i == j {
                    // Loops in both graphs land on the diagonal.
                    nnz -= arcs.iter().filter(|(a, b)| a == b).count();
                }
            }
        }
        nnz
    }

    /// `y = A·x`.
    pub fn mul_vec(&self, x: &[f64], y: &mut [f64]) {
        assert_eq!(x.len(), self.dim());
        assert_eq!(y.len(), self.dim());
        if self.m == 0 {
            return;
        }
        let m = self.m;
        y.par_chunks_mut(m)
            .zip(self.rows.par_iter())
            .enumerate()
            .for_each(|(i, (y_i, row))| {
                y_i.copy_from_slice(&x[i * m..(i + 1) * m]);
                for &(j, arcs) in row {
                    let x_j = &x[j * m..(j + 1) * m];
                    for &(a, b) in arcs {
                        y_i[a] += x_j[b];
                    }
                }
            });
    }
}

/// Power iteration from the uniform vector.
///
/// Stops once two consecutive normalized iterates are closer than `tolerance`
/// and returns the later of the two with the iteration count. The earlier one
/// lies within `tolerance` of it.
pub fn power_iteration(
    matrix: &AffinityMatrix,
    tolerance: f64,
    max_iterations: usize,
) -> Result<(Vec<f64>, usize)> {
    let dim = matrix.dim();
    if dim == 0 {
        return Ok((vec![], 0));
    }
    let mut x = vec![1.0 / dim as f64; dim];
    let mut next = vec![0.0; dim];
    let mut delta = f64::INFINITY;
    for iteration in 1..=max_iterations {
        matrix.mul_vec(&x, &mut next);
        let norm = l2_norm(next.iter().copied());
        // A = I + B with B >= 0 and x >= 0, x != 0, so norm > 0.
        next.iter_mut().for_each(|v| *v /= norm);
        delta = l2_norm(next.iter().zip(&x).map(|(a, b)| a - b));
        std::mem::swap(&mut x, &mut next);
        if delta < tolerance {
            return Ok((x, iteration));
        }
    }
    Err(Error::NotConverged {
        iterations: max_iterations,
        delta,
    })
}

fn l2_norm<I: Iterator<Item = f64>>(values: I) -> f64 {
    values.map(|v| v * v).sum::<f64>().sqrt()
}

/// Row-major `n × m` scores; `[i][a]` rates query node `i` against graph node `a`.
#[derive(Debug, Clone)]
pub struct AssignmentMatrix {
    rows: usize,
    cols: usize,
    scores: Vec<f64>,
    iterations: usize,
}

impl AssignmentMatrix {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.scores[i * self.cols..(i + 1) * self.cols]
    }

    /// Scores of every graph node against the query root.
    pub fn root_scores(&self) -> &[f64] {
        self.row(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_toy_graph() -> KnowledgeGraph {
        KnowledgeGraph::from_triples(vec![(0, 5, 1), (1, 5, 2), (0, 7, 2)])
    }

    #[test]
    fn test_affinity_entries() {
        let mut graph = create_toy_graph();
        graph.add_node(3);
        let matcher = SpectralMatcher::new(&graph, 0.01, 1000);
        let query = LocalSubgraph::new(&graph, 0);
        let a = matcher.affinity(&query);
        let m = 4;
        assert_eq!(a.dim(), 12);
        assert_eq!(a.get(0, m + 1), 1.0);
        assert_eq!(a.get(1, m + 2), 1.0);
        assert_eq!(a.get(0, 2 * m + 2), 1.0);
        assert_eq!(a.get(1, 2 * m + 2), 0.0);
        assert_eq!(a.get(m + 1, 0), 0.0);
        assert_eq!(a.get(7, 7), 1.0);
        assert_eq!(a.nnz(), 12 + 5);
    }

    #[test]
    fn test_affinity_symmetric_for_identical_graphs() {
        let graph = create_toy_graph();
        let matcher = SpectralMatcher::new(&graph, 0.01, 1000);
        let query = LocalSubgraph::new(&graph, 0);
        assert_eq!(query.edges(), &[(0, 1, 5), (0, 2, 7), (1, 2, 5)]);
        let a = matcher.affinity(&query);
        let m = graph.num_nodes();
        for i in 0..m {
            for j in 0..m {
                for x in 0..m {
                    for y in 0..m {
                        assert_eq!(
                            a.get(i * m + x, j * m + y),
                            a.get(x * m + i, y * m + j)
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_mul_vec_matches_entries() {
        let graph = KnowledgeGraph::from_triples(vec![(0, 5, 1), (1, 5, 2), (2, 5, 0), (1, 3, 1)]);
        let matcher = SpectralMatcher::new(&graph, 0.01, 1000);
        let query = LocalSubgraph::new(&graph, 1);
        let a = matcher.affinity(&query);
        let x: Vec<f64> = (0..a.dim()).map(|k| k as f64 + 1.0).collect();
        let mut y = vec![0.0; a.dim()];
        a.mul_vec(&x, &mut y);
        for row in 0..a.dim() {
            let expected: f64 = (0..a.dim()).map(|col| a.get(row, col) * x[col]).sum();
            assert_eq!(y[row], expected);
        }
    }

    #[test]
    fn test_toy_converges() {
        let graph = create_toy_graph();
        let matcher = SpectralMatcher::new(&graph, 0.01, 1000);
        let assignment = matcher.assignment(&LocalSubgraph::new(&graph, 0)).unwrap();
        assert_eq!((assignment.rows(), assignment.cols()), (3, 3));
        assert!(assignment.iterations() <= 200);
        let norm = l2_norm((0..3).flat_map(|i| assignment.row(i).to_vec()));
        assert!((norm - 1.0).abs() < 1e-9);
        let root = assignment.root_scores();
        assert!(root[0] > root[1]);
        assert!(root[0] > root[2]);
    }

    #[test]
    fn test_returns_newest_iterate() {
        let graph = create_toy_graph();
        let matcher = SpectralMatcher::new(&graph, 0.01, 1000);
        let affinity = matcher.affinity(&LocalSubgraph::new(&graph, 0));
        // Any step passes, so the result is the first normalized product.
        let (x, iterations) = power_iteration(&affinity, 10.0, 1000).unwrap();
        assert_eq!(iterations, 1);
        let mut expected = vec![0.0; affinity.dim()];
        affinity.mul_vec(&vec![1.0 / affinity.dim() as f64; affinity.dim()], &mut expected);
        let norm = l2_norm(expected.iter().copied());
        for (a, b) in x.iter().zip(&expected) {
            assert!((a - b / norm).abs() < 1e-12);
        }
    }

    #[test]
    fn test_not_converged() {
        let graph = create_toy_graph();
        let matcher = SpectralMatcher::new(&graph, 0.01, 1);
        match matcher.assignment(&LocalSubgraph::new(&graph, 0)) {
            Err(Error::NotConverged { iterations, delta }) => {
                assert_eq!(iterations, 1);
                assert!(delta >= 0.01);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
