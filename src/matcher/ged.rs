use crate::{data::LocalSubgraph, tools::abs_diff, types::ELabel};
use std::time::{Duration, Instant};

/// The result of an edit distance computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditDistance {
    /// The cheapest edit path found.
    pub value: usize,
    /// `false` if the search ran out of time, in which case `value` is only an
    /// upper bound.
    pub exact: bool,
}

/// Graph edit distance between two local subgraphs with their roots anchored.
///
/// Node substitutions are free, node insertions and deletions cost 1. A pair of
/// node positions costs 0 if both sides have an arc of the same label or both
/// have none, and 1 otherwise.
pub struct GedOracle {
    timeout: Duration,
}

impl GedOracle {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn distance(&self, g1: &LocalSubgraph, g2: &LocalSubgraph) -> EditDistance {
        let (a1, a2) = (Adjacency::new(g1), Adjacency::new(g2));
        let mut search = Search::new(&a1, &a2, None, self.deadline());
        search.run();
        EditDistance {
            value: search.best,
            exact: !search.timed_out,
        }
    }

    /// Like [`distance`](Self::distance) but prunes every edit path above `bound`.
    ///
    /// Returns `None` if no path within `bound` was found in time.
    pub fn distance_within(
        &self,
        g1: &LocalSubgraph,
        g2: &LocalSubgraph,
        bound: usize,
    ) -> Option<EditDistance> {
        let (a1, a2) = (Adjacency::new(g1), Adjacency::new(g2));
        let mut search = Search::new(&a1, &a2, Some(bound), self.deadline());
        search.run();
        if search.best <= bound {
            Some(EditDistance {
                value: search.best,
                exact: !search.timed_out,
            })
        } else {
            None
        }
    }

    fn deadline(&self) -> Option<Instant> {
        Instant::now().checked_add(self.timeout)
    }
}

/// Dense label matrix of a local subgraph.
struct Adjacency {
    n: usize,
    labels: Vec<Option<ELabel>>,
    deg: Vec<usize>,
    num_edges: usize,
}

impl Adjacency {
    fn new(g: &LocalSubgraph) -> Self {
        let n = g.num_nodes();
        let mut labels = vec![None; n * n];
        let mut deg = vec![0; n];
        for &(u, v, elabel) in g.edges() {
            labels[u * n + v] = Some(elabel);
            deg[u] += 1;
            deg[v] += 1;
        }
        Self {
            n,
            labels,
            deg,
            num_edges: g.num_edges(),
        }
    }

    fn get(&self, u: usize, v: usize) -> Option<ELabel> {
        self.labels[u * self.n + v]
    }

    /// Arcs between `u` and `others` in either direction, plus a loop on `u`.
    fn count_arcs_to(&self, u: usize, others: &[usize]) -> usize {
        let mut count = self.get(u, u).is_some() as usize;
        for &w in others {
            count += self.get(u, w).is_some() as usize + self.get(w, u).is_some() as usize;
        }
        count
    }
}

fn edge_cost(e1: Option<ELabel>, e2: Option<ELabel>) -> usize {
    match (e1, e2) {
        (None, None) => 0,
        (Some(l1), Some(l2)) => (l1 != l2) as usize,
        _ => 1,
    }
}

/// Depth-first branch and bound over injective partial mappings of `g1` into
/// `g2`, visiting `g1` nodes in `order`. `None` images are deletions; `g2`
/// nodes left unused at the leaves are insertions.
struct Search<'a> {
    g1: &'a Adjacency,
    g2: &'a Adjacency,
    order: Vec<usize>,
    images: Vec<Option<usize>>,
    mapped_g2: Vec<usize>,
    used: Vec<bool>,
    best: usize,
    deadline: Option<Instant>,
    timed_out: bool,
}

impl<'a> Search<'a> {
    fn new(
        g1: &'a Adjacency,
        g2: &'a Adjacency,
        bound: Option<usize>,
        deadline: Option<Instant>,
    ) -> Self {
        let mut order: Vec<usize> = (1..g1.n).collect();
        order.sort_by(|&u, &v| g1.deg[v].cmp(&g1.deg[u]).then(u.cmp(&v)));
        if g1.n > 0 {
            order.insert(0, 0);
        }
        let mut search = Self {
            g1,
            g2,
            order,
            images: Vec::with_capacity(g1.n),
            mapped_g2: Vec::with_capacity(g2.n),
            used: vec![false; g2.n],
            best: usize::MAX,
            deadline,
            timed_out: false,
        };
        search.best = search.seed_cost();
        if let Some(bound) = bound {
            search.best = search.best.min(bound.saturating_add(1));
        }
        search
    }

    /// Cost of mapping `order[i]` to the `i`-th node of `g2`, roots first.
    fn seed_cost(&self) -> usize {
        let mut g2_nodes: Vec<usize> = (1..self.g2.n).collect();
        if self.g2.n > 0 {
            g2_nodes.insert(0, 0);
        }
        let image = |k: usize| g2_nodes.get(k).copied();
        let mut cost = 0;
        for (k, &u) in self.order.iter().enumerate() {
            let v = image(k);
            cost += v.is_none() as usize;
            cost += edge_cost(self.g1.get(u, u), v.and_then(|v| self.g2.get(v, v)));
            for (l, &w) in self.order[..k].iter().enumerate() {
                let x = image(l);
                cost += edge_cost(
                    self.g1.get(u, w),
                    v.and_then(|v| x.and_then(|x| self.g2.get(v, x))),
                );
                cost += edge_cost(
                    self.g1.get(w, u),
                    v.and_then(|v| x.and_then(|x| self.g2.get(x, v))),
                );
            }
        }
        let inserted = &g2_nodes[self.order.len().min(g2_nodes.len())..];
        cost + inserted.len() + self.arcs_touching(inserted)
    }

    /// Arcs of `g2` with at least one end in `nodes`.
    fn arcs_touching(&self, nodes: &[usize]) -> usize {
        let mut inside = vec![false; self.g2.n];
        for &v in nodes {
            inside[v] = true;
        }
        let mut count = 0;
        for v in 0..self.g2.n {
            for w in 0..self.g2.n {
                if (inside[v] || inside[w]) && self.g2.get(v, w).is_some() {
                    count += 1;
                }
            }
        }
        count
    }

    fn run(&mut self) {
        if self.g1.n == 0 || self.g2.n == 0 {
            // Nothing to anchor; the seed already deletes or inserts everything.
            return;
        }
        let root_cost = self.extension_cost(0, Some(0));
        let arcs1 = self.g1.count_arcs_to(0, &[]);
        let arcs2 = self.g2.count_arcs_to(0, &[]);
        self.push(Some(0));
        self.expand(root_cost, arcs1, arcs2);
        self.pop(Some(0));
    }

    fn expand(&mut self, cost: usize, done1: usize, done2: usize) {
        if self.deadline.map_or(false, |deadline| Instant::now() >= deadline) {
            self.timed_out = true;
            return;
        }
        if cost + self.lower_bound(done1, done2) >= self.best {
            return;
        }
        let depth = self.images.len();
        if depth == self.order.len() {
            let unused: Vec<usize> = (0..self.g2.n).filter(|&v| !self.used[v]).collect();
            let total = cost + unused.len() + self.arcs_touching(&unused);
            if total < self.best {
                self.best = total;
            }
            return;
        }
        let u = self.order[depth];
        let done1 = done1 + self.g1.count_arcs_to(u, &self.order[..depth]);
        let mut choices: Vec<(usize, Option<usize>)> = (0..self.g2.n)
            .filter(|&v| !self.used[v])
            .map(|v| (self.extension_cost(u, Some(v)), Some(v)))
            .collect();
        choices.push((self.extension_cost(u, None), None));
        choices.sort();
        for (step, image) in choices {
            if self.timed_out {
                return;
            }
            let done2 = done2 + image.map_or(0, |v| self.g2.count_arcs_to(v, &self.mapped_g2));
            self.push(image);
            self.expand(cost + step, done1, done2);
            self.pop(image);
        }
    }

    /// Cost added by mapping `u` to `image` given the current partial mapping.
    fn extension_cost(&self, u: usize, image: Option<usize>) -> usize {
        let mut cost = image.is_none() as usize;
        cost += edge_cost(self.g1.get(u, u), image.and_then(|v| self.g2.get(v, v)));
        for (&w, &x) in self.order.iter().zip(&self.images) {
            let (forward, backward) = match (image, x) {
                (Some(v), Some(x)) => (self.g2.get(v, x), self.g2.get(x, v)),
                _ => (None, None),
            };
            cost += edge_cost(self.g1.get(u, w), forward);
            cost += edge_cost(self.g1.get(w, u), backward);
        }
        cost
    }

    /// Admissible estimate of the remaining cost.
    ///
    /// Every remaining node and arc of one side is either paired with one of the
    /// other side or inserted/deleted at cost 1.
    fn lower_bound(&self, done1: usize, done2: usize) -> usize {
        let rest1 = self.g1.n - self.images.len();
        let rest2 = self.g2.n - self.mapped_g2.len();
        let arcs1 = self.g1.num_edges - done1;
        let arcs2 = self.g2.num_edges - done2;
        abs_diff(rest1, rest2) + abs_diff(arcs1, arcs2)
    }

    fn push(&mut self, image: Option<usize>) {
        self.images.push(image);
        if let Some(v) = image {
            self.used[v] = true;
            self.mapped_g2.push(v);
        }
    }

    fn pop(&mut self, image: Option<usize>) {
        self.images.pop();
        if let Some(v) = image {
            self.used[v] = false;
            self.mapped_g2.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::KnowledgeGraph;

    fn create_oracle() -> GedOracle {
        GedOracle::new(Duration::from_secs(10))
    }

    fn create_subgraph(n: usize, edges: Vec<(usize, usize, ELabel)>) -> LocalSubgraph {
        LocalSubgraph::from_edges((0..n).collect(), edges)
    }

    #[test]
    fn test_identical() {
        let g = create_subgraph(
            4,
            vec![(0, 1, 5), (1, 2, 5), (0, 2, 7), (3, 0, 1), (2, 3, 1)],
        );
        let d = create_oracle().distance(&g, &g.clone());
        assert_eq!(d, EditDistance { value: 0, exact: true });
    }

    #[test]
    fn test_isomorphic_with_root_anchor() {
        // Same star, leaves listed in another order.
        let g1 = create_subgraph(4, vec![(0, 1, 1), (0, 2, 2), (3, 0, 3), (1, 2, 4)]);
        let g2 = create_subgraph(4, vec![(0, 3, 1), (0, 1, 2), (2, 0, 3), (3, 1, 4)]);
        assert_eq!(create_oracle().distance(&g1, &g2).value, 0);
        // Swapping the roles of a leaf and the root is not allowed.
        let g3 = create_subgraph(3, vec![(0, 1, 1), (0, 2, 1)]);
        let g4 = create_subgraph(3, vec![(1, 0, 1), (1, 2, 1)]);
        assert_eq!(create_oracle().distance(&g3, &g4).value, 4);
    }

    #[test]
    fn test_relabel_insert_delete() {
        let g1 = create_subgraph(3, vec![(0, 1, 5), (1, 2, 5), (0, 2, 7)]);
        let relabeled = create_subgraph(3, vec![(0, 1, 5), (1, 2, 5), (0, 2, 5)]);
        let missing = create_subgraph(3, vec![(0, 1, 5), (0, 2, 7)]);
        let extra = create_subgraph(3, vec![(0, 1, 5), (1, 2, 5), (0, 2, 7), (2, 1, 5)]);
        let oracle = create_oracle();
        assert_eq!(oracle.distance(&g1, &relabeled).value, 1);
        assert_eq!(oracle.distance(&g1, &missing).value, 1);
        assert_eq!(oracle.distance(&g1, &extra).value, 1);
    }

    #[test]
    fn test_different_sizes() {
        let g1 = create_subgraph(3, vec![(0, 1, 5), (0, 2, 5)]);
        let g2 = create_subgraph(2, vec![(0, 1, 5)]);
        // Delete one node and its arc.
        assert_eq!(create_oracle().distance(&g1, &g2).value, 2);
        assert_eq!(create_oracle().distance(&g2, &g1).value, 2);
    }

    #[test]
    fn test_never_exceeds_edge_total() {
        let g1 = create_subgraph(
            5,
            vec![(0, 1, 1), (0, 2, 1), (0, 3, 2), (0, 4, 2), (1, 2, 3)],
        );
        let g2 = create_subgraph(
            5,
            vec![(1, 0, 4), (2, 0, 4), (3, 0, 4), (4, 0, 4), (3, 4, 4), (4, 3, 4)],
        );
        let total = g1.num_edges() + g2.num_edges();
        let exact = create_oracle().distance(&g1, &g2);
        assert!(exact.exact);
        assert!(exact.value <= total);
        let rushed = GedOracle::new(Duration::from_secs(0)).distance(&g1, &g2);
        assert!(!rushed.exact);
        assert!(rushed.value <= total);
        assert!(rushed.value >= exact.value);
    }

    #[test]
    fn test_distance_within() {
        let g1 = create_subgraph(3, vec![(0, 1, 5), (1, 2, 5), (0, 2, 7)]);
        let g2 = create_subgraph(3, vec![(0, 1, 6), (1, 2, 6), (0, 2, 6)]);
        let oracle = create_oracle();
        assert_eq!(oracle.distance(&g1, &g2).value, 3);
        assert_eq!(oracle.distance_within(&g1, &g2, 2), None);
        assert_eq!(
            oracle.distance_within(&g1, &g2, 3),
            Some(EditDistance { value: 3, exact: true })
        );
        assert_eq!(oracle.distance_within(&g1, &g1, 0).map(|d| d.value), Some(0));
    }

    #[test]
    fn test_local_subgraphs() {
        let graph = KnowledgeGraph::from_triples(vec![
            (0, 5, 1),
            (1, 5, 2),
            (0, 7, 2),
            (3, 5, 4),
            (4, 5, 5),
            (3, 7, 5),
        ]);
        let g0 = LocalSubgraph::new(&graph, 0);
        let g3 = LocalSubgraph::new(&graph, 3);
        let g1 = LocalSubgraph::new(&graph, 1);
        let oracle = create_oracle();
        assert_eq!(oracle.distance(&g0, &g3).value, 0);
        assert!(oracle.distance(&g0, &g1).value > 0);
    }
}
