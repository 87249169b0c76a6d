//! Scores the spectral ranking against the ground truth with precision@k and
//! recall@k.

use crate::{
    config::Params,
    context::GraphContext,
    error::{Error, Result},
    ground_truth::GroundTruth,
    matcher::SpectralMatcher,
    types::VId,
};
use itertools::Itertools;
use log::{debug, info, warn};
use std::{cmp::Ordering, collections::HashSet, fmt};

/// Sorts `candidates` by descending score, ties by ascending id.
pub fn rank_candidates<I>(candidates: I, scores: &[f64]) -> Vec<VId>
where
    I: IntoIterator<Item = VId>,
{
    candidates
        .into_iter()
        .sorted_by(|&a, &b| {
            scores[b]
                .partial_cmp(&scores[a])
                .unwrap_or(Ordering::Equal)
                .then(a.cmp(&b))
        })
        .collect()
}

/// Precision and recall of `ranked` at every cutoff, or `None` if `truth` is
/// empty.
pub fn precision_recall_at(
    ranked: &[VId],
    truth: &[VId],
    cutoffs: &[usize],
) -> Option<(Vec<f64>, Vec<f64>)> {
    let truth: HashSet<_> = truth.iter().copied().collect();
    if truth.is_empty() {
        return None;
    }
    let (precision, recall) = cutoffs
        .iter()
        .map(|&k| {
            let hits = ranked.iter().take(k).filter(|&v| truth.contains(v)).count();
            let precision = if k == 0 { 0.0 } else { hits as f64 / k as f64 };
            (precision, hits as f64 / truth.len() as f64)
        })
        .unzip();
    Some((precision, recall))
}

/// Averages over the evaluated queries.
#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub cutoffs: Vec<usize>,
    pub precision: Vec<f64>,
    pub recall: Vec<f64>,
    pub num_evaluated: usize,
    /// Queries without ground truth.
    pub num_skipped: usize,
    pub num_not_converged: usize,
}

impl Metrics {
    fn new(cutoffs: &[usize]) -> Self {
        Self {
            cutoffs: cutoffs.to_vec(),
            precision: vec![0.0; cutoffs.len()],
            recall: vec![0.0; cutoffs.len()],
            num_evaluated: 0,
            num_skipped: 0,
            num_not_converged: 0,
        }
    }

    fn add(&mut self, precision: &[f64], recall: &[f64]) {
        self.precision.iter_mut().zip(precision).for_each(|(s, p)| *s += p);
        self.recall.iter_mut().zip(recall).for_each(|(s, r)| *s += r);
        self.num_evaluated += 1;
    }

    fn finish(mut self) -> Self {
        if self.num_evaluated > 0 {
            let n = self.num_evaluated as f64;
            self.precision.iter_mut().for_each(|p| *p /= n);
            self.recall.iter_mut().for_each(|r| *r /= n);
        }
        self
    }
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "k = [{}]", self.cutoffs.iter().join(", "))?;
        writeln!(f, "precision@k: [{}]", join_floats(&self.precision))?;
        write!(f, "recall@k: [{}]", join_floats(&self.recall))
    }
}

fn join_floats(values: &[f64]) -> String {
    values.iter().map(|v| format!("{:.3}", v)).join(" ")
}

pub struct Evaluator<'a> {
    context: &'a GraphContext,
    params: &'a Params,
    matcher: SpectralMatcher,
}

impl<'a> Evaluator<'a> {
    pub fn new(context: &'a GraphContext, params: &'a Params) -> Self {
        Self {
            context,
            params,
            matcher: SpectralMatcher::new(
                context.graph(),
                params.get_tolerance(),
                params.get_max_iterations(),
            ),
        }
    }

    /// The candidates of `query`, best first.
    pub fn rank(&self, query: VId) -> Result<Vec<VId>> {
        let query_graph = self.context.local_subgraph(query)?;
        let filter = self.context.candidate_filter(&query_graph, self.params);
        let candidates: Vec<_> = filter.candidates().collect();
        if candidates.is_empty() {
            return Ok(candidates);
        }
        let assignment = self.matcher.assignment(&query_graph)?;
        Ok(rank_candidates(candidates, assignment.root_scores()))
    }

    pub fn evaluate(&self, ground_truth: &GroundTruth) -> Result<Metrics> {
        let cutoffs = self.params.get_cutoffs();
        let mut metrics = Metrics::new(cutoffs);
        info!("evaluating {} queries...", ground_truth.len());
        for (i, (&query, truth)) in ground_truth.iter().enumerate() {
            debug!("query {} ({}/{})", query, i + 1, ground_truth.len());
            if truth.is_empty() {
                metrics.num_skipped += 1;
                continue;
            }
            let ranked = match self.rank(query) {
                Ok(ranked) => ranked,
                Err(Error::NotConverged { iterations, delta }) => {
                    warn!(
                        "query {}: not converged after {} iterations (delta {})",
                        query, iterations, delta
                    );
                    metrics.num_not_converged += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };
            if let Some((precision, recall)) = precision_recall_at(&ranked, truth, cutoffs) {
                metrics.add(&precision, &recall);
            }
        }
        info!(
            "evaluated {} queries, skipped {} without ground truth and {} not converged",
            metrics.num_evaluated, metrics.num_skipped, metrics.num_not_converged
        );
        Ok(metrics.finish())
    }
}
