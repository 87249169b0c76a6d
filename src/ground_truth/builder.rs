use super::{GroundTruth, GroundTruthStore};
use crate::{
    config::Params, context::GraphContext, error::Result, matcher::GedOracle, tools::shard_ranges,
    types::VId,
};
use log::{debug, info};
use rayon::prelude::*;
use std::sync::Mutex;

/// Computes ground truth for a list of query nodes.
///
/// Queries are cut into contiguous shards that run on the rayon pool; each
/// shard yields a partial map and the partials are merged by key.
pub struct GroundTruthBuilder<'a> {
    context: &'a GraphContext,
    params: &'a Params,
    oracle: GedOracle,
}

impl<'a> GroundTruthBuilder<'a> {
    pub fn new(context: &'a GraphContext, params: &'a Params) -> Self {
        Self {
            context,
            params,
            oracle: GedOracle::new(params.get_ged_timeout()),
        }
    }

    /// The candidates of `query` within the accepted edit distance, ascending.
    pub fn similar_nodes(&self, query: VId) -> Result<Vec<VId>> {
        let query_graph = self.context.local_subgraph(query)?;
        let filter = self.context.candidate_filter(&query_graph, self.params);
        let bound = filter.max_distance();
        let mut matches = vec![];
        for candidate in filter.candidates() {
            let candidate_graph = self.context.local_subgraph(candidate)?;
            if let Some(distance) = self
                .oracle
                .distance_within(&query_graph, &candidate_graph, bound)
            {
                if !distance.exact {
                    debug!(
                        "query {}: timed out against {} at distance {}",
                        query, candidate, distance.value
                    );
                }
                matches.push(candidate);
            }
        }
        Ok(matches)
    }

    /// Runs every query and keeps those with at least one match.
    pub fn build(&self, queries: &[VId]) -> Result<GroundTruth> {
        let ranges = shard_ranges(queries.len(), self.params.get_shards());
        info!(
            "building ground truth for {} queries in {} shards...",
            queries.len(),
            ranges.len()
        );
        let partials = ranges
            .into_par_iter()
            .enumerate()
            .map(|(shard, range)| self.build_shard(shard, &queries[range]))
            .collect::<Result<Vec<_>>>()?;
        Ok(merge(partials))
    }

    /// Like [`build`](Self::build), but commits each shard to `store` as soon as
    /// it finishes and skips the shards a previous run over the same `queries`
    /// already committed.
    ///
    /// Returns everything in the store afterwards.
    pub fn build_into(&self, queries: &[VId], store: &mut GroundTruthStore) -> Result<GroundTruth> {
        let ranges = shard_ranges(queries.len(), self.params.get_shards());
        let done = store.resume(queries, ranges.len())?;
        info!(
            "building ground truth for {} queries in {} shards ({} already done)...",
            queries.len(),
            ranges.len(),
            done.len()
        );
        let store = Mutex::new(store);
        ranges
            .into_par_iter()
            .enumerate()
            .filter(|(shard, _)| !done.contains(shard))
            .try_for_each(|(shard, range)| {
                let partial = self.build_shard(shard, &queries[range])?;
                let mut store = store.lock().unwrap_or_else(|e| e.into_inner());
                store.checkpoint(shard, &partial)
            })?;
        let store = store.into_inner().unwrap_or_else(|e| e.into_inner());
        store.load()
    }

    fn build_shard(&self, shard: usize, queries: &[VId]) -> Result<GroundTruth> {
        let mut ground_truth = GroundTruth::new();
        for (i, &query) in queries.iter().enumerate() {
            debug!("shard {}: query {} ({}/{})", shard, query, i + 1, queries.len());
            let matches = self.similar_nodes(query)?;
            if !matches.is_empty() {
                ground_truth.insert(query, matches);
            }
        }
        info!(
            "shard {}: {} of {} queries matched",
            shard,
            ground_truth.len(),
            queries.len()
        );
        Ok(ground_truth)
    }
}

fn merge(partials: Vec<GroundTruth>) -> GroundTruth {
    partials
        .into_iter()
        .fold(GroundTruth::new(), |mut merged, partial| {
            merged.extend(partial);
            merged
        })
}
