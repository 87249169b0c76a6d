//! Ground truth: the nodes whose local subgraph lies within the accepted edit
//! distance of a query's.

pub use builder::GroundTruthBuilder;
pub use store::GroundTruthStore;

use crate::types::VId;
use std::collections::BTreeMap;

/// Query node to matched nodes, in candidate order.
pub type GroundTruth = BTreeMap<VId, Vec<VId>>;

mod builder;
mod store;
