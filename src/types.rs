//! Various types related to knowledge-graph matching.

/// The node id type.
///
/// Node ids are dense, so they double as indices into per-node tables.
pub type VId = usize;

/// The edge label (relation) type.
pub type ELabel = i64;

/// A directed labeled edge `(head, tail, relation)`.
pub type Edge = (VId, VId, ELabel);
