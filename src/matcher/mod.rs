//! Candidate pruning, exact edit distance and the spectral approximation.

pub use candidates::CandidateFilter;
pub use ged::{EditDistance, GedOracle};
pub use spectral::{power_iteration, AffinityMatrix, AssignmentMatrix, SpectralMatcher};

mod candidates;
mod ged;
mod spectral;
