//! Error management.

use crate::{data::TripleRule, types::VId};
use derive_more::{Display, From};

#[derive(Debug, Display, From)]
pub enum Error {
    #[display(fmt = "io: {}", _0)]
    Io(std::io::Error),
    #[display(fmt = "triple file is not valid UTF-8: {}", _0)]
    Encoding(std::str::Utf8Error),
    #[display(fmt = "malformed triple on line {}:\n{}", line, source)]
    #[from(ignore)]
    Parse {
        line: usize,
        source: pest::error::Error<TripleRule>,
    },
    #[display(fmt = "ground-truth store: {}", _0)]
    Sqlite(rusqlite::Error),
    #[display(
        fmt = "power iteration did not converge after {} iterations (delta {})",
        iterations,
        delta
    )]
    #[from(ignore)]
    NotConverged { iterations: usize, delta: f64 },
    #[display(fmt = "node {} is not in the graph", _0)]
    #[from(ignore)]
    InvalidNode(VId),
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
