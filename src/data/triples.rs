use crate::{
    error::{Error, Result},
    types::{ELabel, VId},
};
use log::info;
use memmap::Mmap;
use pest::Parser;
use pest_derive::Parser;
use std::{fs::File, path::Path, str::FromStr};

pub type TripleRule = Rule;

#[derive(Parser)]
#[grammar = "data/triples.pest"]
struct TripleParser;

/// A `(head, relation, tail)` record as stored in the triple file.
pub type Triple = (VId, ELabel, VId);

/// Reads the tab-separated triple file at `path`.
///
/// Every line must be `head\trelation\ttail`. The first malformed line aborts
/// the whole read.
pub fn read_triples<P: AsRef<Path>>(path: P) -> Result<Vec<Triple>> {
    let file = File::open(path.as_ref())?;
    info!("reading {}...", path.as_ref().display());
    if file.metadata()?.len() == 0 {
        return Ok(vec![]);
    }
    let mmap = unsafe { Mmap::map(&file)? };
    parse_triples(std::str::from_utf8(&mmap)?)
}

pub fn parse_triples(input: &str) -> Result<Vec<Triple>> {
    input
        .lines()
        .enumerate()
        .map(|(i, line)| {
            parse_line(line.trim()).map_err(|source| Error::Parse {
                line: i + 1,
                source,
            })
        })
        .collect()
}

fn parse_line(line: &str) -> std::result::Result<Triple, pest::error::Error<Rule>> {
    let triple = TripleParser::parse(Rule::line, line)?
        .next()
        .filter(|pair| pair.as_rule() == Rule::triple)
        .ok_or_else(|| custom_error(line, "expected a triple"))?;
    let mut ints = triple.into_inner();
    match (ints.next(), ints.next(), ints.next()) {
        (Some(head), Some(relation), Some(tail)) => Ok((
            parse_int(head)?,
            parse_int(relation)?,
            parse_int(tail)?,
        )),
        _ => unreachable!(),
    }
}

fn parse_int<T: FromStr>(
    pair: pest::iterators::Pair<Rule>,
) -> std::result::Result<T, pest::error::Error<Rule>> {
    pair.as_str().parse().map_err(|_| {
        pest::error::Error::new_from_span(
            pest::error::ErrorVariant::CustomError {
                message: String::from("integer out of range"),
            },
            pair.as_span(),
        )
    })
}

fn custom_error(line: &str, message: &str) -> pest::error::Error<Rule> {
    pest::error::Error::new_from_pos(
        pest::error::ErrorVariant::CustomError {
            message: String::from(message),
        },
        pest::Position::from_start(line),
    )
}
