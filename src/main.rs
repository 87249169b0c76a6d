use clap::{
    crate_authors, crate_description, crate_name, crate_version, value_t, App, AppSettings, Arg,
    ArgMatches, SubCommand,
};
use kgmatch::{
    config::Params,
    context::GraphContext,
    evaluator::Evaluator,
    ground_truth::{GroundTruthBuilder, GroundTruthStore},
};
use log::info;
use std::{error::Error, fmt::Display, str::FromStr, time::Duration};

fn handle_info(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let params = parse_params(matches)?;
    let context = GraphContext::from_path(required(matches, "TRIPLES")?)?;
    println!(
        "{} {}",
        context.graph().info(),
        context.query_nodes(&params).len()
    );
    Ok(())
}

fn handle_ground_truth(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let params = parse_params(matches)?;
    let context = GraphContext::from_path(required(matches, "TRIPLES")?)?;
    let mut store = GroundTruthStore::open(required(matches, "STORE")?)?;
    if matches.is_present("fresh") {
        store.clear()?;
    }
    let queries = context.query_nodes(&params);
    let ground_truth =
        GroundTruthBuilder::new(&context, &params).build_into(&queries, &mut store)?;
    info!(
        "{} of {} queries have ground truth",
        ground_truth.len(),
        queries.len()
    );
    Ok(())
}

fn handle_evaluate(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let params = parse_params(matches)?;
    let context = GraphContext::from_path(required(matches, "TRIPLES")?)?;
    let ground_truth = GroundTruthStore::open(required(matches, "STORE")?)?.load()?;
    let metrics = Evaluator::new(&context, &params).evaluate(&ground_truth)?;
    println!("{}", metrics);
    Ok(())
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str, Box<dyn Error>> {
    matches
        .value_of(name)
        .ok_or_else(|| format!("missing argument {}", name).into())
}

/// Reads whichever tuning options the subcommand defines; the rest keep their defaults.
fn parse_params(matches: &ArgMatches) -> Result<Params, Box<dyn Error>> {
    let mut params = Params::new();
    if matches.is_present("shards") {
        params = params.shards(value_t!(matches, "shards", usize)?);
    }
    if matches.is_present("timeout") {
        params = params.ged_timeout(Duration::from_secs(value_t!(matches, "timeout", u64)?));
    }
    if matches.is_present("query-size-min") {
        params = params.query_size_min(value_t!(matches, "query-size-min", usize)?);
    }
    if matches.is_present("query-size-max") {
        params = params.query_size_max(value_t!(matches, "query-size-max", usize)?);
    }
    if matches.is_present("min-neighbor-edges") {
        params = params.min_neighbor_edges(value_t!(matches, "min-neighbor-edges", usize)?);
    }
    if matches.is_present("tolerance") {
        params = params.tolerance(value_t!(matches, "tolerance", f64)?);
    }
    if matches.is_present("max-iterations") {
        params = params.max_iterations(value_t!(matches, "max-iterations", usize)?);
    }
    Ok(params)
}

fn is_number<T>(value: String) -> Result<(), String>
where
    T: FromStr,
    T::Err: Display,
{
    value.parse::<T>().map(|_| ()).map_err(|e| e.to_string())
}

fn query_args<'a, 'b>() -> Vec<Arg<'a, 'b>> {
    vec![
        Arg::with_name("query-size-min")
            .help("Smallest local subgraph of a query node, the node included [default: 4]")
            .long("query-size-min")
            .takes_value(true)
            .validator(is_number::<usize>),
        Arg::with_name("query-size-max")
            .help("Largest local subgraph of a query node, the node included [default: 9]")
            .long("query-size-max")
            .takes_value(true)
            .validator(is_number::<usize>),
        Arg::with_name("min-neighbor-edges")
            .help("Fewest edges among the neighbors of a query node [default: 2]")
            .long("min-neighbor-edges")
            .takes_value(true)
            .validator(is_number::<usize>),
    ]
}

fn create_app<'a, 'b>() -> App<'a, 'b> {
    App::new(crate_name!())
        .about(crate_description!())
        .author(crate_authors!())
        .version(crate_version!())
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("info")
                .about("Displays node, edge, edge label and query node counts")
                .arg(Arg::with_name("TRIPLES").required(true))
                .args(&query_args()),
        )
        .subcommand(
            SubCommand::with_name("ground-truth")
                .about("Computes ground truth by graph edit distance")
                .after_help(
                    r"TRIPLES holds one `head<TAB>relation<TAB>tail` line per edge.
Finished shards are committed to STORE, so an interrupted run resumes where
it stopped when started again with the same queries and shard count.",
                )
                .arg(Arg::with_name("TRIPLES").required(true))
                .arg(Arg::with_name("STORE").required(true))
                .arg(
                    Arg::with_name("shards")
                        .help("Number of query shards [default: number of CPUs]")
                        .long("shards")
                        .takes_value(true)
                        .validator(is_number::<usize>),
                )
                .arg(
                    Arg::with_name("timeout")
                        .help("Seconds allowed per edit distance computation [default: 10]")
                        .long("timeout")
                        .takes_value(true)
                        .validator(is_number::<u64>),
                )
                .args(&query_args())
                .arg(
                    Arg::with_name("fresh")
                        .help("Discards any previous run stored in STORE")
                        .long("fresh")
                        .takes_value(false),
                ),
        )
        .subcommand(
            SubCommand::with_name("evaluate")
                .about("Scores the spectral ranking against the stored ground truth")
                .arg(Arg::with_name("TRIPLES").required(true))
                .arg(Arg::with_name("STORE").required(true))
                .arg(
                    Arg::with_name("tolerance")
                        .help("Power iteration stops below this change [default: 0.01]")
                        .long("tolerance")
                        .takes_value(true)
                        .validator(is_number::<f64>),
                )
                .arg(
                    Arg::with_name("max-iterations")
                        .help("Power iteration gives up after this many steps [default: 1000]")
                        .long("max-iterations")
                        .takes_value(true)
                        .validator(is_number::<usize>),
                ),
        )
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let matches = create_app().get_matches();
    let start_time = std::time::Instant::now();
    if let Some(matches) = matches.subcommand_matches("info") {
        handle_info(matches)?;
    } else if let Some(matches) = matches.subcommand_matches("ground-truth") {
        handle_ground_truth(matches)?;
    } else if let Some(matches) = matches.subcommand_matches("evaluate") {
        handle_evaluate(matches)?;
    }
    info!("done in {:.3} s", start_time.elapsed().as_secs_f64());
    Ok(())
}
