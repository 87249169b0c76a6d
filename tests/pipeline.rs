use kgmatch::{
    config::Params,
    context::GraphContext,
    evaluator::Evaluator,
    ground_truth::{GroundTruthBuilder, GroundTruthStore},
    Error,
};
use std::io::Write;

// Three stars around 0, 4 and 8 with one chord each; 8's chord has another label.
const TRIPLES: &str = "\
0\t1\t1
0\t1\t2
0\t1\t3
1\t2\t2
4\t1\t5
4\t1\t6
4\t1\t7
5\t2\t6
8\t1\t9
8\t1\t10
8\t1\t11\r
9\t3\t10
";

fn create_triple_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_info() {
    let file = create_triple_file(TRIPLES);
    let context = GraphContext::from_path(file.path()).unwrap();
    assert_eq!(context.graph().info().to_string(), "12 12 3");
    let params = Params::new().min_neighbor_edges(1);
    assert_eq!(context.query_nodes(&params), [0, 4, 8]);
}

#[test]
fn test_pipeline() {
    let file = create_triple_file(TRIPLES);
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("ground_truth.sqlite3");
    let context = GraphContext::from_path(file.path()).unwrap();
    let params = Params::new().min_neighbor_edges(1).shards(2);
    let queries = context.query_nodes(&params);

    let mut store = GroundTruthStore::open(&store_path).unwrap();
    let ground_truth = GroundTruthBuilder::new(&context, &params)
        .build_into(&queries, &mut store)
        .unwrap();
    assert_eq!(ground_truth[&0], [4, 8]);
    assert_eq!(ground_truth[&4], [0, 8]);
    assert_eq!(ground_truth[&8], [0, 4]);
    drop(store);

    // A second run finds every shard committed.
    let mut store = GroundTruthStore::open(&store_path).unwrap();
    assert_eq!(store.resume(&queries, 2).unwrap().len(), 2);
    assert_eq!(store.load().unwrap(), ground_truth);

    let metrics = Evaluator::new(&context, &params)
        .evaluate(&store.load().unwrap())
        .unwrap();
    assert_eq!(metrics.num_evaluated, 3);
    // Every candidate is a true match, so the top two hold everything.
    assert_eq!(metrics.precision[1], 1.0);
    assert_eq!(metrics.recall[1], 1.0);
    assert!((metrics.precision[2] - 0.4).abs() < 1e-9);
    let lines: Vec<_> = metrics.to_string().lines().map(String::from).collect();
    assert_eq!(lines[0], "k = [1, 2, 5, 10, 20, 50, 100]");
    assert!(lines[1].starts_with("precision@k: [1.000 1.000 0.400 "));
}

#[test]
fn test_malformed_triples() {
    let file = create_triple_file("0\t1\t2\n3\t4\n");
    match GraphContext::from_path(file.path()) {
        Err(Error::Parse { line, .. }) => assert_eq!(line, 2),
        Err(e) => panic!("unexpected error {}", e),
        Ok(_) => panic!("accepted a malformed line"),
    }
}

#[test]
fn test_empty_triples() {
    let file = create_triple_file("");
    let context = GraphContext::from_path(file.path()).unwrap();
    assert_eq!(context.graph().num_nodes(), 0);
    assert!(context.query_nodes(&Params::new()).is_empty());
}
