use derive_more::Display;

#[derive(Debug, Display, PartialEq, Eq)]
#[display(fmt = "{} {} {}", num_nodes, num_edges, num_elabels)]
pub struct GraphInfo {
    num_nodes: usize,
    num_edges: usize,
    num_elabels: usize,
}

impl GraphInfo {
    pub fn new(num_nodes: usize, num_edges: usize, num_elabels: usize) -> Self {
        Self {
            num_nodes,
            num_edges,
            num_elabels,
        }
    }
}
