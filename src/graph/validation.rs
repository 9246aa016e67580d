use crate::error::{CompileError, Result};
use crate::graph::EnactmentGraph;

/// Structural checks run once the graph is complete.
pub(crate) fn validate(graph: &EnactmentGraph) -> Result<()> {
    for (idx, node) in graph.data_nodes() {
        if graph.incident_edge_count(idx) == 0 {
            return Err(CompileError::GraphIntegrity {
                node: node.id.clone(),
                reason: "data node is not connected to any function".to_string(),
            });
        }
    }
    Ok(())
}
