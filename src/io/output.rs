use anyhow::{anyhow, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::info;

use crate::graph::{EnactmentGraph, NodeIndex};

/// Receives the result object once all leaves are available.
pub trait OutputDataHandler {
    fn handle_output_data(&mut self, output_data: &Map<String, Value>) -> Result<()>;
}

/// Logs the result object.
#[derive(Debug, Default)]
pub struct OutputDataPrinter;

impl OutputDataHandler for OutputDataPrinter {
    fn handle_output_data(&mut self, output_data: &Map<String, Value>) -> Result<()> {
        let result = Value::Object(output_data.clone());
        info!(result = %result, "enactment finished");
        Ok(())
    }
}

/// Builds the result object from leaf values. A leaf bound to several
/// workflow outputs appears under each of their keys.
pub fn collect_outputs(
    graph: &EnactmentGraph,
    values: &BTreeMap<NodeIndex, Value>,
) -> Result<Map<String, Value>> {
    let mut output = Map::new();
    for (idx, node) in graph.leaves() {
        let Some(data) = node.as_data() else { continue };
        for key in &data.output_keys {
            let value = values
                .get(&idx)
                .ok_or_else(|| anyhow!("no value for output `{}` (node `{}`)", key, node.id))?;
            output.insert(key.clone(), value.clone());
        }
    }
    Ok(output)
}
