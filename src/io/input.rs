use anyhow::{anyhow, bail, Context as AnyhowContext, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use tracing::debug;

use crate::graph::{EnactmentGraph, NodeIndex};

/// Source of the JSON object a workflow is started with.
pub trait InputDataProvider {
    fn input_data(&self) -> &Map<String, Value>;
}

impl InputDataProvider for Map<String, Value> {
    fn input_data(&self) -> &Map<String, Value> {
        self
    }
}

/// Input object read from a JSON file.
#[derive(Debug, Clone)]
pub struct InputDataProviderFile {
    input_data: Map<String, Value>,
}

impl InputDataProviderFile {
    pub fn from_file(file_path: &str) -> Result<Self> {
        let content = fs::read_to_string(file_path)
            .with_context(|| format!("Failed to read input file from {}", file_path))?;
        Self::from_json(&content).with_context(|| format!("Invalid input file {}", file_path))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        match serde_json::from_str::<Value>(content).context("Failed to parse input JSON")? {
            Value::Object(input_data) => Ok(Self { input_data }),
            other => bail!("input must be a JSON object, found {}", kind_of(&other)),
        }
    }
}

impl InputDataProvider for InputDataProviderFile {
    fn input_data(&self) -> &Map<String, Value> {
        &self.input_data
    }
}

/// Assigns a value to every root node, looked up by its boundary key.
pub fn bind_inputs(
    graph: &EnactmentGraph,
    provider: &dyn InputDataProvider,
) -> Result<BTreeMap<NodeIndex, Value>> {
    let input = provider.input_data();
    let mut bound = BTreeMap::new();
    for (idx, node) in graph.roots() {
        let Some(data) = node.as_data() else { continue };
        let key = data.boundary_key.as_deref().unwrap_or(&node.id);
        let value = input
            .get(key)
            .ok_or_else(|| anyhow!("input `{}` missing for root `{}`", key, node.id))?;
        if !data.data_type.accepts(value) {
            bail!(
                "input `{}` for root `{}` must be {}, found {}",
                key,
                node.id,
                data.data_type,
                kind_of(value)
            );
        }
        debug!(root = %node.id, key, "input bound");
        bound.insert(idx, value.clone());
    }
    Ok(bound)
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "collection",
        Value::Object(_) => "object",
    }
}
