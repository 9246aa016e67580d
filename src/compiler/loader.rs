use anyhow::{Context as AnyhowContext, Result};
use std::fs;

use crate::dsl::Workflow;

pub fn load_workflow_from_yaml(file_path: &str) -> Result<Workflow> {
    let yaml_content = fs::read_to_string(file_path)
        .with_context(|| format!("Failed to read YAML file from {}", file_path))?;

    load_workflow_from_str(&yaml_content)
        .with_context(|| format!("Failed to load workflow from {}", file_path))
}

pub fn load_workflow_from_str(yaml_content: &str) -> Result<Workflow> {
    // Function variants are written as single-key maps (`- function: {...}`).
    let deserializer = serde_yaml::Deserializer::from_str(yaml_content);
    let workflow: Workflow = serde_yaml::with::singleton_map_recursive::deserialize(deserializer)
        .context("Failed to deserialize workflow YAML")?;
    Ok(workflow)
}
