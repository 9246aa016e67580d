use tracing::{debug, info};

use crate::compiler::expander::Expander;
use crate::compiler::{data_type, reference, scope};
use crate::dsl::Workflow;
use crate::error::{CompileError, Result};
use crate::graph::{EnactmentGraph, GraphBuilder};

/// Top-level driver: workflow document in, validated enactment graph out.
#[derive(Debug, Default)]
pub struct Compiler;

impl Compiler {
    pub fn new() -> Self {
        Self
    }

    pub fn compile(&self, workflow: &Workflow) -> Result<EnactmentGraph> {
        info!(workflow = %workflow.name, "compiling workflow");
        let mut graph = GraphBuilder::new();

        // 1. Workflow inputs
        self.seed_roots(workflow, &mut graph)?;

        // 2. Body
        let expander = Expander::new(workflow);
        let functions = expander.expand_body(&workflow.workflow_body, &mut graph)?;
        debug!(functions = functions.len(), "workflow body expanded");

        // 3. Workflow outputs
        self.annotate_leaves(workflow, &mut graph)?;

        // 4. Validate
        let graph = graph.build()?;
        info!(
            workflow = %workflow.name,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "workflow compiled"
        );
        Ok(graph)
    }

    fn seed_roots(&self, workflow: &Workflow, graph: &mut GraphBuilder) -> Result<()> {
        for data_in in &workflow.data_ins {
            let id = reference::data_node_id(&workflow.name, &data_in.name);
            let root_type = data_type(&id, &data_in.data_type)?;
            let key = data_in.source.as_deref().unwrap_or(&data_in.name);
            graph.root_node(&id, root_type, key)?;
        }
        Ok(())
    }

    fn annotate_leaves(&self, workflow: &Workflow, graph: &mut GraphBuilder) -> Result<()> {
        for data_out in &workflow.data_outs {
            let port = reference::data_node_id(&workflow.name, &data_out.name);
            let source = data_out
                .source
                .as_deref()
                .ok_or_else(|| CompileError::MissingSource {
                    reference: port.clone(),
                })?;
            let resolved = scope::resolve(source, workflow)?;
            let node = graph
                .find(&resolved)
                .ok_or_else(|| CompileError::MissingSource {
                    reference: resolved.clone(),
                })?;
            let leaf_type = data_type(&port, &data_out.data_type)?;
            graph.mark_leaf(node, leaf_type, &data_out.name)?;
        }
        Ok(())
    }
}
