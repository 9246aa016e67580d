use tracing::debug;

use crate::compiler::{
    collections, condition, data_type, literal_value, parallel_for, reference, scope,
};
use crate::dsl::{AtomicFunction, DataIn, Function, Workflow};
use crate::error::{CompileError, Result};
use crate::graph::{DataType, FunctionKind, GraphBuilder, NodeIndex};

const FUNCTION_TYPE_SERVERLESS: &str = "serverless";
const FUNCTION_TYPE_LOCAL: &str = "local";
const PROPERTY_RESOURCE: &str = "resource";

/// Recursive translation of workflow functions into graph nodes. Every
/// expansion returns the function nodes it introduced, nested ones included.
pub struct Expander<'a> {
    workflow: &'a Workflow,
}

impl<'a> Expander<'a> {
    pub fn new(workflow: &'a Workflow) -> Self {
        Self { workflow }
    }

    pub fn workflow(&self) -> &'a Workflow {
        self.workflow
    }

    pub fn expand(&self, function: &Function, graph: &mut GraphBuilder) -> Result<Vec<NodeIndex>> {
        match function {
            Function::Atomic(atomic) => self.expand_atomic(atomic, graph),
            Function::Sequence(sequence) => self.expand_body(&sequence.sequence_body, graph),
            Function::Parallel(parallel) => {
                let mut introduced = Vec::new();
                for section in &parallel.parallel_body {
                    introduced.extend(self.expand_body(&section.section, graph)?);
                }
                Ok(introduced)
            }
            Function::Conditional(compound) => {
                condition::expand_conditional(self, compound, graph)
            }
            Function::ParallelFor(compound) => {
                parallel_for::expand_parallel_for(self, compound, graph)
            }
        }
    }

    pub fn expand_body(
        &self,
        body: &[Function],
        graph: &mut GraphBuilder,
    ) -> Result<Vec<NodeIndex>> {
        let mut introduced = Vec::new();
        for function in body {
            introduced.extend(self.expand(function, graph)?);
        }
        Ok(introduced)
    }

    fn expand_atomic(
        &self,
        atomic: &AtomicFunction,
        graph: &mut GraphBuilder,
    ) -> Result<Vec<NodeIndex>> {
        let name = atomic.name.as_str();
        let kind = match atomic.function_type.trim() {
            FUNCTION_TYPE_SERVERLESS => FunctionKind::Remote {
                resource: atomic.property(PROPERTY_RESOURCE).map(str::to_string),
            },
            FUNCTION_TYPE_LOCAL => FunctionKind::Local,
            other => return Err(CompileError::unsupported(name, "function type", other)),
        };
        let function = graph.function_node(name, kind)?;
        let mut introduced = vec![function];

        for data_in in &atomic.data_ins {
            introduced.extend(self.wire_input(name, function, data_in, graph)?);
        }

        for data_out in &atomic.data_outs {
            let id = reference::data_node_id(name, &data_out.name);
            let out_type = data_type(&id, &data_out.data_type)?;
            let data = graph.data_node(&id, out_type)?;
            graph.connect(function, data, &data_out.name)?;
        }

        debug!(
            function = name,
            inputs = atomic.data_ins.len(),
            outputs = atomic.data_outs.len(),
            "atomic function expanded"
        );
        Ok(introduced)
    }

    /// Connects one declared input to its consumer, through the collection
    /// chain when the input carries one. Returns the operation nodes created.
    fn wire_input(
        &self,
        consumer: &str,
        function: NodeIndex,
        data_in: &DataIn,
        graph: &mut GraphBuilder,
    ) -> Result<Vec<NodeIndex>> {
        let port = reference::data_node_id(consumer, &data_in.name);
        let in_type = data_type(&port, &data_in.data_type)?;
        let source = data_in
            .source
            .as_deref()
            .ok_or_else(|| CompileError::MissingSource {
                reference: port.clone(),
            })?;

        let resolved = if reference::is_src_string(source) {
            scope::resolve(source, self.workflow)?
        } else {
            source.to_string()
        };

        let has_chain = collections::has_collection_operations(data_in);
        let raw_type = if has_chain {
            DataType::Collection
        } else {
            in_type
        };

        let raw = if reference::is_src_string(&resolved) {
            let (producer, _) = reference::split(&resolved)?;
            if producer == consumer {
                return Err(CompileError::CyclicReference {
                    function: consumer.to_string(),
                    reference: resolved,
                });
            }
            graph.data_node(&resolved, raw_type)?
        } else {
            let value = literal_value(&port, raw_type, &resolved)?;
            graph.constant_node(&port, raw_type, value)?
        };

        let chain = collections::apply_chain(graph, data_in, raw, in_type)?;
        graph.connect(chain.data, function, &data_in.name)?;
        Ok(chain.functions)
    }
}
