use serde_json::Value;
use tracing::debug;

use crate::error::{CompileError, Result};
use crate::graph::{
    validation, DataNode, DataRole, DataType, Edge, EdgeKind, EnactmentGraph, FunctionKind, Node,
    NodeIndex, NodeKind,
};

/// Mutable accumulator threaded through the compiler. Every node and edge of
/// the enactment graph is created through this type.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    graph: EnactmentGraph,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read access to the graph built so far.
    pub fn graph(&self) -> &EnactmentGraph {
        &self.graph
    }

    pub fn find(&self, id: &str) -> Option<NodeIndex> {
        self.graph.find(id)
    }

    pub fn function_node(&mut self, id: &str, kind: FunctionKind) -> Result<NodeIndex> {
        if self.graph.find(id).is_some() {
            return Err(CompileError::DuplicateNode {
                node: id.to_string(),
            });
        }
        Ok(self.push(id, NodeKind::Function(kind)))
    }

    /// Get-or-create an intermediate data node. A second request with the same
    /// id returns the existing handle as long as the type agrees.
    pub fn data_node(&mut self, id: &str, data_type: DataType) -> Result<NodeIndex> {
        match self.graph.find(id) {
            Some(idx) => {
                let data = self.expect_data(idx)?;
                if data.data_type != data_type {
                    return Err(CompileError::TypeMismatch {
                        node: id.to_string(),
                        expected: data_type,
                        found: data.data_type,
                    });
                }
                Ok(idx)
            }
            None => Ok(self.push(id, NodeKind::Data(DataNode::intermediate(data_type)))),
        }
    }

    /// Creates a data node with a fixed role. Fails if the id is taken.
    pub fn add_data_node(&mut self, id: &str, data: DataNode) -> Result<NodeIndex> {
        if self.graph.find(id).is_some() {
            return Err(CompileError::DuplicateNode {
                node: id.to_string(),
            });
        }
        Ok(self.push(id, NodeKind::Data(data)))
    }

    pub fn root_node(&mut self, id: &str, data_type: DataType, key: &str) -> Result<NodeIndex> {
        self.add_data_node(id, DataNode::root(data_type, key))
    }

    /// Get-or-create a constant. Re-requesting an existing id is only valid
    /// for a constant of the same type.
    pub fn constant_node(
        &mut self,
        id: &str,
        data_type: DataType,
        content: Value,
    ) -> Result<NodeIndex> {
        let Some(idx) = self.graph.find(id) else {
            return Ok(self.push(id, NodeKind::Data(DataNode::constant(data_type, content))));
        };
        let data = self.expect_data(idx)?;
        if data.role != DataRole::Constant {
            return Err(CompileError::DuplicateNode {
                node: id.to_string(),
            });
        }
        if data.data_type != data_type {
            return Err(CompileError::TypeMismatch {
                node: id.to_string(),
                expected: data_type,
                found: data.data_type,
            });
        }
        Ok(idx)
    }

    pub fn decision_node(&mut self, id: &str) -> Result<NodeIndex> {
        self.add_data_node(id, DataNode::decision())
    }

    pub fn sequentiality_node(&mut self, id: &str) -> Result<NodeIndex> {
        self.add_data_node(id, DataNode::sequentiality())
    }

    /// Binds a workflow output to a data node. Intermediates become leaves;
    /// roots and constants keep their role. A node may serve several outputs.
    pub fn mark_leaf(&mut self, idx: NodeIndex, data_type: DataType, key: &str) -> Result<()> {
        let node = &mut self.graph.nodes[idx.0];
        let NodeKind::Data(data) = &mut node.kind else {
            return Err(CompileError::argument(&node.id, "a function cannot be an output"));
        };
        if matches!(data.role, DataRole::Decision | DataRole::Sequentiality) {
            return Err(CompileError::argument(
                &node.id,
                format!("{:?} node cannot become an output", data.role),
            ));
        }
        if data.data_type != data_type {
            return Err(CompileError::TypeMismatch {
                node: node.id.clone(),
                expected: data_type,
                found: data.data_type,
            });
        }
        if data.role == DataRole::Intermediate {
            data.role = DataRole::Leaf;
        }
        data.output_keys.push(key.to_string());
        Ok(())
    }

    pub fn connect(&mut self, source: NodeIndex, target: NodeIndex, key: &str) -> Result<()> {
        self.add_edge(source, target, EdgeKind::Data, key)
    }

    pub fn connect_if(
        &mut self,
        source: NodeIndex,
        target: NodeIndex,
        key: &str,
        activation: bool,
    ) -> Result<()> {
        self.add_edge(source, target, EdgeKind::ControlIf { activation }, key)
    }

    /// Validates the accumulated graph and freezes it.
    pub fn build(self) -> Result<EnactmentGraph> {
        validation::validate(&self.graph)?;
        debug!(
            nodes = self.graph.node_count(),
            edges = self.graph.edge_count(),
            "enactment graph built"
        );
        Ok(self.graph)
    }

    fn push(&mut self, id: &str, kind: NodeKind) -> NodeIndex {
        let idx = NodeIndex(self.graph.nodes.len());
        self.graph.nodes.push(Node {
            id: id.to_string(),
            kind,
        });
        self.graph.index.insert(id.to_string(), idx);
        self.graph.incoming.push(Vec::new());
        self.graph.outgoing.push(Vec::new());
        idx
    }

    fn expect_data(&self, idx: NodeIndex) -> Result<&DataNode> {
        let node = self.graph.node(idx);
        node.as_data().ok_or_else(|| CompileError::DuplicateNode {
            node: node.id.clone(),
        })
    }

    fn add_edge(
        &mut self,
        source: NodeIndex,
        target: NodeIndex,
        kind: EdgeKind,
        key: &str,
    ) -> Result<()> {
        let (src, dst) = (self.graph.node(source), self.graph.node(target));
        if src.is_function() == dst.is_function() {
            return Err(CompileError::GraphIntegrity {
                node: dst.id.clone(),
                reason: format!("edge from `{}` must join data and function nodes", src.id),
            });
        }
        // Data flowing back into the function that produces it.
        if dst.is_function() && self.graph.has_edge(target, source) {
            return Err(CompileError::CyclicReference {
                function: dst.id.clone(),
                reference: src.id.clone(),
            });
        }

        let edge_idx = self.graph.edges.len();
        self.graph.edges.push(Edge {
            source,
            target,
            kind,
            key: key.to_string(),
        });
        self.graph.outgoing[source.0].push(edge_idx);
        self.graph.incoming[target.0].push(edge_idx);
        Ok(())
    }
}
