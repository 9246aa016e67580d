//! The enactment graph: a bipartite dependency graph of data nodes and
//! function nodes, stored as an arena addressed by [`NodeIndex`].

pub mod builder;
mod data;
mod function;
mod validation;

pub use builder::GraphBuilder;
pub use data::{DataNode, DataRole, DataType};
pub use function::{
    AxisSelector, Bound, CollectionOperation, Condition, DataFlowKind, FunctionKind, Operator,
    Summary, UtilityKind,
};

use serde::Serialize;
use std::collections::HashMap;

/// Stable handle of a node inside one graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeIndex(usize);

impl NodeIndex {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub id: String,
    #[serde(flatten)]
    pub kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node")]
pub enum NodeKind {
    Function(FunctionKind),
    Data(DataNode),
}

impl Node {
    pub fn is_function(&self) -> bool {
        matches!(self.kind, NodeKind::Function(_))
    }

    pub fn is_data(&self) -> bool {
        matches!(self.kind, NodeKind::Data(_))
    }

    pub fn as_data(&self) -> Option<&DataNode> {
        match &self.kind {
            NodeKind::Data(data) => Some(data),
            NodeKind::Function(_) => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionKind> {
        match &self.kind {
            NodeKind::Function(function) => Some(function),
            NodeKind::Data(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum EdgeKind {
    Data,
    /// Activates the target only when the source's value equals `activation`.
    ControlIf { activation: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub source: NodeIndex,
    pub target: NodeIndex,
    pub kind: EdgeKind,
    /// Role of the edge at the consuming side.
    pub key: String,
}

/// Compiled, validated graph. Produced by [`GraphBuilder::build`] and not
/// modified afterwards.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EnactmentGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    #[serde(skip)]
    index: HashMap<String, NodeIndex>,
    #[serde(skip)]
    incoming: Vec<Vec<usize>>,
    #[serde(skip)]
    outgoing: Vec<Vec<usize>>,
}

impl EnactmentGraph {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node(&self, idx: NodeIndex) -> &Node {
        &self.nodes[idx.0]
    }

    pub fn find(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.find(id).map(|idx| self.node(idx))
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeIndex(i), n))
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn function_nodes(&self) -> impl Iterator<Item = (NodeIndex, &Node)> {
        self.nodes().filter(|(_, n)| n.is_function())
    }

    pub fn data_nodes(&self) -> impl Iterator<Item = (NodeIndex, &Node)> {
        self.nodes().filter(|(_, n)| n.is_data())
    }

    pub fn roots(&self) -> impl Iterator<Item = (NodeIndex, &Node)> {
        self.nodes()
            .filter(|(_, n)| n.as_data().is_some_and(DataNode::is_root))
    }

    pub fn leaves(&self) -> impl Iterator<Item = (NodeIndex, &Node)> {
        self.nodes()
            .filter(|(_, n)| n.as_data().is_some_and(DataNode::is_leaf))
    }

    pub fn in_edges(&self, idx: NodeIndex) -> impl Iterator<Item = &Edge> {
        self.incoming[idx.0].iter().map(|&e| &self.edges[e])
    }

    pub fn out_edges(&self, idx: NodeIndex) -> impl Iterator<Item = &Edge> {
        self.outgoing[idx.0].iter().map(|&e| &self.edges[e])
    }

    pub fn predecessors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> {
        self.in_edges(idx).map(|e| e.source)
    }

    pub fn successors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> {
        self.out_edges(idx).map(|e| e.target)
    }

    pub fn incident_edge_count(&self, idx: NodeIndex) -> usize {
        self.incoming[idx.0].len() + self.outgoing[idx.0].len()
    }

    pub fn has_edge(&self, source: NodeIndex, target: NodeIndex) -> bool {
        self.successors(source).any(|s| s == target)
    }
}
