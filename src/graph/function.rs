use serde::Serialize;
use std::fmt;

use crate::graph::DataType;

/// What a function node does when the engine reaches it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum FunctionKind {
    /// Runs inside the enactment engine.
    Local,
    /// Serverless function, optionally pinned to an endpoint.
    Remote { resource: Option<String> },
    Utility(UtilityKind),
    DataFlow(DataFlowKind),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "utility")]
pub enum UtilityKind {
    Condition {
        conditions: Vec<Condition>,
        summary: Summary,
    },
    ElementIndex {
        constraint: String,
        selectors: Vec<AxisSelector>,
    },
    CollectionOp {
        operation: CollectionOperation,
        constraint: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "dataflow")]
pub enum DataFlowKind {
    /// Fans a loop out; `scope` names the loop.
    Distribution { scope: String },
    /// Collects per-iteration results of a loop.
    Aggregation { scope: String },
    /// Forwards whichever branch result was produced.
    Multiplexer,
}

/// One comparison evaluated by a condition node. Operands are data node ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Condition {
    pub first: String,
    pub second: String,
    pub operator: Operator,
    pub negation: bool,
    pub data_type: DataType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Operator {
    Equal,
    Unequal,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Contains,
    StartsWith,
    EndsWith,
    And,
    Or,
}

impl Operator {
    pub fn from_afcl(operator: &str) -> Option<Operator> {
        match operator.trim() {
            "==" => Some(Operator::Equal),
            "!=" => Some(Operator::Unequal),
            "<" => Some(Operator::Less),
            "<=" => Some(Operator::LessEqual),
            ">" => Some(Operator::Greater),
            ">=" => Some(Operator::GreaterEqual),
            "contains" => Some(Operator::Contains),
            "startsWith" => Some(Operator::StartsWith),
            "endsWith" => Some(Operator::EndsWith),
            "and" | "&&" => Some(Operator::And),
            "or" | "||" => Some(Operator::Or),
            _ => None,
        }
    }
}

/// How the sub-conditions of a condition node are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Summary {
    #[default]
    And,
    Or,
}

impl Summary {
    pub fn from_afcl(summary: &str) -> Option<Summary> {
        match summary.trim() {
            "and" => Some(Summary::And),
            "or" => Some(Summary::Or),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CollectionOperation {
    Replicate,
    Split,
    Block,
    ElementIndex,
}

impl CollectionOperation {
    /// Maps a constraint name; `None` for constraints that are not collection
    /// operations.
    pub fn from_constraint(name: &str) -> Option<CollectionOperation> {
        match name.trim() {
            "replicate" => Some(CollectionOperation::Replicate),
            "split" => Some(CollectionOperation::Split),
            "block" => Some(CollectionOperation::Block),
            "element-index" => Some(CollectionOperation::ElementIndex),
            _ => None,
        }
    }
}

impl fmt::Display for CollectionOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CollectionOperation::Replicate => "Replicate",
            CollectionOperation::Split => "Split",
            CollectionOperation::Block => "Block",
            CollectionOperation::ElementIndex => "ElementIndex",
        };
        f.write_str(name)
    }
}

/// Access along one axis of an element-index operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AxisSelector {
    Index(Bound),
    Range { start: Bound, end: Bound, stride: Bound },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Bound {
    /// Blank in the constraint string; the engine picks the axis default.
    Default,
    Literal(i64),
    /// Supplied at runtime by the data node with this id.
    Reference(String),
}
