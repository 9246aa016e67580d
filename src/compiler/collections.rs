use tracing::debug;

use crate::compiler::reference;
use crate::dsl::{DataIn, PropertyConstraint};
use crate::error::{CompileError, Result};
use crate::graph::{
    AxisSelector, Bound, CollectionOperation, DataType, FunctionKind, GraphBuilder, NodeIndex,
    UtilityKind,
};

const BLOCK_SEPARATOR: char = ',';
const AXIS_SEPARATOR: char = ',';
const RANGE_SEPARATOR: char = ':';

/// Result of running a constraint chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainOutcome {
    /// Data node the consumer reads from.
    pub data: NodeIndex,
    /// Operation nodes created by this chain.
    pub functions: Vec<NodeIndex>,
}

pub fn has_collection_operations(data_in: &DataIn) -> bool {
    operations(data_in).next().is_some()
}

fn operations(data_in: &DataIn) -> impl Iterator<Item = (CollectionOperation, &PropertyConstraint)> {
    data_in.constraints.iter().filter_map(|constraint| {
        CollectionOperation::from_constraint(&constraint.name).map(|op| (op, constraint))
    })
}

/// Splits an element-index constraint into axis groups of one to three
/// sub-tokens each.
pub fn element_index_groups(constraint: &str) -> Result<Vec<Vec<String>>> {
    constraint
        .split(AXIS_SEPARATOR)
        .map(|axis| {
            let parts: Vec<String> = axis
                .split(RANGE_SEPARATOR)
                .map(|part| part.trim().to_string())
                .collect();
            if parts.len() > 3 {
                return Err(malformed(constraint, "an axis has more than start:end:stride"));
            }
            Ok(parts)
        })
        .collect()
}

/// Flat token list of one constraint, validated for its operation.
pub fn tokenize(operation: CollectionOperation, constraint: &str) -> Result<Vec<String>> {
    let tokens = match operation {
        CollectionOperation::Replicate | CollectionOperation::Split => {
            vec![constraint.trim().to_string()]
        }
        CollectionOperation::Block => {
            let tokens: Vec<String> = constraint
                .split(BLOCK_SEPARATOR)
                .map(|t| t.trim().to_string())
                .collect();
            if tokens.len() != 2 {
                return Err(malformed(constraint, "block takes exactly `start,end`"));
            }
            tokens
        }
        CollectionOperation::ElementIndex => {
            element_index_groups(constraint)?.into_iter().flatten().collect()
        }
    };

    for token in &tokens {
        if reference::is_src_string(token) {
            continue;
        }
        if token.is_empty() {
            if operation == CollectionOperation::ElementIndex {
                continue;
            }
            return Err(malformed(constraint, "blank value"));
        }
        if token.parse::<i64>().is_err() {
            return Err(malformed(
                constraint,
                format!("`{token}` is neither an integer nor a reference"),
            ));
        }
    }
    Ok(tokens)
}

/// Parsed form of an element-index constraint.
pub fn parse_selectors(constraint: &str) -> Result<Vec<AxisSelector>> {
    element_index_groups(constraint)?
        .iter()
        .map(|group| {
            let bounds = group
                .iter()
                .map(|token| bound(constraint, token))
                .collect::<Result<Vec<_>>>()?;
            Ok(match bounds.as_slice() {
                [index] => AxisSelector::Index(index.clone()),
                [start, end] => AxisSelector::Range {
                    start: start.clone(),
                    end: end.clone(),
                    stride: Bound::Default,
                },
                [start, end, stride] => AxisSelector::Range {
                    start: start.clone(),
                    end: end.clone(),
                    stride: stride.clone(),
                },
                _ => return Err(malformed(constraint, "empty axis")),
            })
        })
        .collect()
}

fn bound(constraint: &str, token: &str) -> Result<Bound> {
    if token.is_empty() {
        Ok(Bound::Default)
    } else if reference::is_src_string(token) {
        Ok(Bound::Reference(token.to_string()))
    } else {
        token
            .parse()
            .map(Bound::Literal)
            .map_err(|_| malformed(constraint, format!("`{token}` is not an integer")))
    }
}

/// Applies the collection constraints of `data_in` to the data node `source`.
/// Without collection constraints the source is returned untouched.
pub fn apply_chain(
    graph: &mut GraphBuilder,
    data_in: &DataIn,
    source: NodeIndex,
    consumer_type: DataType,
) -> Result<ChainOutcome> {
    let steps: Vec<_> = operations(data_in).collect();
    let mut outcome = ChainOutcome {
        data: source,
        functions: Vec::new(),
    };
    if steps.is_empty() {
        return Ok(outcome);
    }

    let raw = graph.graph().node(source);
    let raw_type = raw.as_data().map(|d| d.data_type);
    if raw_type != Some(DataType::Collection) {
        return Err(CompileError::argument(
            &raw.id,
            "collection operations need collection data",
        ));
    }

    let last = steps.len() - 1;
    for (position, (operation, constraint)) in steps.into_iter().enumerate() {
        let result_type = if position == last {
            step_result_type(operation, &constraint.value, consumer_type)?
        } else {
            DataType::Collection
        };
        let (data, created) = apply_step(
            graph,
            &data_in.name,
            outcome.data,
            operation,
            &constraint.value,
            result_type,
        )?;
        outcome.data = data;
        outcome.functions.extend(created);
    }

    let final_node = graph.graph().node(outcome.data);
    if let Some(found) = final_node.as_data().map(|d| d.data_type) {
        if found != consumer_type {
            return Err(CompileError::TypeMismatch {
                node: final_node.id.clone(),
                expected: consumer_type,
                found,
            });
        }
    }
    Ok(outcome)
}

// A single-axis plain index yields one element; everything else a collection.
fn step_result_type(
    operation: CollectionOperation,
    constraint: &str,
    consumer_type: DataType,
) -> Result<DataType> {
    if operation != CollectionOperation::ElementIndex {
        return Ok(DataType::Collection);
    }
    let groups = element_index_groups(constraint)?;
    if groups.len() == 1 && groups[0].len() == 1 {
        Ok(consumer_type)
    } else {
        Ok(DataType::Collection)
    }
}

fn apply_step(
    graph: &mut GraphBuilder,
    key: &str,
    predecessor: NodeIndex,
    operation: CollectionOperation,
    constraint: &str,
    result_type: DataType,
) -> Result<(NodeIndex, Option<NodeIndex>)> {
    let predecessor_id = graph.graph().node(predecessor).id.clone();
    let op_name = operation.to_string();
    let result_id = reference::synthetic_id(&[predecessor_id.as_str(), op_name.as_str(), constraint]);

    if graph.find(&result_id).is_some() {
        // Same chain seen before.
        let existing = graph.data_node(&result_id, result_type)?;
        return Ok((existing, None));
    }

    let tokens = tokenize(operation, constraint)?;
    let kind = match operation {
        CollectionOperation::ElementIndex => UtilityKind::ElementIndex {
            constraint: constraint.to_string(),
            selectors: parse_selectors(constraint)?,
        },
        _ => UtilityKind::CollectionOp {
            operation,
            constraint: constraint.to_string(),
        },
    };
    let function_id = reference::synthetic_id(&[op_name.as_str(), predecessor_id.as_str(), constraint]);
    let function = graph.function_node(&function_id, FunctionKind::Utility(kind))?;
    graph.connect(predecessor, function, key)?;

    let mut attached: Vec<&str> = Vec::new();
    for token in tokens.iter().filter(|t| reference::is_src_string(t)) {
        if attached.contains(&token.as_str()) {
            continue;
        }
        let input = graph.data_node(token, DataType::Number)?;
        graph.connect(input, function, token)?;
        attached.push(token);
    }

    let result = graph.data_node(&result_id, result_type)?;
    graph.connect(function, result, key)?;
    debug!(function = %function_id, result = %result_id, "collection operation");
    Ok((result, Some(function)))
}

fn malformed(constraint: &str, reason: impl Into<String>) -> CompileError {
    CompileError::MalformedConstraint {
        constraint: constraint.to_string(),
        reason: reason.into(),
    }
}
