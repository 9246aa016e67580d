//! Branch constructs: condition evaluation, guarded branches and result
//! multiplexing.

use tracing::{debug, info};

use crate::compiler::expander::Expander;
use crate::compiler::{data_type, literal_value, reference, scope};
use crate::dsl::{ConditionEntry, DataOut, IfThenElse};
use crate::error::{CompileError, Result};
use crate::graph::{
    Condition, DataFlowKind, DataType, FunctionKind, GraphBuilder, NodeIndex, Operator, Summary,
    UtilityKind,
};

pub fn expand_conditional(
    expander: &Expander<'_>,
    compound: &IfThenElse,
    graph: &mut GraphBuilder,
) -> Result<Vec<NodeIndex>> {
    let (condition_fn, decision) = add_condition_function(expander, compound, graph)?;
    let mut introduced = vec![condition_fn];

    for (body, activation) in [(&compound.then_branch, true), (&compound.else_branch, false)] {
        let branch = expander.expand_body(body, graph)?;
        let decision_id = graph.graph().node(decision).id.clone();
        for function in &branch {
            graph.connect_if(decision, *function, &decision_id, activation)?;
        }
        debug!(
            conditional = %compound.name,
            branch = if activation { "then" } else { "else" },
            functions = branch.len(),
            "branch expanded"
        );
        introduced.extend(branch);
    }

    for data_out in &compound.data_outs {
        introduced.push(add_multiplexer(expander, compound, data_out, decision, graph)?);
    }

    info!(conditional = %compound.name, functions = introduced.len(), "conditional expanded");
    Ok(introduced)
}

/// Creates the evaluation node and its decision output.
fn add_condition_function(
    expander: &Expander<'_>,
    compound: &IfThenElse,
    graph: &mut GraphBuilder,
) -> Result<(NodeIndex, NodeIndex)> {
    let name = compound.name.as_str();
    let summary = Summary::from_afcl(&compound.condition.combined_with).ok_or_else(|| {
        CompileError::unsupported(name, "combinator", &compound.condition.combined_with)
    })?;
    if compound.condition.conditions.is_empty() {
        return Err(CompileError::argument(name, "condition list is empty"));
    }

    // Operands are wired after the node exists.
    let conditions = compound
        .condition
        .conditions
        .iter()
        .map(|entry| describe_condition(expander, name, entry))
        .collect::<Result<Vec<_>>>()?;

    let function = graph.function_node(
        name,
        FunctionKind::Utility(UtilityKind::Condition {
            conditions: conditions.iter().map(|(c, _)| c.clone()).collect(),
            summary,
        }),
    )?;

    for (condition, operands) in &conditions {
        for operand in operands {
            let data = match operand {
                Operand::Reference(id) => graph.data_node(id, condition.data_type)?,
                Operand::Constant(id, value) => {
                    graph.constant_node(id, condition.data_type, value.clone())?
                }
            };
            if !graph.graph().has_edge(data, function) {
                let key = graph.graph().node(data).id.clone();
                graph.connect(data, function, &key)?;
            }
        }
    }

    let decision_id = reference::synthetic_id(&[name, reference::DECISION]);
    let decision = graph.decision_node(&decision_id)?;
    graph.connect(function, decision, reference::KEY_DECISION)?;
    Ok((function, decision))
}

enum Operand {
    Reference(String),
    Constant(String, serde_json::Value),
}

fn describe_condition(
    expander: &Expander<'_>,
    name: &str,
    entry: &ConditionEntry,
) -> Result<(Condition, [Operand; 2])> {
    let operator = Operator::from_afcl(&entry.operator)
        .ok_or_else(|| CompileError::unsupported(name, "operator", &entry.operator))?;
    let data_type = data_type(name, &entry.data_type)?;
    let first = operand(expander, name, &entry.data1, data_type)?;
    let second = operand(expander, name, &entry.data2, data_type)?;
    let condition = Condition {
        first: operand_id(&first).to_string(),
        second: operand_id(&second).to_string(),
        operator,
        negation: entry.negation,
        data_type,
    };
    Ok((condition, [first, second]))
}

fn operand(
    expander: &Expander<'_>,
    name: &str,
    value: &str,
    data_type: DataType,
) -> Result<Operand> {
    let resolved = if reference::is_src_string(value) {
        scope::resolve(value, expander.workflow())?
    } else {
        value.to_string()
    };
    if reference::is_src_string(&resolved) {
        return Ok(Operand::Reference(resolved));
    }
    let id = reference::data_node_id(name, &resolved);
    let content = literal_value(&id, data_type, &resolved)?;
    Ok(Operand::Constant(id, content))
}

fn operand_id(operand: &Operand) -> &str {
    match operand {
        Operand::Reference(id) | Operand::Constant(id, _) => id,
    }
}

/// One multiplexer per declared output, forwarding whichever branch ran.
fn add_multiplexer(
    expander: &Expander<'_>,
    compound: &IfThenElse,
    data_out: &DataOut,
    decision: NodeIndex,
    graph: &mut GraphBuilder,
) -> Result<NodeIndex> {
    let output_ref = reference::data_node_id(&compound.name, &data_out.name);
    let source = data_out
        .source
        .as_deref()
        .ok_or_else(|| CompileError::MissingSource {
            reference: output_ref.clone(),
        })?;
    let (first, second) =
        reference::split_if_out(source).ok_or_else(|| CompileError::MalformedReference {
            reference: source.to_string(),
            reason: "conditional output must read `thenRef,elseRef`".to_string(),
        })?;

    let then_data = present(graph, &scope::resolve(first, expander.workflow())?)?;
    let else_data = present(graph, &scope::resolve(second, expander.workflow())?)?;

    let mux_id = reference::synthetic_id(&[
        compound.name.as_str(),
        reference::MULTIPLEXER,
        data_out.name.as_str(),
    ]);
    let mux = graph.function_node(&mux_id, FunctionKind::DataFlow(DataFlowKind::Multiplexer))?;
    graph.connect_if(then_data, mux, reference::KEY_THEN, true)?;
    graph.connect_if(else_data, mux, reference::KEY_ELSE, false)?;
    graph.connect(decision, mux, reference::KEY_DECISION)?;

    let out_type = data_type(&output_ref, &data_out.data_type)?;
    let result = graph.data_node(source, out_type)?;
    graph.connect(mux, result, reference::KEY_RESULT)?;
    Ok(mux)
}

fn present(graph: &GraphBuilder, id: &str) -> Result<NodeIndex> {
    graph.find(id).ok_or_else(|| CompileError::MissingSource {
        reference: id.to_string(),
    })
}
