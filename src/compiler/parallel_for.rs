//! Loop constructs: distribution, per-iteration body and aggregation.

use std::collections::HashSet;
use tracing::{debug, info};

use crate::compiler::expander::Expander;
use crate::compiler::{collections, data_type, literal_value, reference, scope};
use crate::dsl::{DataIn, DataOut, ParallelFor};
use crate::error::{CompileError, Result};
use crate::graph::{DataFlowKind, DataType, FunctionKind, GraphBuilder, NodeIndex};

/// How a loop decides its iterations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IteratorPlan {
    /// Fixed number of iterations.
    Count(i64),
    /// Number of iterations read from a data node at runtime.
    CountReference(String),
    /// One iteration per element of each named loop input.
    Collections(Vec<String>),
}

/// Classifies the iterator list of a loop. Count styles must stand alone.
pub fn classify_iterators(parallel_for: &ParallelFor) -> Result<IteratorPlan> {
    let name = parallel_for.name.as_str();
    let iterators: Vec<&str> = parallel_for.iterators.iter().map(|it| it.trim()).collect();
    let mut counts: Vec<IteratorPlan> = iterators
        .iter()
        .filter_map(|it| count_style(parallel_for, it))
        .collect();

    if iterators.is_empty() {
        return Err(CompileError::argument(name, "empty iterator list"));
    }
    if counts.is_empty() {
        for iterator in &iterators {
            if !parallel_for.data_ins.iter().any(|d| d.name == *iterator) {
                return Err(CompileError::missing(name, iterator));
            }
        }
        return Ok(IteratorPlan::Collections(
            iterators.iter().map(|it| it.to_string()).collect(),
        ));
    }
    if iterators.len() == 1 {
        if let Some(plan) = counts.pop() {
            return Ok(plan);
        }
    }
    Err(CompileError::argument(
        name,
        "count iterators cannot be combined with other iterators",
    ))
}

fn count_style(parallel_for: &ParallelFor, iterator: &str) -> Option<IteratorPlan> {
    if let Ok(count) = iterator.parse::<i64>() {
        return Some(IteratorPlan::Count(count));
    }
    if reference::is_src_string(iterator) {
        return Some(IteratorPlan::CountReference(iterator.to_string()));
    }
    // A loop input bound to an integer literal.
    parallel_for
        .data_ins
        .iter()
        .find(|d| d.name == iterator)
        .and_then(|d| d.source.as_deref())
        .and_then(|source| source.trim().parse::<i64>().ok())
        .map(IteratorPlan::Count)
}

pub fn expand_parallel_for(
    expander: &Expander<'_>,
    parallel_for: &ParallelFor,
    graph: &mut GraphBuilder,
) -> Result<Vec<NodeIndex>> {
    let name = parallel_for.name.as_str();
    let plan = classify_iterators(parallel_for)?;
    debug!(parallel_for = name, plan = ?plan, "iterators classified");

    let distribution_id = reference::synthetic_id(&[name, reference::DISTRIBUTION]);
    let distribution = graph.function_node(
        &distribution_id,
        FunctionKind::DataFlow(DataFlowKind::Distribution {
            scope: name.to_string(),
        }),
    )?;
    let mut introduced = vec![distribution];

    match plan {
        IteratorPlan::Count(count) => {
            let constant_id = reference::synthetic_id(&[distribution_id.as_str(), reference::KEY_ITERATIONS]);
            let constant = graph.constant_node(&constant_id, DataType::Number, count.into())?;
            graph.connect(constant, distribution, reference::KEY_ITERATIONS)?;
            let body = expand_counted_body(expander, parallel_for, distribution, graph)?;
            introduced.extend(body);
        }
        IteratorPlan::CountReference(count_ref) => {
            let resolved = scope::resolve(&count_ref, expander.workflow())?;
            let count = if reference::is_src_string(&resolved) {
                graph.data_node(&resolved, DataType::Number)?
            } else {
                let constant_id =
                    reference::synthetic_id(&[distribution_id.as_str(), reference::KEY_ITERATIONS]);
                let value = literal_value(&constant_id, DataType::Number, &resolved)?;
                graph.constant_node(&constant_id, DataType::Number, value)?
            };
            graph.connect(count, distribution, reference::KEY_ITERATIONS)?;
            let body = expand_counted_body(expander, parallel_for, distribution, graph)?;
            introduced.extend(body);
        }
        IteratorPlan::Collections(iterators) => {
            for iterator in &iterators {
                let data_in = parallel_for
                    .data_ins
                    .iter()
                    .find(|d| d.name == *iterator)
                    .ok_or_else(|| CompileError::missing(name, iterator))?;
                introduced.extend(distribute(expander, name, data_in, distribution, graph)?);
            }
            let body = expander.expand_body(&parallel_for.loop_body, graph)?;
            sequence_roots(graph, &distribution_id, distribution, &body)?;
            introduced.extend(body);
        }
    }

    for data_out in &parallel_for.data_outs {
        introduced.push(aggregate(expander, name, data_out, graph)?);
    }

    info!(parallel_for = name, functions = introduced.len(), "parallel-for expanded");
    Ok(introduced)
}

/// Expands the body of a counted loop; every body function consumes the
/// per-iteration marker.
fn expand_counted_body(
    expander: &Expander<'_>,
    parallel_for: &ParallelFor,
    distribution: NodeIndex,
    graph: &mut GraphBuilder,
) -> Result<Vec<NodeIndex>> {
    let distribution_id = graph.graph().node(distribution).id.clone();
    let marker_id = reference::synthetic_id(&[distribution_id.as_str(), reference::KEY_ITERATION]);
    let marker = graph.data_node(&marker_id, DataType::Boolean)?;
    graph.connect(distribution, marker, reference::KEY_ITERATION)?;

    let body = expander.expand_body(&parallel_for.loop_body, graph)?;
    for function in &body {
        graph.connect(marker, *function, reference::KEY_ITERATION)?;
    }
    Ok(body)
}

/// Wires one collection iterator into the distribution node and creates the
/// per-iteration data node.
fn distribute(
    expander: &Expander<'_>,
    loop_name: &str,
    data_in: &DataIn,
    distribution: NodeIndex,
    graph: &mut GraphBuilder,
) -> Result<Vec<NodeIndex>> {
    let port = reference::data_node_id(loop_name, &data_in.name);
    let source = data_in
        .source
        .as_deref()
        .ok_or_else(|| CompileError::MissingSource {
            reference: port.clone(),
        })?;
    let resolved = if reference::is_src_string(source) {
        scope::resolve(source, expander.workflow())?
    } else {
        source.to_string()
    };
    if !reference::is_src_string(&resolved) {
        return Err(CompileError::argument(
            &port,
            format!("iterator bound to literal `{resolved}`"),
        ));
    }

    let raw = graph.data_node(&resolved, DataType::Collection)?;
    let chain = collections::apply_chain(graph, data_in, raw, DataType::Collection)?;
    graph.connect(chain.data, distribution, &data_in.name)?;

    let element_type = data_type(&port, &data_in.data_type)?;
    let element = graph.data_node(&port, element_type)?;
    graph.connect(distribution, element, &data_in.name)?;
    Ok(chain.functions)
}

/// Body functions that depend neither on the distribution node nor on other
/// body functions.
pub fn subgraph_roots(
    graph: &GraphBuilder,
    distribution: NodeIndex,
    body: &[NodeIndex],
) -> Vec<NodeIndex> {
    let graph = graph.graph();
    let inside: HashSet<NodeIndex> = body.iter().copied().collect();
    body.iter()
        .copied()
        .filter(|function| {
            !graph.predecessors(*function).any(|data| {
                graph
                    .predecessors(data)
                    .any(|producer| producer == distribution || inside.contains(&producer))
            })
        })
        .collect()
}

fn sequence_roots(
    graph: &mut GraphBuilder,
    distribution_id: &str,
    distribution: NodeIndex,
    body: &[NodeIndex],
) -> Result<()> {
    for root in subgraph_roots(graph, distribution, body) {
        let root_id = graph.graph().node(root).id.clone();
        let token_id = reference::synthetic_id(&[distribution_id, root_id.as_str()]);
        let token = graph.sequentiality_node(&token_id)?;
        graph.connect(distribution, token, reference::KEY_SEQUENTIALITY)?;
        graph.connect(token, root, reference::KEY_SEQUENTIALITY)?;
        debug!(root = %root_id, "sequentiality inserted");
    }
    Ok(())
}

fn aggregate(
    expander: &Expander<'_>,
    loop_name: &str,
    data_out: &DataOut,
    graph: &mut GraphBuilder,
) -> Result<NodeIndex> {
    let port = reference::data_node_id(loop_name, &data_out.name);
    if data_type(&port, &data_out.data_type)? != DataType::Collection {
        return Err(CompileError::argument(
            &port,
            "parallel-for outputs must be collections",
        ));
    }
    let source = data_out
        .source
        .as_deref()
        .ok_or_else(|| CompileError::MissingSource {
            reference: port.clone(),
        })?;
    let resolved = scope::resolve(source, expander.workflow())?;
    let per_iteration = graph
        .find(&resolved)
        .ok_or_else(|| CompileError::MissingSource {
            reference: resolved.clone(),
        })?;

    let aggregation_id = reference::synthetic_id(&[
        loop_name,
        reference::AGGREGATION,
        data_out.name.as_str(),
    ]);
    let aggregation = graph.function_node(
        &aggregation_id,
        FunctionKind::DataFlow(DataFlowKind::Aggregation {
            scope: loop_name.to_string(),
        }),
    )?;
    graph.connect(per_iteration, aggregation, reference::KEY_AGGREGATION)?;

    let aggregated = graph.data_node(&port, DataType::Collection)?;
    graph.connect(aggregation, aggregated, reference::KEY_AGGREGATION)?;
    Ok(aggregation)
}
