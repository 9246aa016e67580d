use std::collections::HashSet;
use tracing::trace;

use crate::compiler::parallel_for::{self, IteratorPlan};
use crate::compiler::reference;
use crate::dsl::{DataIn, DataOut, Function, Workflow};
use crate::error::{CompileError, Result};

/// Resolves `reference` against `workflow`. The result is either the id of a
/// data node or, when the chain ends at a literal-bound compound input, that
/// literal.
pub fn resolve(reference: &str, workflow: &Workflow) -> Result<String> {
    let mut visited = HashSet::new();
    resolve_inner(reference, workflow, &mut visited)
}

fn resolve_inner(
    reference: &str,
    workflow: &Workflow,
    visited: &mut HashSet<String>,
) -> Result<String> {
    let (producer, name) = reference::split(reference)?;
    if producer == workflow.name {
        return Ok(reference.to_string());
    }
    if !visited.insert(reference.to_string()) {
        return Err(CompileError::CyclicReference {
            function: producer.to_string(),
            reference: reference.to_string(),
        });
    }
    trace!(reference, "resolving");

    let function = workflow
        .find_function(producer)
        .ok_or_else(|| CompileError::missing(&workflow.name, producer))?;

    match function {
        Function::Atomic(atomic) => {
            if atomic.data_outs.iter().any(|out| out.name == name) {
                Ok(reference.to_string())
            } else {
                Err(CompileError::missing(producer, name))
            }
        }
        Function::Sequence(_) | Function::Parallel(_) => {
            if let Some(input) = find_in(function, name) {
                follow(reference, input.source.as_deref(), workflow, visited)
            } else {
                let output = find_out(function, name)
                    .ok_or_else(|| CompileError::missing(producer, name))?;
                follow(reference, output.source.as_deref(), workflow, visited)
            }
        }
        Function::Conditional(_) => {
            if let Some(input) = find_in(function, name) {
                follow(reference, input.source.as_deref(), workflow, visited)
            } else {
                // The multiplexed result is stored under the declared source string.
                let output = find_out(function, name)
                    .ok_or_else(|| CompileError::missing(producer, name))?;
                output
                    .source
                    .clone()
                    .ok_or_else(|| CompileError::MissingSource {
                        reference: reference.to_string(),
                    })
            }
        }
        Function::ParallelFor(parallel_for) => {
            if let Some(input) = find_in(function, name) {
                let distributed = parallel_for.iterators.iter().any(|it| it == name)
                    && matches!(
                        parallel_for::classify_iterators(parallel_for)?,
                        IteratorPlan::Collections(_)
                    );
                if distributed {
                    // Per-iteration element node.
                    Ok(reference.to_string())
                } else {
                    follow(reference, input.source.as_deref(), workflow, visited)
                }
            } else if find_out(function, name).is_some() {
                // Aggregated collection node.
                Ok(reference.to_string())
            } else {
                Err(CompileError::missing(producer, name))
            }
        }
    }
}

fn find_in<'a>(function: &'a Function, name: &str) -> Option<&'a DataIn> {
    function.data_ins().iter().find(|d| d.name == name)
}

fn find_out<'a>(function: &'a Function, name: &str) -> Option<&'a DataOut> {
    function.data_outs().iter().find(|d| d.name == name)
}

fn follow(
    reference: &str,
    source: Option<&str>,
    workflow: &Workflow,
    visited: &mut HashSet<String>,
) -> Result<String> {
    match source {
        Some(source) if reference::is_src_string(source) => {
            resolve_inner(source, workflow, visited)
        }
        // Literal bound to a compound port.
        Some(literal) => Ok(literal.to_string()),
        None => Err(CompileError::MissingSource {
            reference: reference.to_string(),
        }),
    }
}
