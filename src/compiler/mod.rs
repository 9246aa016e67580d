pub mod collections;
pub mod condition;
pub mod core;
pub mod expander;
pub mod loader;
pub mod parallel_for;
pub mod reference;
pub mod scope;

use serde_json::Value;

use crate::error::{CompileError, Result};
use crate::graph::DataType;

pub(crate) fn data_type(node: &str, type_string: &str) -> Result<DataType> {
    DataType::from_afcl(type_string)
        .ok_or_else(|| CompileError::unsupported(node, "data type", type_string))
}

/// Payload of a constant node. String literals are taken verbatim, anything
/// else must be JSON of the declared type.
pub(crate) fn literal_value(node: &str, data_type: DataType, literal: &str) -> Result<Value> {
    if data_type == DataType::String {
        return Ok(Value::String(literal.to_string()));
    }
    let value: Value = serde_json::from_str(literal.trim()).map_err(|e| {
        CompileError::argument(node, format!("literal `{literal}` is not valid JSON: {e}"))
    })?;
    if !data_type.accepts(&value) {
        return Err(CompileError::argument(
            node,
            format!("literal `{literal}` is not a {data_type}"),
        ));
    }
    Ok(value)
}
