use crate::error::{CompileError, Result};

/// Separates producer and data name in `producer/name`.
pub const SOURCE_AFFIX: char = '/';
/// Joins the parts of synthesized node ids.
pub const SEPARATOR: &str = "--";
/// Separates the two candidates of a conditional output source.
pub const IF_OUT_SEPARATOR: char = ',';

pub const DISTRIBUTION: &str = "Distribution";
pub const AGGREGATION: &str = "Aggregation";
pub const MULTIPLEXER: &str = "Multiplexer";
pub const DECISION: &str = "decision";

// Edge keys.
pub const KEY_DECISION: &str = "decision";
pub const KEY_THEN: &str = "then";
pub const KEY_ELSE: &str = "else";
pub const KEY_RESULT: &str = "result";
pub const KEY_ITERATIONS: &str = "iterations";
pub const KEY_ITERATION: &str = "iteration";
pub const KEY_SEQUENTIALITY: &str = "sequentiality";
pub const KEY_AGGREGATION: &str = "aggregation";

/// A string has reference shape when it contains the affix but neither starts
/// nor ends with it.
pub fn is_src_string(value: &str) -> bool {
    value.contains(SOURCE_AFFIX)
        && !value.starts_with(SOURCE_AFFIX)
        && !value.ends_with(SOURCE_AFFIX)
}

/// Splits `producer/name` at the first affix.
pub fn split(reference: &str) -> Result<(&str, &str)> {
    if !is_src_string(reference) {
        return Err(CompileError::MalformedReference {
            reference: reference.to_string(),
            reason: "expected `producer/name`".to_string(),
        });
    }
    reference
        .split_once(SOURCE_AFFIX)
        .ok_or_else(|| CompileError::MalformedReference {
            reference: reference.to_string(),
            reason: "expected `producer/name`".to_string(),
        })
}

pub fn data_node_id(producer: &str, name: &str) -> String {
    format!("{producer}{SOURCE_AFFIX}{name}")
}

/// Joins id parts with [`SEPARATOR`].
pub fn synthetic_id(parts: &[&str]) -> String {
    parts.join(SEPARATOR)
}

/// Splits `first,second` of a conditional output.
pub fn split_if_out(source: &str) -> Option<(&str, &str)> {
    let (first, second) = source.split_once(IF_OUT_SEPARATOR)?;
    let (first, second) = (first.trim(), second.trim());
    if is_src_string(first) && is_src_string(second) {
        Some((first, second))
    } else {
        None
    }
}

