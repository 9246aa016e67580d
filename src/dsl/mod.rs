//! Workflow documents as written by users: a named workflow whose body nests
//! atomic functions inside sequences, parallel blocks, branches and loops.

pub mod builder;

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub name: String,
    #[serde(default)]
    pub data_ins: Vec<DataIn>,
    #[serde(default)]
    pub data_outs: Vec<DataOut>,
    #[serde(default)]
    pub workflow_body: Vec<Function>,
}

impl Workflow {
    /// Depth-first lookup of a function by name, anywhere in the body.
    pub fn find_function(&self, name: &str) -> Option<&Function> {
        fn search<'a>(body: &'a [Function], name: &str) -> Option<&'a Function> {
            for function in body {
                if function.name() == name {
                    return Some(function);
                }
                if let Some(found) = search_children(function, name) {
                    return Some(found);
                }
            }
            None
        }

        fn search_children<'a>(function: &'a Function, name: &str) -> Option<&'a Function> {
            function
                .bodies()
                .into_iter()
                .find_map(|body| search(body, name))
        }

        search(&self.workflow_body, name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum Function {
    #[serde(rename = "function")]
    Atomic(AtomicFunction),
    Sequence(Sequence),
    Parallel(Parallel),
    #[serde(rename = "if")]
    Conditional(IfThenElse),
    ParallelFor(ParallelFor),
}

impl Function {
    pub fn name(&self) -> &str {
        match self {
            Function::Atomic(f) => &f.name,
            Function::Sequence(f) => &f.name,
            Function::Parallel(f) => &f.name,
            Function::Conditional(f) => &f.name,
            Function::ParallelFor(f) => &f.name,
        }
    }

    pub fn data_ins(&self) -> &[DataIn] {
        match self {
            Function::Atomic(f) => &f.data_ins,
            Function::Sequence(f) => &f.data_ins,
            Function::Parallel(f) => &f.data_ins,
            Function::Conditional(f) => &f.data_ins,
            Function::ParallelFor(f) => &f.data_ins,
        }
    }

    pub fn data_outs(&self) -> &[DataOut] {
        match self {
            Function::Atomic(f) => &f.data_outs,
            Function::Sequence(f) => &f.data_outs,
            Function::Parallel(f) => &f.data_outs,
            Function::Conditional(f) => &f.data_outs,
            Function::ParallelFor(f) => &f.data_outs,
        }
    }

    /// The nested bodies of a compound, in document order.
    pub fn bodies(&self) -> Vec<&[Function]> {
        match self {
            Function::Atomic(_) => Vec::new(),
            Function::Sequence(f) => vec![f.sequence_body.as_slice()],
            Function::Parallel(f) => f.parallel_body.iter().map(|s| s.section.as_slice()).collect(),
            Function::Conditional(f) => vec![f.then_branch.as_slice(), f.else_branch.as_slice()],
            Function::ParallelFor(f) => vec![f.loop_body.as_slice()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AtomicFunction {
    pub name: String,
    /// Execution kind, e.g. `serverless` or `local`.
    #[serde(rename = "type")]
    pub function_type: String,
    #[serde(default)]
    pub data_ins: Vec<DataIn>,
    #[serde(default)]
    pub data_outs: Vec<DataOut>,
    #[serde(default)]
    pub properties: Vec<PropertyConstraint>,
}

impl AtomicFunction {
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Sequence {
    pub name: String,
    #[serde(default)]
    pub data_ins: Vec<DataIn>,
    #[serde(default)]
    pub data_outs: Vec<DataOut>,
    #[serde(default)]
    pub sequence_body: Vec<Function>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Parallel {
    pub name: String,
    #[serde(default)]
    pub data_ins: Vec<DataIn>,
    #[serde(default)]
    pub data_outs: Vec<DataOut>,
    #[serde(default)]
    pub parallel_body: Vec<Section>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Section {
    #[serde(default)]
    pub section: Vec<Function>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IfThenElse {
    pub name: String,
    #[serde(default)]
    pub data_ins: Vec<DataIn>,
    pub condition: ConditionExpr,
    #[serde(default)]
    pub then_branch: Vec<Function>,
    #[serde(default)]
    pub else_branch: Vec<Function>,
    #[serde(default)]
    pub data_outs: Vec<DataOut>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConditionExpr {
    #[serde(default = "default_combinator")]
    pub combined_with: String,
    #[serde(default)]
    pub conditions: Vec<ConditionEntry>,
}

impl Default for ConditionExpr {
    fn default() -> Self {
        Self {
            combined_with: default_combinator(),
            conditions: Vec::new(),
        }
    }
}

fn default_combinator() -> String {
    "and".to_string()
}

/// A single comparison `data1 <operator> data2`. Operands are references or
/// literals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConditionEntry {
    #[serde(deserialize_with = "scalar")]
    pub data1: String,
    #[serde(deserialize_with = "scalar")]
    pub data2: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub operator: String,
    #[serde(default, deserialize_with = "flag")]
    pub negation: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParallelFor {
    pub name: String,
    #[serde(default)]
    pub data_ins: Vec<DataIn>,
    #[serde(default, deserialize_with = "scalar_list")]
    pub iterators: Vec<String>,
    #[serde(default)]
    pub loop_body: Vec<Function>,
    #[serde(default)]
    pub data_outs: Vec<DataOut>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DataIn {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    /// `producer/name` reference or a literal value.
    #[serde(default, deserialize_with = "opt_scalar", skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<PropertyConstraint>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DataOut {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default, deserialize_with = "opt_scalar", skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertyConstraint {
    pub name: String,
    #[serde(deserialize_with = "scalar")]
    pub value: String,
}

// Documents often write literals unquoted; all of them are kept as text.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Scalar::Text(s) => s,
            Scalar::Bool(b) => b.to_string(),
            Scalar::Int(i) => i.to_string(),
            Scalar::Float(f) => f.to_string(),
        }
    }
}

fn scalar<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Scalar::deserialize(deserializer).map(Scalar::into_text)
}

fn opt_scalar<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(Scalar::into_text))
}

fn scalar_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(Vec::<Scalar>::deserialize(deserializer)?
        .into_iter()
        .map(Scalar::into_text)
        .collect())
}

fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    match Scalar::deserialize(deserializer)? {
        Scalar::Bool(b) => Ok(b),
        Scalar::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("`{s}` is not a boolean"))),
        _ => Err(serde::de::Error::custom("negation must be a boolean")),
    }
}
