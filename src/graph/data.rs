use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Value type carried by a data node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Number,
    String,
    Boolean,
    Object,
    Collection,
}

impl DataType {
    /// Maps the type strings used in workflow documents.
    pub fn from_afcl(type_string: &str) -> Option<DataType> {
        match type_string.trim() {
            "number" => Some(DataType::Number),
            "string" => Some(DataType::String),
            "bool" | "boolean" => Some(DataType::Boolean),
            "object" => Some(DataType::Object),
            "collection" => Some(DataType::Collection),
            _ => None,
        }
    }

    /// Whether a JSON value is an acceptable payload for this type.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            DataType::Number => value.is_number(),
            DataType::String => value.is_string(),
            DataType::Boolean => value.is_boolean(),
            DataType::Object => value.is_object(),
            DataType::Collection => value.is_array(),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Number => "number",
            DataType::String => "string",
            DataType::Boolean => "bool",
            DataType::Object => "object",
            DataType::Collection => "collection",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DataRole {
    /// Workflow input, bound from the input provider.
    Root,
    /// Intermediate result read by a workflow output.
    Leaf,
    Constant,
    /// Boolean outcome of a condition evaluation.
    Decision,
    /// Ordering token without a data dependency.
    Sequentiality,
    Intermediate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataNode {
    pub data_type: DataType,
    pub role: DataRole,
    /// JSON key of the workflow input, roots only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boundary_key: Option<String>,
    /// JSON keys of the workflow outputs bound to this node.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub output_keys: Vec<String>,
    /// Literal payload, constants only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
}

impl DataNode {
    fn with_role(data_type: DataType, role: DataRole) -> Self {
        Self {
            data_type,
            role,
            boundary_key: None,
            output_keys: Vec::new(),
            content: None,
        }
    }

    pub fn intermediate(data_type: DataType) -> Self {
        Self::with_role(data_type, DataRole::Intermediate)
    }

    pub fn root(data_type: DataType, key: &str) -> Self {
        Self {
            boundary_key: Some(key.to_string()),
            ..Self::with_role(data_type, DataRole::Root)
        }
    }

    pub fn constant(data_type: DataType, content: Value) -> Self {
        Self {
            content: Some(content),
            ..Self::with_role(data_type, DataRole::Constant)
        }
    }

    pub fn decision() -> Self {
        Self::with_role(DataType::Boolean, DataRole::Decision)
    }

    pub fn sequentiality() -> Self {
        Self::with_role(DataType::Boolean, DataRole::Sequentiality)
    }

    pub fn is_root(&self) -> bool {
        self.role == DataRole::Root
    }

    /// Whether any workflow output reads this node. Roots and constants can
    /// be outputs too.
    pub fn is_leaf(&self) -> bool {
        !self.output_keys.is_empty()
    }
}
