//! Operator descriptors and parameter schemas
//!
//! An `OperatorDescriptor` is the static shape of an operator as supplied by
//! the external catalog: how many inputs it takes, whether it produces an
//! output, where it lives in the menu, and which parameters it accepts.
//! The editor only ever reads descriptors.

use serde::{Deserialize, Serialize};

use crate::types::Configuration;

/// The JSON kind a parameter value must have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    /// Accepts any value
    Any,
    String,
    Number,
    Integer,
    Boolean,
    /// Array of values
    List,
    /// Nested object
    Object,
}

impl ParameterKind {
    /// Check whether a value is acceptable for this kind
    pub fn accepts(&self, value: &serde_json::Value) -> bool {
        use serde_json::Value;
        match self {
            ParameterKind::Any => true,
            ParameterKind::String => value.is_string(),
            ParameterKind::Number => value.is_number(),
            ParameterKind::Integer => value.is_i64() || value.is_u64(),
            ParameterKind::Boolean => value.is_boolean(),
            ParameterKind::List => matches!(value, Value::Array(_)),
            ParameterKind::Object => matches!(value, Value::Object(_)),
        }
    }
}

/// Schema entry for one operator parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSpec {
    pub name: String,
    pub kind: ParameterKind,
    /// Whether a value must be present after resolution
    pub required: bool,
    pub default_value: Option<serde_json::Value>,
}

impl ParameterSpec {
    /// Create a required parameter
    pub fn required(name: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            default_value: None,
        }
    }

    /// Create an optional parameter
    pub fn optional(name: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            default_value: None,
        }
    }

    /// Set a default value for this parameter
    pub fn with_default(mut self, value: serde_json::Value) -> Self {
        self.default_value = Some(value);
        self
    }
}

/// Complete description of an operator type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorDescriptor {
    /// Canonical identifier used to instantiate nodes (e.g. "Read")
    pub alias: String,
    /// Human-readable name shown in the palette
    pub display_name: String,
    /// Menu path, segments separated by '/'
    pub category: String,
    #[serde(default)]
    pub description: String,
    /// Number of input ports always shown
    pub min_inputs: usize,
    /// Whether further inputs may be appended beyond `min_inputs`
    #[serde(default)]
    pub variadic_inputs: bool,
    pub has_output: bool,
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub input_descriptions: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub output_description: String,
}

impl OperatorDescriptor {
    /// Create a descriptor with a fixed number of inputs
    ///
    /// The display name defaults to the alias.
    pub fn new(alias: impl Into<String>, category: impl Into<String>, min_inputs: usize, has_output: bool) -> Self {
        let alias = alias.into();
        Self {
            display_name: alias.clone(),
            alias,
            category: category.into(),
            description: String::new(),
            min_inputs,
            variadic_inputs: false,
            has_output,
            parameters: Vec::new(),
            input_descriptions: Vec::new(),
            output_description: String::new(),
        }
    }

    /// Set the display name; an empty name keeps the alias
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !name.is_empty() {
            self.display_name = name;
        }
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Allow an open-ended number of inputs
    pub fn variadic(mut self) -> Self {
        self.variadic_inputs = true;
        self
    }

    pub fn with_parameter(mut self, parameter: ParameterSpec) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Name shown to users, falling back to the alias
    pub fn label(&self) -> &str {
        if self.display_name.is_empty() {
            &self.alias
        } else {
            &self.display_name
        }
    }

    pub fn has_inputs(&self) -> bool {
        self.min_inputs > 0 || self.variadic_inputs
    }

    /// Look up a parameter by name
    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Description for an input port, empty when none is known
    pub fn input_description(&self, index: usize) -> &str {
        if !self.has_inputs() {
            return "";
        }
        self.input_descriptions
            .get(index)
            .or_else(|| self.input_descriptions.last().filter(|_| self.variadic_inputs))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Configuration holding every parameter default, in schema order
    pub fn default_configuration(&self) -> Configuration {
        self.parameters
            .iter()
            .filter_map(|p| p.default_value.clone().map(|v| (p.name.clone(), v)))
            .collect()
    }
}
