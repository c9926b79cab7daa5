use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Parameter values keyed by parameter name
pub type ToolParams = serde_json::Map<String, Value>;

const BUILTIN_CATALOG: &str = include_str!("../catalog/tools.json");

/// Category a tool is listed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCategory {
    Diagnostics,
    Solution,
    Search,
    Analysis,
    Architecture,
    Refactoring,
    External,
}

impl ToolCategory {
    /// Every category, in display order
    pub const ALL: [ToolCategory; 7] = [
        ToolCategory::Diagnostics,
        ToolCategory::Solution,
        ToolCategory::Search,
        ToolCategory::Analysis,
        ToolCategory::Architecture,
        ToolCategory::Refactoring,
        ToolCategory::External,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Diagnostics => "diagnostics",
            Self::Solution => "solution",
            Self::Search => "search",
            Self::Analysis => "analysis",
            Self::Architecture => "architecture",
            Self::Refactoring => "refactoring",
            Self::External => "external",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Diagnostics => "Diagnostics",
            Self::Solution => "Solution Management",
            Self::Search => "Search",
            Self::Analysis => "Analysis",
            Self::Architecture => "Architecture & Metrics",
            Self::Refactoring => "Refactoring",
            Self::External => "External Source",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Diagnostics => "Check server status and health",
            Self::Solution => "Load and unload .NET solutions and projects",
            Self::Search => "Find types, usages, and implementations",
            Self::Analysis => "Get detailed type and method information",
            Self::Architecture => "Analyze type dependencies and code complexity",
            Self::Refactoring => "Rename symbols and move types/members",
            Self::External => "View source code of NuGet/framework types",
        }
    }
}

impl std::fmt::Display for ToolCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ToolCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .with_context(|| format!("Unknown tool category: {}", s))
    }
}

/// JSON type a parameter value must have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    String,
    Boolean,
    Number,
}

impl ParameterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Number => "number",
        }
    }

    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Boolean => value.is_boolean(),
            Self::Number => value.is_number(),
        }
    }

    /// Convert a command-line value to this type. Text that does not parse
    /// stays a string so validation can report it.
    pub fn coerce(&self, raw: &str) -> Value {
        match self {
            Self::String => Value::String(raw.to_string()),
            Self::Boolean => match raw {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => Value::String(raw.to_string()),
            },
            Self::Number => match serde_json::from_str::<Value>(raw) {
                Ok(number @ Value::Number(_)) => number,
                _ => Value::String(raw.to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParameterType,
    pub description: String,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolExample {
    pub description: String,
    #[serde(default)]
    pub params: ToolParams,
}

/// Static description of one invokable tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolMetadata {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub category: ToolCategory,
    #[serde(default)]
    pub parameters: Vec<ToolParameter>,
    #[serde(default)]
    pub examples: Vec<ToolExample>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_example: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_in_docs: Option<bool>,
}

impl ToolMetadata {
    /// Tools are listed in docs unless explicitly hidden
    pub fn shown_in_docs(&self) -> bool {
        self.show_in_docs != Some(false)
    }

    pub fn parameter(&self, name: &str) -> Option<&ToolParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Declared default for every parameter, or an empty string when none is declared
    pub fn default_params(&self) -> ToolParams {
        self.parameters
            .iter()
            .map(|p| {
                let value = p
                    .default
                    .clone()
                    .unwrap_or_else(|| Value::String(String::new()));
                (p.name.clone(), value)
            })
            .collect()
    }

    /// Check required parameters and value types.
    ///
    /// Missing, `null` and `""` all count as "not provided". Provided values
    /// must match the declared JSON type.
    pub fn validate(&self, params: &ToolParams) -> ValidationReport {
        let mut errors = Vec::new();

        for param in &self.parameters {
            let value = params.get(&param.name).filter(|v| is_provided(v));

            match value {
                None if param.required => errors.push(format!("{} is required", param.name)),
                Some(value) if !param.param_type.matches(value) => errors.push(format!(
                    "{} must be a {}",
                    param.name,
                    param.param_type.as_str()
                )),
                _ => {}
            }
        }

        ValidationReport {
            valid: errors.is_empty(),
            errors,
        }
    }
}

fn is_provided(value: &Value) -> bool {
    !matches!(value, Value::Null) && value.as_str() != Some("")
}

/// Outcome of [`ToolMetadata::validate`]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// Ordered, immutable set of tool descriptions
#[derive(Debug, Clone)]
pub struct ToolCatalog {
    tools: Vec<ToolMetadata>,
}

impl ToolCatalog {
    pub fn new(tools: Vec<ToolMetadata>) -> Result<Self> {
        let mut seen = HashSet::new();
        for tool in &tools {
            if !seen.insert(tool.id.as_str()) {
                bail!("Duplicate tool id in catalog: {}", tool.id);
            }
        }
        Ok(Self { tools })
    }

    /// The Glider tool set shipped with the playground
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_CATALOG).context("Failed to load builtin tool catalog")
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let tools: Vec<ToolMetadata> =
            serde_json::from_str(json).context("Failed to parse tool catalog")?;
        Self::new(tools)
    }

    pub fn all(&self) -> &[ToolMetadata] {
        &self.tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ToolMetadata> {
        self.tools.iter().find(|t| t.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn by_category(&self, category: ToolCategory) -> Vec<&ToolMetadata> {
        self.tools.iter().filter(|t| t.category == category).collect()
    }

    pub fn docs_by_category(&self, category: ToolCategory) -> Vec<&ToolMetadata> {
        self.tools
            .iter()
            .filter(|t| t.category == category && t.shown_in_docs())
            .collect()
    }

    pub fn docs_get(&self, id: &str) -> Option<&ToolMetadata> {
        self.get(id).filter(|t| t.shown_in_docs())
    }

    /// Every category (including empty ones) with its tools, in category order
    pub fn grouped_by_category(&self) -> Vec<(ToolCategory, Vec<&ToolMetadata>)> {
        ToolCategory::ALL
            .into_iter()
            .map(|c| (c, self.by_category(c)))
            .collect()
    }
}
