//! Configuration schema for tagtrace
//!
//! Config lives at `.config/tagtrace/config.yaml` relative to the working
//! directory. Every field is optional; a field that is present replaces the
//! built-in default as a whole.
//!
//! ```yaml
//! requirement_rules:
//!   - type_code: H
//!     covered_by: [R]
//!   - type_code: R
//!     covered_by: [T]
//!   - type_code: T
//! exclude:
//!   - "target/**"
//! ```

use facet::Facet;
use tagtrace_core::{RuleGraph, TraceConfig, TypeName};

/// Root configuration for tagtrace
#[derive(Debug, Clone, Default, Facet)]
pub struct Config {
    /// Rule graph for the requirement tracing report
    #[facet(default)]
    pub requirement_rules: Option<RuleGraph>,

    /// Rule graph for the design tracing report
    #[facet(default)]
    pub design_rules: Option<RuleGraph>,

    /// Column names per type code
    #[facet(default)]
    pub type_names: Option<Vec<TypeName>>,

    /// Types rendered as links to their defining document
    #[facet(default)]
    pub primary_types: Option<Vec<String>>,

    /// Type of anonymous code annotations
    #[facet(default)]
    pub implementation_type: Option<String>,

    /// Glob patterns for files to scan when an input is a directory
    #[facet(default)]
    pub include: Vec<String>,

    /// Glob patterns to exclude when an input is a directory
    #[facet(default)]
    pub exclude: Vec<String>,
}

impl Config {
    /// Built-in defaults with this file's overrides applied
    pub fn trace_config(&self) -> TraceConfig {
        let defaults = TraceConfig::default();
        TraceConfig {
            requirement_rules: self
                .requirement_rules
                .clone()
                .unwrap_or(defaults.requirement_rules),
            design_rules: self.design_rules.clone().unwrap_or(defaults.design_rules),
            type_names: self.type_names.clone().unwrap_or(defaults.type_names),
            primary_types: self.primary_types.clone().unwrap_or(defaults.primary_types),
            implementation_type: self
                .implementation_type
                .clone()
                .unwrap_or(defaults.implementation_type),
        }
    }

    /// Exclude patterns, defaulting to build output
    pub fn exclude_patterns(&self) -> Vec<String> {
        if self.exclude.is_empty() {
            vec!["target/**".to_string()]
        } else {
            self.exclude.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(Config::default().trace_config(), TraceConfig::default());
        assert_eq!(Config::default().exclude_patterns(), vec!["target/**"]);
    }

    #[test]
    fn test_override_replaces_whole_graph() {
        let config = Config {
            requirement_rules: Some(RuleGraph::from_table(&[("R", &["T"]), ("T", &[])])),
            implementation_type: Some("C".to_string()),
            ..Config::default()
        };
        let trace = config.trace_config();
        let columns: Vec<_> = trace.requirement_rules.type_codes().collect();
        assert_eq!(columns, vec!["R", "T"]);
        assert_eq!(trace.design_rules, RuleGraph::design_tracing());
        assert!(trace.is_implementation("C"));
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
requirement_rules:
  - type_code: R
    covered_by: [T]
  - type_code: T
type_names:
  - type_code: R
    name: Need
include:
  - "docs/**/*.md"
"#;
        let config: Config = facet_yaml::from_str(yaml).expect("valid config");
        let trace = config.trace_config();
        assert_eq!(trace.requirement_rules.required("R"), ["T".to_string()]);
        assert!(trace.requirement_rules.is_terminal("T"));
        assert_eq!(trace.type_name("R"), "Need");
        assert_eq!(config.include, vec!["docs/**/*.md"]);
    }
}
