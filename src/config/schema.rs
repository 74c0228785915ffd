use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// Project layout and generated symbol names.
///
/// Every field has a default matching the BLDC controller project, so an
/// empty config (or none at all) patches that layout.
#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PatcherConfig {
    #[serde(default)]
    pub targets: Targets,
    #[serde(default)]
    pub symbols: Symbols,
}

/// Target files, relative to the project root.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Targets {
    pub header: String,
    pub source: String,
    pub data: String,
}

impl Default for Targets {
    fn default() -> Self {
        Self {
            header: "Inc/BLDC_controller.h".to_string(),
            source: "Src/BLDC_controller.c".to_string(),
            data: "Src/BLDC_controller_data.c".to_string(),
        }
    }
}

impl Targets {
    /// Targets in processing order, labelled by field name.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("header", self.header.as_str()),
            ("source", self.source.as_str()),
            ("data", self.data.as_str()),
        ]
        .into_iter()
    }
}

/// Identifiers emitted by the generator that the rules anchor on.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Symbols {
    /// Project header included by the guarded block
    pub config_header: String,
    /// Macro whose absence triggers the guarded include
    pub config_guard_macro: String,
    /// Include guard around the generator's common includes
    pub common_includes_guard: String,
    /// First system include inside that guard
    pub first_include: String,
    pub model_struct_tag: String,
    pub model_type: String,
    pub model_var: String,
    /// Parameter block type
    pub param_type: String,
    /// Model struct field pointing at the instance's parameters
    pub param_field: String,
    pub param_var: String,
    /// Names whose `.` access must become `->`
    pub pointer_aliases: Vec<String>,
    pub renamed_param_var: String,
    /// Entry points that get a local parameter pointer
    pub functions: Vec<String>,
}

impl Default for Symbols {
    fn default() -> Self {
        Self {
            config_header: "config.h".to_string(),
            config_guard_macro: "mcu_model".to_string(),
            common_includes_guard: "BLDC_controller_COMMON_INCLUDES_".to_string(),
            first_include: "rtwtypes.h".to_string(),
            model_struct_tag: "tag_RTM".to_string(),
            model_type: "RT_MODEL".to_string(),
            model_var: "rtM".to_string(),
            param_type: "P".to_string(),
            param_field: "defaultParam".to_string(),
            param_var: "rtP".to_string(),
            pointer_aliases: vec!["rtP".to_string(), "rtp".to_string()],
            renamed_param_var: "rtP_Left".to_string(),
            functions: vec![
                "BLDC_controller_initialize".to_string(),
                "BLDC_controller_step".to_string(),
            ],
        }
    }
}

impl Symbols {
    fn identifiers(&self) -> [(&'static str, &str); 10] {
        [
            ("symbols.config_guard_macro", self.config_guard_macro.as_str()),
            ("symbols.common_includes_guard", self.common_includes_guard.as_str()),
            ("symbols.model_struct_tag", self.model_struct_tag.as_str()),
            ("symbols.model_type", self.model_type.as_str()),
            ("symbols.model_var", self.model_var.as_str()),
            ("symbols.param_type", self.param_type.as_str()),
            ("symbols.param_field", self.param_field.as_str()),
            ("symbols.param_var", self.param_var.as_str()),
            ("symbols.renamed_param_var", self.renamed_param_var.as_str()),
            ("symbols.first_include", self.first_include.as_str()),
        ]
    }
}

impl PatcherConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        for (field, path) in self.targets.iter() {
            if path.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    field: match field {
                        "header" => "targets.header",
                        "source" => "targets.source",
                        _ => "targets.data",
                    },
                });
            } else if Path::new(path).is_absolute() {
                issues.push(ValidationIssue::AbsoluteTarget {
                    path: path.to_string(),
                });
            }
        }

        // Rules dispatch on file name, so two targets must not share one
        let mut seen: Vec<&str> = Vec::new();
        for (_, path) in self.targets.iter() {
            let Some(name) = Path::new(path).file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            if seen.contains(&name) {
                issues.push(ValidationIssue::Duplicate {
                    field: "targets",
                    value: name.to_string(),
                });
            } else {
                seen.push(name);
            }
        }

        for (field, value) in self.symbols.identifiers() {
            let valid = if field == "symbols.first_include" {
                is_header_name(value)
            } else {
                is_c_identifier(value)
            };
            if value.is_empty() {
                issues.push(ValidationIssue::MissingField { field });
            } else if !valid {
                issues.push(ValidationIssue::InvalidIdentifier {
                    field,
                    value: value.to_string(),
                });
            }
        }

        if self.symbols.config_header.is_empty() {
            issues.push(ValidationIssue::MissingField {
                field: "symbols.config_header",
            });
        } else if !is_header_name(&self.symbols.config_header) {
            issues.push(ValidationIssue::InvalidIdentifier {
                field: "symbols.config_header",
                value: self.symbols.config_header.clone(),
            });
        }

        check_list(
            &mut issues,
            "symbols.pointer_aliases",
            &self.symbols.pointer_aliases,
        );
        check_list(&mut issues, "symbols.functions", &self.symbols.functions);

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

fn check_list(issues: &mut Vec<ValidationIssue>, field: &'static str, values: &[String]) {
    if values.is_empty() {
        issues.push(ValidationIssue::EmptyList { field });
    }
    for (idx, value) in values.iter().enumerate() {
        if !is_c_identifier(value) {
            issues.push(ValidationIssue::InvalidIdentifier {
                field,
                value: value.clone(),
            });
        } else if values[..idx].contains(value) {
            issues.push(ValidationIssue::Duplicate {
                field,
                value: value.clone(),
            });
        }
    }
}

fn is_c_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

fn is_header_name(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '/' | '-'))
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    MissingField { field: &'static str },
    AbsoluteTarget { path: String },
    InvalidIdentifier { field: &'static str, value: String },
    EmptyList { field: &'static str },
    Duplicate { field: &'static str, value: String },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::MissingField { field } => {
                write!(f, "missing required field '{field}'")
            }
            ValidationIssue::AbsoluteTarget { path } => {
                write!(f, "target '{path}' must be relative to the project root")
            }
            ValidationIssue::InvalidIdentifier { field, value } => {
                write!(f, "'{field}' has invalid value '{value}'")
            }
            ValidationIssue::EmptyList { field } => write!(f, "'{field}' must not be empty"),
            ValidationIssue::Duplicate { field, value } => {
                write!(f, "'{field}' lists '{value}' more than once")
            }
        }
    }
}
