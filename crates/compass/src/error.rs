// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

use thiserror::Error;
#[derive(Error, Debug)]
pub enum CompassError {
    #[error("Shorthand error: {0}")]
    Shorthand(#[from] ShorthandError),
    #[error("Query model error: {0}")]
    Model(#[from] ModelError),
    #[error("Constraint error: {0}")]
    Constraint(#[from] ConstraintError),
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialisation error: {0}")]
    Serialisation(#[from] SerialisationError),
}
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VocabularyError {
    #[error("Unknown {kind} '{value}'")]
    Unknown { kind: &'static str, value: String },
}
#[derive(Error, Debug)]
pub enum ShorthandError {
    #[error("Malformed shorthand '{input}': {reason}")]
    Syntax { input: String, reason: String },
    #[error("Invalid JSON fragment '{fragment}': {source}")]
    InvalidJson {
        fragment: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Vocabulary(#[from] VocabularyError),
}
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Wildcard name '{name}' is used more than once in the query")]
    DuplicateWildcardName { name: String },
    #[error("Encoding index {index} is out of range ({len} encodings)")]
    EncodingOutOfRange { index: usize, len: usize },
    #[error("Property '{property}' of encoding {index} is not a wildcard slot")]
    NotAWildcard { property: String, index: usize },
    #[error("Mark is not a wildcard slot")]
    MarkNotAWildcard,
    #[error("Value {value} cannot be assigned to property '{property}'")]
    ValueTypeMismatch { property: String, value: String },
    #[error("Property '{property}' is not an encoding property")]
    NotAnEncodingProperty { property: String },
    #[error("Stack offset {value} is not one of zero, center, normalize or none")]
    InvalidStackOffset { value: String },
}
#[derive(Error, Debug)]
pub enum ConstraintError {
    #[error("Constraint '{constraint}' has no rule for mark '{mark}'")]
    UnsupportedCombination { constraint: &'static str, mark: String },
    #[error("Constraint '{constraint}' read unresolved property '{property}'")]
    UnresolvedProperty {
        constraint: &'static str,
        property: String,
    },
    #[error(transparent)]
    Schema(#[from] SchemaError),
}
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Field '{field}' not found in schema")]
    FieldNotFound { field: String },
    #[error("Duplicate field name found: '{name}'")]
    DuplicateField { name: String },
    #[error("Schema has no fields")]
    EmptySchema,
    #[error("Failed to read schema file '{path}': {source}")]
    SchemaFileError {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse schema: {reason}")]
    ParseError { reason: String },
}
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid configuration: {field} {reason}")]
    InvalidValue { field: String, reason: String },
    #[error("Configuration list '{field}' must not be empty")]
    EmptyList { field: String },
    #[error("Unsupported configuration format for '{path}'")]
    UnsupportedFormat { path: String },
    #[error("Configuration validation failed: {reason}")]
    ValidationFailed { reason: String },
}
#[derive(Error, Debug)]
pub enum SerialisationError {
    #[error("JSON serialisation failed: {source}")]
    JsonSerialisationError {
        #[from]
        source: serde_json::Error,
    },
    #[error("YAML serialisation failed: {source}")]
    YamlSerialisationError {
        #[from]
        source: serde_yaml::Error,
    },
    #[error("Expected {expected} but found {found}")]
    UnexpectedShape { expected: String, found: String },
}
pub type Result<T> = std::result::Result<T, CompassError>;
pub type ShorthandResult<T> = std::result::Result<T, ShorthandError>;
pub type ModelResult<T> = std::result::Result<T, ModelError>;
pub type ConstraintResult<T> = std::result::Result<T, ConstraintError>;
pub type SchemaResult<T> = std::result::Result<T, SchemaError>;
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
pub type SerialisationResult<T> = std::result::Result<T, SerialisationError>;
impl From<anyhow::Error> for CompassError {
    fn from(err: anyhow::Error) -> Self {
        CompassError::Config(ConfigError::ValidationFailed {
            reason: err.to_string(),
        })
    }
}
impl From<serde_json::Error> for CompassError {
    fn from(err: serde_json::Error) -> Self {
        CompassError::Serialisation(SerialisationError::JsonSerialisationError { source: err })
    }
}
impl From<serde_yaml::Error> for CompassError {
    fn from(err: serde_yaml::Error) -> Self {
        CompassError::Serialisation(SerialisationError::YamlSerialisationError { source: err })
    }
}
impl From<VocabularyError> for CompassError {
    fn from(err: VocabularyError) -> Self {
        CompassError::Shorthand(ShorthandError::Vocabulary(err))
    }
}
impl CompassError {
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CompassError::Shorthand(_)
                | CompassError::Model(ModelError::DuplicateWildcardName { .. })
                | CompassError::Model(ModelError::InvalidStackOffset { .. })
                | CompassError::Config(_)
                | CompassError::Schema(SchemaError::FieldNotFound { .. })
        )
    }
    pub fn category(&self) -> &'static str {
        match self {
            CompassError::Shorthand(_) => "Shorthand",
            CompassError::Model(_) => "Model",
            CompassError::Constraint(_) => "Constraint",
            CompassError::Schema(_) => "Schema",
            CompassError::Config(_) => "Configuration",
            CompassError::Io(_) => "I/O",
            CompassError::Serialisation(_) => "Serialisation",
        }
    }
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            CompassError::Shorthand(ShorthandError::Syntax { .. }) => vec![
                "Use the form mark|channel:fn(field,type,key=value)".to_string(),
                "Check that JSON fragments in parameters are balanced".to_string(),
            ],
            CompassError::Model(ModelError::DuplicateWildcardName { .. }) => vec![
                "Give every named wildcard in the query a distinct name".to_string(),
                "Drop the name to let the default per-encoding name apply".to_string(),
            ],
            CompassError::Model(ModelError::InvalidStackOffset { .. }) => vec![
                "Set config.stack to zero, center, normalize, none, true or false".to_string(),
            ],
            CompassError::Constraint(ConstraintError::UnsupportedCombination { .. }) => vec![
                "Remove the mark from the enumerated mark list".to_string(),
                "Disable the configurable rule that covers this mark".to_string(),
            ],
            CompassError::Schema(SchemaError::FieldNotFound { .. }) => vec![
                "Check the field name spelling".to_string(),
                "Verify the schema file lists every field used by the query".to_string(),
            ],
            _ => vec!["Check the error message for specific guidance".to_string()],
        }
    }
    pub fn user_message(&self) -> String {
        match self {
            CompassError::Constraint(ConstraintError::UnsupportedCombination { mark, .. }) => {
                format!("Mark '{mark}' is not supported by the recommendation rules.")
            }
            CompassError::Schema(SchemaError::EmptySchema) => {
                "The schema is empty. Please provide at least one field.".to_string()
            }
            _ => self.to_string(),
        }
    }
}
#[macro_export]
macro_rules! shorthand_syntax_error {
    ($input:expr, $($arg:tt)*) => {
        $crate::error::ShorthandError::Syntax {
            input: $input.to_string(),
            reason: format!($($arg)*),
        }
    };
}
#[macro_export]
macro_rules! config_error {
    ($field:expr, $($arg:tt)*) => {
        $crate::error::ConfigError::InvalidValue {
            field: $field.to_string(),
            reason: format!($($arg)*),
        }
    };
}
pub mod utils {
    use super::*;
    pub fn field_not_found(field: &str) -> CompassError {
        CompassError::Schema(SchemaError::FieldNotFound {
            field: field.to_string(),
        })
    }
    pub fn duplicate_wildcard(name: &str) -> CompassError {
        CompassError::Model(ModelError::DuplicateWildcardName {
            name: name.to_string(),
        })
    }
    pub fn unsupported_combination(constraint: &'static str, mark: &str) -> CompassError {
        CompassError::Constraint(ConstraintError::UnsupportedCombination {
            constraint,
            mark: mark.to_string(),
        })
    }
    pub fn wrap_error<E>(error: E, context: &str) -> CompassError
    where
        E: std::error::Error + 'static,
    {
        CompassError::Config(ConfigError::ValidationFailed {
            reason: format!("{context}: {error}"),
        })
    }
    pub fn error_severity(error: &CompassError) -> ErrorSeverity {
        match error {
            CompassError::Shorthand(_) => ErrorSeverity::Warning,
            CompassError::Config(_) => ErrorSeverity::Error,
            CompassError::Constraint(ConstraintError::UnsupportedCombination { .. }) => {
                ErrorSeverity::Critical
            }
            CompassError::Constraint(ConstraintError::UnresolvedProperty { .. }) => {
                ErrorSeverity::Critical
            }
            _ => ErrorSeverity::Error,
        }
    }
}
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}
impl ErrorSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorSeverity::Info => "INFO",
            ErrorSeverity::Warning => "WARNING",
            ErrorSeverity::Error => "ERROR",
            ErrorSeverity::Critical => "CRITICAL",
        }
    }
    pub fn color_code(&self) -> &'static str {
        match self {
            ErrorSeverity::Info => "\x1b[36m",
            ErrorSeverity::Warning => "\x1b[33m",
            ErrorSeverity::Error => "\x1b[31m",
            ErrorSeverity::Critical => "\x1b[35m",
        }
    }
}
pub struct ErrorReporter {
    pub show_suggestions: bool,
    pub colored_output: bool,
}
impl ErrorReporter {
    pub fn new() -> Self {
        Self {
            show_suggestions: true,
            colored_output: true,
        }
    }
    pub fn plain() -> Self {
        Self {
            show_suggestions: true,
            colored_output: false,
        }
    }
    pub fn report(&self, error: &CompassError) -> String {
        let severity = utils::error_severity(error);
        let mut output = String::new();
        if self.colored_output {
            output.push_str(severity.color_code());
        }
        output.push_str(&format!(
            "[{}] {} ({})\n",
            severity.as_str(),
            error.user_message(),
            error.category()
        ));
        if self.colored_output {
            output.push_str("\x1b[0m");
        }
        if self.show_suggestions {
            let suggestions = error.suggestions();
            if !suggestions.is_empty() {
                output.push_str("\nSuggestions:\n");
                for suggestion in suggestions {
                    output.push_str(&format!("  • {suggestion}\n"));
                }
            }
        }
        output
    }
}
impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}
