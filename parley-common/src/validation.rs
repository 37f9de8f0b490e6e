//! Configuration validation for parley services.
//!
//! Provides validation logic for configuration fields to ensure
//! all required values are present and within valid ranges.

use thiserror::Error;

use crate::config::{Config, ConversationConfig, LlmConfig, ObservabilityConfig, ServerConfig};

/// Configuration validation error.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid port {port}: must be between 1 and 65535")]
    InvalidPort { port: u16, field: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Multiple validation errors: {0:?}")]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trait for validatable configuration sections.
pub trait Validate {
    /// Validate this configuration section.
    fn validate(&self) -> ValidationResult<()>;
}

impl Config {
    /// Validate the entire configuration, collecting every failure.
    pub fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();

        let sections: [&dyn Validate; 4] = [
            &self.server,
            &self.llm,
            &self.conversation,
            &self.observability,
        ];
        for section in sections {
            if let Err(e) = section.validate() {
                match e {
                    ValidationError::Multiple(inner) => errors.extend(inner),
                    other => errors.push(other),
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else if errors.len() == 1 {
            Err(errors.remove(0))
        } else {
            Err(ValidationError::Multiple(errors))
        }
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> ValidationResult<()> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort {
                port: self.port,
                field: "server.port".into(),
            });
        }

        if self.bind.trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: "server.bind".into(),
            });
        }

        Ok(())
    }
}

impl Validate for LlmConfig {
    fn validate(&self) -> ValidationResult<()> {
        if self.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            return Err(ValidationError::MissingField {
                field: "llm.api_key (or OPENAI_API_KEY)".into(),
            });
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidValue {
                field: "llm.base_url".into(),
                reason: "must start with http:// or https://".into(),
            });
        }

        if self.model.trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: "llm.model".into(),
            });
        }

        Ok(())
    }
}

impl Validate for ConversationConfig {
    fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if self.max_tokens == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "conversation.max_tokens".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.summary_max_tokens == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "conversation.summary_max_tokens".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.max_context_messages == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "conversation.max_context_messages".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            errors.push(ValidationError::InvalidValue {
                field: "conversation.similarity_threshold".into(),
                reason: format!("{} is outside [0.0, 1.0]", self.similarity_threshold),
            });
        }

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(ValidationError::Multiple(errors)),
        }
    }
}

impl Validate for ObservabilityConfig {
    fn validate(&self) -> ValidationResult<()> {
        let valid_formats = ["pretty", "json"];
        if !valid_formats.contains(&self.log_format.as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "observability.log_format".into(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            });
        }

        Ok(())
    }
}
