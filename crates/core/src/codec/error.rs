//! Error types for the codec module.

use std::fmt;
use thiserror::Error;

/// Which side of the process chain a codec entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecRole {
    Decoder,
    Encoder,
}

impl fmt::Display for CodecRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decoder => write!(f, "decoder"),
            Self::Encoder => write!(f, "encoder"),
        }
    }
}

/// Errors raised while resolving a codec for a job.
#[derive(Debug, Error)]
pub enum CodecError {
    /// No registry entry for the extension or format.
    #[error("No available {role} for format: {format}")]
    UnsupportedFormat { role: CodecRole, format: String },

    /// The entry exists but its executable is not on the search path.
    #[error("{role} '{tool}' not found in PATH, install the '{package}' package")]
    MissingTool {
        role: CodecRole,
        tool: String,
        package: String,
    },

    /// The entry has an empty argument vector.
    #[error("The {role} command for {format} is empty")]
    EmptyCommand { role: CodecRole, format: String },
}

impl CodecError {
    /// Creates an unsupported format error.
    pub fn unsupported(role: CodecRole, format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            role,
            format: format.into(),
        }
    }

    /// Whether the failure means a tool needs installing rather than the
    /// format being unknown.
    pub fn is_missing_tool(&self) -> bool {
        matches!(self, Self::MissingTool { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tool_message_names_package() {
        let err = CodecError::MissingTool {
            role: CodecRole::Encoder,
            tool: "oggenc".to_string(),
            package: "vorbis-tools".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("oggenc"));
        assert!(message.contains("vorbis-tools"));
        assert!(err.is_missing_tool());
    }

    #[test]
    fn test_unsupported_message() {
        let err = CodecError::unsupported(CodecRole::Decoder, "xyz");
        assert_eq!(err.to_string(), "No available decoder for format: xyz");
        assert!(!err.is_missing_tool());
    }
}
