//! Types for the codec module.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::tags::TagField;

/// Maps a tag field to the encoder flag template that writes it.
///
/// A template containing `%s` becomes a single argument with the value
/// substituted; any other template is followed by the value as a separate
/// argument.
pub type TagOptions = BTreeMap<TagField, String>;

/// Command template for one side of the process chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecCommand {
    /// Argument vector, program name first.
    pub args: Vec<String>,
    /// Executable to check before spawning. Defaults to `args[0]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    /// Package providing the tool, for the remediation message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
}

impl CodecCommand {
    /// Creates a command from an argument vector.
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            tool: None,
            package: None,
        }
    }

    /// Sets the executable that must be resolvable.
    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = Some(tool.into());
        self
    }

    /// Sets the package that provides the tool.
    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    /// The program that gets spawned.
    pub fn program(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }

    /// The executable that gets validated.
    pub fn tool(&self) -> Option<&str> {
        self.tool.as_deref().or_else(|| self.program())
    }

    /// The package to suggest when the tool is missing.
    pub fn package(&self) -> &str {
        self.package
            .as_deref()
            .or_else(|| self.tool())
            .unwrap_or("unknown")
    }
}

/// Encoder registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderEntry {
    #[serde(flatten)]
    pub command: CodecCommand,
    /// Tag flag templates understood by this encoder.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: TagOptions,
}

impl EncoderEntry {
    /// Creates an entry without tag support.
    pub fn new(command: CodecCommand) -> Self {
        Self {
            command,
            tags: TagOptions::new(),
        }
    }

    /// Adds a tag flag template.
    pub fn with_tag(mut self, field: TagField, template: impl Into<String>) -> Self {
        self.tags.insert(field, template.into());
        self
    }

    /// Whether the encoder can write tags at all.
    pub fn supports_tags(&self) -> bool {
        !self.tags.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_defaults_to_program() {
        let cmd = CodecCommand::new(["flac", "-d", "-c", "-"]);
        assert_eq!(cmd.program(), Some("flac"));
        assert_eq!(cmd.tool(), Some("flac"));
        assert_eq!(cmd.package(), "flac");
    }

    #[test]
    fn test_explicit_tool_and_package() {
        let cmd = CodecCommand::new(["env", "MPLAYER_VERBOSE=-100", "mplayer", "-"])
            .with_tool("mplayer")
            .with_package("mplayer");
        assert_eq!(cmd.program(), Some("env"));
        assert_eq!(cmd.tool(), Some("mplayer"));
    }

    #[test]
    fn test_encoder_entry_deserialize_flattened() {
        let toml = r#"
args = ["lame", "-V", "2", "-", "-"]
package = "lame"

[tags]
album = "--tl"
track = "--tn"
"#;
        let entry: EncoderEntry = toml::from_str(toml).unwrap();
        assert_eq!(entry.command.program(), Some("lame"));
        assert_eq!(entry.command.package(), "lame");
        assert_eq!(entry.tags.get(&TagField::Album).map(String::as_str), Some("--tl"));
        assert!(entry.supports_tags());
    }
}
