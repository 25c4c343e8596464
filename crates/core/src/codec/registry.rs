//! Decoder and encoder lookup tables.

use std::collections::HashMap;

use crate::tags::TagField;

use super::error::{CodecError, CodecRole};
use super::resolver::{ExecutableResolver, SearchPathResolver};
use super::types::{CodecCommand, EncoderEntry};

/// Immutable lookup tables for the process chain.
#[derive(Debug, Clone, Default)]
pub struct CodecRegistry {
    decoders: HashMap<String, CodecCommand>,
    encoders: HashMap<String, EncoderEntry>,
}

impl CodecRegistry {
    /// Creates a registry with no entries.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in tables.
    pub fn with_defaults() -> Self {
        let mplayer = CodecCommand::new([
            "env",
            "MPLAYER_VERBOSE=-100",
            "mplayer",
            "-ao",
            "pcm:file=/dev/stdout",
            "-",
        ])
        .with_tool("mplayer")
        .with_package("mplayer");

        let faac = EncoderEntry::new(
            CodecCommand::new(["faac", "-wo", "/dev/stdout", "-"]).with_package("faac"),
        )
        .with_tag(TagField::Album, "--album")
        .with_tag(TagField::Artist, "--artist")
        .with_tag(TagField::Title, "--title")
        .with_tag(TagField::Comment, "--comment")
        .with_tag(TagField::Genre, "--genre")
        .with_tag(TagField::Year, "--year")
        .with_tag(TagField::Track, "--track");

        Self::empty()
            .with_decoder(
                "mp3",
                CodecCommand::new(["mpg123", "-w", "/dev/stdout", "-"]).with_package("mpg123"),
            )
            .with_decoder(
                "ogg",
                CodecCommand::new(["ogg123", "-d", "wav", "-f", "-", "-"])
                    .with_package("vorbis-tools"),
            )
            .with_decoder("mp4", mplayer.clone())
            .with_decoder("m4a", mplayer)
            .with_decoder(
                "flac",
                CodecCommand::new(["flac", "-d", "-c", "-"]).with_package("flac"),
            )
            .with_decoder("wav", CodecCommand::new(["cat"]).with_package("coreutils"))
            .with_encoder(
                "mp3",
                EncoderEntry::new(
                    CodecCommand::new(["lame", "--abr", "128", "-", "-"]).with_package("lame"),
                )
                .with_tag(TagField::Album, "--tl")
                .with_tag(TagField::Artist, "--ta")
                .with_tag(TagField::Title, "--tt")
                .with_tag(TagField::Comment, "--tc")
                .with_tag(TagField::Genre, "--tg")
                .with_tag(TagField::Year, "--ty")
                .with_tag(TagField::Track, "--tn"),
            )
            .with_encoder(
                "ogg",
                EncoderEntry::new(
                    CodecCommand::new(["oggenc", "-q", "2", "-"]).with_package("vorbis-tools"),
                )
                .with_tag(TagField::Album, "-l")
                .with_tag(TagField::Artist, "-a")
                .with_tag(TagField::Title, "-t")
                .with_tag(TagField::Comment, "--comment=comment=%s")
                .with_tag(TagField::Genre, "-G")
                .with_tag(TagField::Year, "-d")
                .with_tag(TagField::Track, "-N"),
            )
            .with_encoder("mp4", faac.clone())
            .with_encoder("m4a", faac)
            .with_encoder(
                "wav",
                EncoderEntry::new(CodecCommand::new(["cat"]).with_package("coreutils")),
            )
    }

    /// Adds or replaces a decoder for a source extension.
    pub fn with_decoder(mut self, extension: &str, command: CodecCommand) -> Self {
        self.decoders.insert(extension.to_lowercase(), command);
        self
    }

    /// Adds or replaces an encoder for a target format.
    pub fn with_encoder(mut self, format: &str, entry: EncoderEntry) -> Self {
        self.encoders.insert(format.to_lowercase(), entry);
        self
    }

    /// Overlays user-supplied entries on top of this registry.
    pub fn merge(
        mut self,
        decoders: &HashMap<String, CodecCommand>,
        encoders: &HashMap<String, EncoderEntry>,
    ) -> Self {
        for (extension, command) in decoders {
            self = self.with_decoder(extension, command.clone());
        }
        for (format, entry) in encoders {
            self = self.with_encoder(format, entry.clone());
        }
        self
    }

    /// Returns the decoder for a source extension.
    pub fn decoder_for(&self, extension: &str) -> Result<&CodecCommand, CodecError> {
        self.decoders
            .get(&extension.to_lowercase())
            .ok_or_else(|| CodecError::unsupported(CodecRole::Decoder, extension))
    }

    /// Returns the encoder for a target format.
    pub fn encoder_for(&self, format: &str) -> Result<&EncoderEntry, CodecError> {
        self.encoders
            .get(&format.to_lowercase())
            .ok_or_else(|| CodecError::unsupported(CodecRole::Encoder, format))
    }

    /// Checks that a command's executable can be resolved.
    pub fn ensure_available(
        &self,
        role: CodecRole,
        format: &str,
        command: &CodecCommand,
        resolver: &dyn ExecutableResolver,
    ) -> Result<(), CodecError> {
        let tool = command.tool().ok_or_else(|| CodecError::EmptyCommand {
            role,
            format: format.to_string(),
        })?;

        if resolver.is_available(tool) {
            Ok(())
        } else {
            Err(CodecError::MissingTool {
                role,
                tool: tool.to_string(),
                package: command.package().to_string(),
            })
        }
    }

    /// Whether a program resolves on the current `PATH`.
    pub fn is_executable_available(program: &str) -> bool {
        SearchPathResolver.is_available(program)
    }

    /// Source extensions with a decoder, sorted.
    pub fn decodable_extensions(&self) -> Vec<&str> {
        let mut exts: Vec<&str> = self.decoders.keys().map(String::as_str).collect();
        exts.sort_unstable();
        exts
    }

    /// Target formats with an encoder, sorted.
    pub fn encodable_formats(&self) -> Vec<&str> {
        let mut formats: Vec<&str> = self.encoders.keys().map(String::as_str).collect();
        formats.sort_unstable();
        formats
    }
}
