//! Shared collaborators for transcode jobs.

use std::sync::Arc;

use crate::codec::{
    CodecCommand, CodecError, CodecRegistry, CodecRole, EncoderEntry, ExecutableResolver,
    SearchPathResolver,
};
use crate::config::{Config, TagBackend};
use crate::tags::{FfprobeTagReader, NoTagReader, TagReader};

use super::error::JobError;
use super::staging::FileStaging;
use super::types::JobRequest;

/// Decoder and encoder chosen for a request.
#[derive(Debug, Clone)]
pub struct ResolvedCodecs {
    /// Lowercased source extension.
    pub extension: String,
    pub decoder: CodecCommand,
    pub encoder: EncoderEntry,
}

/// Everything a [`TranscodeJob`](super::TranscodeJob) needs besides its request.
pub struct JobContext {
    registry: CodecRegistry,
    staging: FileStaging,
    resolver: Arc<dyn ExecutableResolver>,
    tag_reader: Arc<dyn TagReader>,
    check_decoder_status: bool,
}

impl JobContext {
    /// Creates a context resolving tools on `PATH` and reading no tags.
    pub fn new(registry: CodecRegistry, staging: FileStaging) -> Self {
        Self {
            registry,
            staging,
            resolver: Arc::new(SearchPathResolver),
            tag_reader: Arc::new(NoTagReader),
            check_decoder_status: true,
        }
    }

    /// Builds the context described by a loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, JobError> {
        let registry = CodecRegistry::with_defaults()
            .merge(&config.codecs.decoders, &config.codecs.encoders);
        let staging = FileStaging::new(config.staging.clone())?;

        let tag_reader: Arc<dyn TagReader> = match config.tags.backend {
            TagBackend::Ffprobe => Arc::new(FfprobeTagReader::new(&config.tags.ffprobe_path)),
            TagBackend::None => Arc::new(NoTagReader),
        };

        Ok(Self::new(registry, staging)
            .with_tag_reader(tag_reader)
            .with_decoder_status_check(config.pipeline.check_decoder_status))
    }

    /// Sets the executable resolver.
    pub fn with_resolver(mut self, resolver: Arc<dyn ExecutableResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Sets the tag reader.
    pub fn with_tag_reader(mut self, tag_reader: Arc<dyn TagReader>) -> Self {
        self.tag_reader = tag_reader;
        self
    }

    /// Whether a nonzero decoder exit fails the job.
    pub fn with_decoder_status_check(mut self, enabled: bool) -> Self {
        self.check_decoder_status = enabled;
        self
    }

    pub fn registry(&self) -> &CodecRegistry {
        &self.registry
    }

    pub fn staging(&self) -> &FileStaging {
        &self.staging
    }

    pub fn tag_reader(&self) -> &dyn TagReader {
        self.tag_reader.as_ref()
    }

    pub fn check_decoder_status(&self) -> bool {
        self.check_decoder_status
    }

    /// Looks up both codecs and checks their tools are installed.
    pub fn resolve_codecs(&self, request: &JobRequest) -> Result<ResolvedCodecs, CodecError> {
        let extension = request
            .source_extension()
            .ok_or_else(|| CodecError::unsupported(CodecRole::Decoder, request.source()))?;
        let format = request.target_format();

        let decoder = self.registry.decoder_for(&extension)?;
        let encoder = self.registry.encoder_for(format)?;

        let resolver = self.resolver.as_ref();
        self.registry
            .ensure_available(CodecRole::Decoder, &extension, decoder, resolver)?;
        self.registry
            .ensure_available(CodecRole::Encoder, format, &encoder.command, resolver)?;

        Ok(ResolvedCodecs {
            decoder: decoder.clone(),
            encoder: encoder.clone(),
            extension,
        })
    }
}
