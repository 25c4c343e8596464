//! Codec registry for the decode/encode process chain.
//!
//! This module maps source extensions to decoder command templates and target
//! formats to encoder command templates. Every template is an argument vector
//! for an external program that reads from standard input and writes to
//! standard output; the decoder produces a WAV stream, the encoder consumes it.
//!
//! # Example
//!
//! ```ignore
//! use transkode_core::codec::{CodecRegistry, CodecRole, SearchPathResolver};
//!
//! let registry = CodecRegistry::with_defaults();
//! let decoder = registry.decoder_for("mp3")?;
//! let encoder = registry.encoder_for("ogg")?;
//!
//! // Fails with MissingTool if oggenc is not installed
//! registry.ensure_available(CodecRole::Encoder, "ogg", &encoder.command, &SearchPathResolver)?;
//! ```

mod error;
mod registry;
mod resolver;
mod types;

pub use error::{CodecError, CodecRole};
pub use registry::CodecRegistry;
pub use resolver::{ExecutableResolver, SearchPathResolver};
pub use types::{CodecCommand, EncoderEntry, TagOptions};
