//! Track tags and their injection into encoder arguments.
//!
//! Tags are read from the staged source file by a [`TagReader`] and turned
//! into encoder flags by the [`TagInjector`]. Reading is best effort: a reader
//! that cannot produce tags returns `None` and the job proceeds untagged.

mod ffprobe;
mod injector;
mod reader;
mod types;

pub use ffprobe::FfprobeTagReader;
pub use injector::{TagInjector, SUBSTITUTION_MARKER};
pub use reader::{NoTagReader, TagReader};
pub use types::{TagField, TagSet, TagValue};
