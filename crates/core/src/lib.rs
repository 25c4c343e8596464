pub mod codec;
pub mod config;
pub mod job;
pub mod queue;
pub mod tags;
pub mod testing;

pub use codec::{
    CodecCommand, CodecError, CodecRegistry, CodecRole, EncoderEntry, ExecutableResolver,
    SearchPathResolver, TagOptions,
};
pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config,
    ConfigError, TagBackend,
};
pub use job::{
    CleanupOutcome, CleanupSets, FileStaging, Job, JobContext, JobError, JobRequest, JobState,
    SourceRef, TranscodeJob,
};
pub use queue::{PollSummary, QueueManager, QueueStatus};
pub use tags::{
    FfprobeTagReader, NoTagReader, TagField, TagInjector, TagReader, TagSet, TagValue,
};
