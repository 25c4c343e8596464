//! Testing utilities and mock implementations.
//!
//! These let queue and job tests run without real codec binaries.
//!
//! # Example
//!
//! ```rust,ignore
//! use transkode_core::testing::MockJob;
//!
//! let (job, control) = MockJob::new("/music/a.mp3", "ogg");
//! manager.add(job);
//! manager.poll().await;
//!
//! // Simulate the encoder exiting
//! control.finish_ok();
//! manager.poll().await;
//! ```

mod mock_job;
mod mock_tag_reader;
mod static_resolver;

pub use mock_job::{MockJob, MockJobControl};
pub use mock_tag_reader::MockTagReader;
pub use static_resolver::StaticResolver;
