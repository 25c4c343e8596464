//! Completion reporting for finished jobs.

use anyhow::{Context, Result};
use std::io::Write;
use tokio::process::Command;
use tracing::{info, warn};

use transkode_core::config::NotifyConfig;
use transkode_core::Job;

/// Event name written for every finished job.
pub const COMPLETION_EVENT: &str = "transcodingFinished";

/// Tells the host about finished jobs, then cleans them up.
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    command: Option<Vec<String>>,
}

impl Notifier {
    pub fn new(config: &NotifyConfig) -> Self {
        Self {
            command: config.command.clone().filter(|c| !c.is_empty()),
        }
    }

    /// Reports `job` on stdout or through the notify command, then runs its
    /// cleanup. Reporting failures are logged, never raised.
    pub fn finish<J: Job>(&self, mut job: J) {
        let stdout = std::io::stdout();
        if let Err(e) = self.report(&job, &mut stdout.lock()) {
            warn!("Failed to report job {}: {:#}", job.id(), e);
        }
        job.cleanup();
    }

    /// Reports one finished job. `out` is used when no command is set.
    pub fn report<J: Job, W: Write>(&self, job: &J, out: &mut W) -> Result<()> {
        let source = job.request().source();
        let url = if job.succeeded() { job.output_url() } else { None };

        match job.error_message() {
            Some(message) => warn!("Transcoding {} failed: {}", source, message),
            None => info!(
                "Transcoded {} in {:?}: {}",
                source,
                job.elapsed().unwrap_or_default(),
                url.as_deref().unwrap_or_default()
            ),
        }

        match &self.command {
            Some(command) => spawn_notify(command, source, url.as_deref().unwrap_or_default()),
            None => {
                writeln!(out, "{}", completion_line(source, url.as_deref()))
                    .context("Failed to write completion line")?;
                out.flush().context("Failed to flush completion line")
            }
        }
    }
}

/// `transcodingFinished <source> <url>`, with `""` standing in for no URL.
pub fn completion_line(source: &str, url: Option<&str>) -> String {
    format!(
        "{} {} {}",
        COMPLETION_EVENT,
        source,
        url.filter(|u| !u.is_empty()).unwrap_or("\"\"")
    )
}

fn spawn_notify(command: &[String], source: &str, url: &str) -> Result<()> {
    let (program, args) = command
        .split_first()
        .context("Notify command is empty")?;

    Command::new(program)
        .args(args)
        .arg(source)
        .arg(url)
        .spawn()
        .with_context(|| format!("Failed to run notify command {}", program))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use transkode_core::testing::MockJob;

    #[test]
    fn test_completion_line() {
        assert_eq!(
            completion_line("/music/a.mp3", Some("file:///tmp/transcode-1.ogg")),
            "transcodingFinished /music/a.mp3 file:///tmp/transcode-1.ogg"
        );
        assert_eq!(
            completion_line("/music/a.mp3", None),
            "transcodingFinished /music/a.mp3 \"\""
        );
    }

    #[tokio::test]
    async fn test_report_success_to_writer() {
        let (mut job, control) = MockJob::new("/music/a.mp3", "ogg");
        job = job.with_output_path("/tmp/transcode-1.ogg");
        job.start().await;
        control.finish_ok();
        assert!(job.is_finished());

        let mut out = Vec::new();
        Notifier::default().report(&job, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "transcodingFinished /music/a.mp3 file:///tmp/transcode-1.ogg\n"
        );
    }

    #[tokio::test]
    async fn test_report_failure_has_empty_url() {
        let (job, control) = MockJob::new("/music/a.mp3", "ogg");
        let mut job = job.with_output_path("/tmp/transcode-1.ogg");
        job.start().await;
        control.finish_with_error("oggenc: bad input");
        assert!(job.is_finished());

        let mut out = Vec::new();
        Notifier::default().report(&job, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "transcodingFinished /music/a.mp3 \"\"\n"
        );
    }

    #[tokio::test]
    async fn test_finish_runs_cleanup() {
        let (mut job, control) = MockJob::new("/music/a.mp3", "ogg");
        job.start().await;
        control.finish_ok();
        assert!(job.is_finished());

        let notifier = Notifier::new(&NotifyConfig {
            command: Some(vec!["true".to_string()]),
        });
        notifier.finish(job);
        assert_eq!(control.cleanup_count(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_notify_command_receives_source_and_url() {
        let dir = tempfile::TempDir::new().unwrap();
        let marker = dir.path().join("notified");
        let script = format!("echo \"$0 $1\" > '{}'", marker.display());

        let (job, control) = MockJob::new("/music/a.mp3", "ogg");
        let mut job = job.with_output_path("/tmp/transcode-1.ogg");
        job.start().await;
        control.finish_ok();
        assert!(job.is_finished());

        let notifier = Notifier::new(&NotifyConfig {
            command: Some(vec!["sh".to_string(), "-c".to_string(), script]),
        });
        let mut out = Vec::new();
        notifier.report(&job, &mut out).unwrap();
        assert!(out.is_empty());

        for _ in 0..200 {
            if let Ok(contents) = std::fs::read_to_string(&marker) {
                if contents.ends_with('\n') {
                    assert_eq!(contents, "/music/a.mp3 file:///tmp/transcode-1.ogg\n");
                    return;
                }
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("notify command did not run");
    }

    #[test]
    fn test_empty_command_falls_back_to_stdout() {
        let notifier = Notifier::new(&NotifyConfig {
            command: Some(Vec::new()),
        });
        assert!(notifier.command.is_none());
    }
}
