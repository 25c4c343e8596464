use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Queue concurrency and poll interval are not 0
/// - Staging chunk size is not 0 and the prefix is not empty
/// - Codec overrides have a program to run
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.queue.max_concurrency == 0 {
        return Err(invalid("queue.max_concurrency cannot be 0"));
    }
    if config.queue.poll_interval_ms == 0 {
        return Err(invalid("queue.poll_interval_ms cannot be 0"));
    }

    if config.staging.chunk_size == 0 {
        return Err(invalid("staging.chunk_size cannot be 0"));
    }
    if config.staging.prefix.is_empty() {
        return Err(invalid("staging.prefix cannot be empty"));
    }

    for (ext, command) in &config.codecs.decoders {
        if command.args.is_empty() {
            return Err(invalid(format!("codecs.decoders.{}.args cannot be empty", ext)));
        }
    }
    for (format, entry) in &config.codecs.encoders {
        if entry.command.args.is_empty() {
            return Err(invalid(format!("codecs.encoders.{}.args cannot be empty", format)));
        }
    }

    if let Some(command) = &config.notify.command {
        if command.is_empty() {
            return Err(invalid("notify.command cannot be empty"));
        }
    }

    Ok(())
}

fn invalid(reason: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(reason.into())
}
