//! Line protocol read from stdin.

use anyhow::{bail, Result};

/// A request from the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `transcode <source> <format>`
    Transcode { source: String, format: String },
    /// `quit`
    Quit,
}

/// Parses one input line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Command>> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((&command, args)) = words.split_first() else {
        return Ok(None);
    };

    match command {
        "transcode" => match args {
            [source, format] => Ok(Some(Command::Transcode {
                source: source.to_string(),
                format: format.to_string(),
            })),
            _ => bail!(
                "transcode expects <source> <format>, got {} argument(s)",
                args.len()
            ),
        },
        "quit" => Ok(Some(Command::Quit)),
        other => bail!("unknown command '{}'", other),
    }
}
