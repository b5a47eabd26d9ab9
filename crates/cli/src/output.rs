//! Human or JSON-envelope output

use console::style;
use serde::Serialize;
use shared::ApiResponse;

/// A failure whose envelope was already printed by [`Output::fail`]
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct Reported(pub String);

/// Output mode selected by the global `--json` flag
#[derive(Debug, Clone, Copy, Default)]
pub struct Output {
    pub json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    /// Print `data` as a success envelope, or hand it to `human` for text output
    pub fn emit<T: Serialize>(&self, data: &T, human: impl FnOnce(&T)) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(&ApiResponse::ok(data))?);
        } else {
            human(data);
        }
        Ok(())
    }

    /// Print `data` as the payload of a failure envelope and return [`Reported`]
    pub fn fail<T: Serialize>(
        &self,
        data: &T,
        message: &str,
        human: impl FnOnce(&T),
    ) -> anyhow::Result<()> {
        if self.json {
            let mut envelope = ApiResponse::err(message);
            envelope.data = Some(data);
            println!("{}", serde_json::to_string_pretty(&envelope)?);
        } else {
            human(data);
        }
        Err(Reported(message.to_string()).into())
    }

    /// Report a failed command
    pub fn error(&self, err: &anyhow::Error) {
        if self.json {
            if err.is::<Reported>() {
                return;
            }
            let envelope = ApiResponse::<()>::err(format!("{:#}", err));
            match serde_json::to_string_pretty(&envelope) {
                Ok(json) => println!("{}", json),
                Err(_) => eprintln!("{:#}", err),
            }
        } else {
            eprintln!("{} {:#}", style("error:").red().bold(), err);
        }
    }
}

pub fn heading(text: &str) {
    println!("{}", style(text).bold().underlined());
}

pub fn field(label: &str, value: impl std::fmt::Display) {
    println!("  {:<24} {}", style(label).dim(), value);
}

/// A category or status word, colored by how bad it is
pub fn badge(word: &str, level: u8) -> String {
    let styled = match level {
        0 | 1 => style(word).green(),
        2 => style(word).yellow(),
        _ => style(word).red().bold(),
    };
    styled.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fail_returns_reported() {
        let output = Output::new(true);
        let err = output.fail(&42, "checksum mismatch", |_| {}).unwrap_err();
        assert!(err.is::<Reported>());
        assert_eq!(err.to_string(), "checksum mismatch");
    }

    #[test]
    fn test_fail_runs_human_printer() {
        let mut printed = false;
        let result = Output::new(false).fail(&"x", "bad", |_| printed = true);
        assert!(result.is_err());
        assert!(printed);
    }
}
