//! grc evidence command

use clap::{Args, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use crate::output::{badge, field, heading, Output};

#[derive(Debug, Args)]
pub struct EvidenceCommand {
    #[command(subcommand)]
    pub command: EvidenceSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum EvidenceSubcommand {
    /// Print the SHA-256 content hash of an evidence file
    Hash {
        file: PathBuf,
    },
    /// Check a file against a previously recorded hash
    Verify {
        file: PathBuf,
        /// Expected hex SHA-256
        #[arg(long)]
        hash: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileHash {
    pub file: PathBuf,
    pub sha256: String,
    pub size_bytes: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HashCheck {
    pub file: PathBuf,
    pub expected: String,
    pub actual: String,
    pub matches: bool,
}

pub fn hash_file(file: &PathBuf) -> anyhow::Result<FileHash> {
    let content = std::fs::read(file)?;
    Ok(FileHash {
        file: file.clone(),
        sha256: audit::sha256_hex(&content),
        size_bytes: content.len(),
    })
}

fn print_check(c: &HashCheck) {
    heading("Evidence verification");
    field("file", c.file.display());
    field("expected", &c.expected);
    field("actual", &c.actual);
    let verdict = if c.matches {
        badge("match", 0)
    } else {
        badge("MISMATCH", 4)
    };
    field("result", verdict);
}

impl EvidenceCommand {
    pub fn run(&self, output: Output) -> anyhow::Result<()> {
        match &self.command {
            EvidenceSubcommand::Hash { file } => {
                let hashed = hash_file(file)?;
                output.emit(&hashed, |h| {
                    heading("Evidence hash");
                    field("file", h.file.display());
                    field("size", format!("{} bytes", h.size_bytes));
                    field("sha256", &h.sha256);
                })
            }
            EvidenceSubcommand::Verify { file, hash } => {
                let hashed = hash_file(file)?;
                let check = HashCheck {
                    file: file.clone(),
                    expected: hash.trim().to_ascii_lowercase(),
                    matches: hashed.sha256.eq_ignore_ascii_case(hash.trim()),
                    actual: hashed.sha256,
                };
                if check.matches {
                    output.emit(&check, print_check)
                } else {
                    output.fail(&check, "content hash does not match", print_check)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_hash_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"abc").unwrap();

        let hashed = hash_file(&file.path().to_path_buf()).unwrap();
        assert_eq!(
            hashed.sha256,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(hashed.size_bytes, 3);
    }

    #[test]
    fn test_verify_mismatch_fails() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"abc").unwrap();

        let cmd = EvidenceCommand {
            command: EvidenceSubcommand::Verify {
                file: file.path().to_path_buf(),
                hash: audit::GENESIS_HASH.to_string(),
            },
        };
        let err = cmd.run(Output::new(true)).unwrap_err();
        assert!(err.is::<crate::output::Reported>());
    }
}
