//! The command-shell error type: collapses the core's typed `ClientError`
//! and any heterogeneous `anyhow::Error` (argument parsing, file I/O, JSON
//! shape mismatches in command glue) into one value right before exit-code
//! mapping, mirroring the teacher's binary-level `anyhow` / library-level
//! `thiserror` split.

use core_error::{ClientError, ErrorCategory};
use core_output::Sink;

#[derive(Debug)]
pub enum CliError {
    Client(ClientError),
    Other(anyhow::Error),
}

impl CliError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CliError::Client(e) => e.category(),
            CliError::Other(_) => ErrorCategory::UserError,
        }
    }

    pub fn report(&self, sink: &Sink) {
        match self {
            CliError::Client(e) => sink.error(e),
            CliError::Other(e) => {
                if sink.is_json() {
                    eprintln!("{}", serde_json::json!({ "messages": [e.to_string()] }));
                } else {
                    eprintln!("{e:#}");
                }
            }
        }
    }
}

impl From<ClientError> for CliError {
    fn from(e: ClientError) -> Self {
        CliError::Client(e)
    }
}

impl From<anyhow::Error> for CliError {
    fn from(e: anyhow::Error) -> Self {
        CliError::Other(e)
    }
}

pub type CliResult<T> = Result<T, CliError>;
