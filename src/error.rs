// Error types shared across the crate

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::eval::EvalError;
use crate::parser::ParseError;
use crate::rpc::ErrorObject;

/// Everything that can go wrong while turning an expression into its
/// reduced form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("evaluation error: {0}")]
    Eval(#[from] EvalError),
}

/// Errors that stop the server itself, as opposed to a single request.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("failed to remove existing socket file {path}: {source}")]
    RemoveSocket {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to bind socket {path}: {source}")]
    Bind {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to install signal handler: {0}")]
    Signal(#[source] io::Error),
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("connection error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid JSON from server: {0}")]
    Json(#[from] serde_json::Error),

    #[error("server closed the connection")]
    Closed,

    #[error("server returned error {}: {}", .0.code, .0.message)]
    Remote(ErrorObject),

    #[error("unexpected result: {0}")]
    UnexpectedResult(serde_json::Value),
}
