//! Error types for docx-templater

use std::path::PathBuf;
use thiserror::Error;

/// Main error type
#[derive(Debug, Error)]
pub enum Error {
    #[error("template package not found: {path}")]
    PackageNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid package: {0}")]
    InvalidPackage(String),

    #[error("main document part not found")]
    MainPartNotFound,

    #[error("no table row contains macro '{0}'")]
    RowNotFound(String),

    #[error("template syntax error: {0}")]
    TemplateSyntax(String),

    #[error("could not load part as XML: {0}")]
    XmlLoad(String),

    #[error("could not bind stylesheet parameter '{0}'")]
    XslParameter(String),

    #[error("could not write package")]
    Write(#[source] std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
