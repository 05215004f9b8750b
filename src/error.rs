//! Error types for the markon library.
//!
//! A single fatal error type, [`MarkonError`], covers the whole pipeline.
//! The converter never partially recovers: any failure aborts the conversion
//! of that document and surfaces here, leaving the caller to decide whether
//! to log and move on to the next page (the CLI does) or abort entirely.
//!
//! Three groups of variants reflect where in the pipeline things broke:
//!
//! * **Conversion** — the document itself is at fault (front matter is not
//!   valid YAML, body cannot be carried by the storage format).
//! * **Input** — the file could not be read at all.
//! * **Publishing** — the Confluence REST API rejected a request or the
//!   page is missing metadata required for publishing.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the markon library.
#[derive(Debug, Error)]
pub enum MarkonError {
    // ── Conversion errors ─────────────────────────────────────────────────
    /// The front-matter block failed to deserialize as YAML.
    #[error("Front matter is not valid YAML: {source}")]
    Frontmatter {
        #[source]
        source: serde_yaml::Error,
    },

    /// The front-matter block parsed, but the top level is not a mapping.
    #[error("Front matter must be a YAML mapping, got {kind}")]
    FrontmatterNotMapping { kind: &'static str },

    /// The markdown body cannot be represented in Confluence storage format.
    #[error("Markdown body cannot be rendered to storage format: {detail}")]
    Markdown { detail: String },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Markdown file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// The file exists but could not be read.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not a supported markdown document.
    #[error("Unsupported file extension for '{path}' (expected .md)")]
    UnsupportedExtension { path: PathBuf },

    // ── Publishing errors ─────────────────────────────────────────────────
    /// The document lacks a front-matter field required for publishing.
    #[error("Front matter is missing '{field}', required to publish '{path}'")]
    MissingMetadata { field: &'static str, path: PathBuf },

    /// A required argument to a Confluence API call was empty.
    #[error("Missing required argument(s): {fields}")]
    MissingArgument { fields: String },

    /// The Confluence API base URL could not be parsed.
    #[error("Invalid Confluence API URL '{url}': {detail}")]
    InvalidApiUrl { url: String, detail: String },

    /// The HTTP request itself failed (connection refused, DNS, TLS, ...).
    #[error("Confluence API request failed: {source}")]
    Http {
        #[source]
        source: reqwest::Error,
    },

    /// The Confluence API answered with a non-success status.
    #[error("Confluence API returned {status} for {method} {path}\n{body}")]
    Api {
        status: u16,
        method: String,
        path: String,
        body: String,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}
