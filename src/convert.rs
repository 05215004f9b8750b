//! Document conversion entry points.
//!
//! [`convert`] is the core operation: split the front matter, render the
//! body to layout-wrapped storage markup, and surface the typed metadata
//! contract. It is a pure, synchronous function holding only call-local
//! state, so callers may parallelize over documents however they like —
//! one conversion per task needs no coordination.
//!
//! [`convert_file`] adds the initial full-document read and slug
//! derivation; everything downstream of the read is the same pure path.

use crate::error::MarkonError;
use crate::metadata::PageMetadata;
use crate::pipeline::{frontmatter, storage};
use serde_yaml::Mapping;
use std::path::Path;
use tracing::debug;

/// Markdown extensions accepted by [`convert_file`].
pub const SUPPORTED_EXTENSIONS: &[&str] = &["md"];

/// A fully converted document, ready for the publishing layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedPage {
    /// Raw front-matter mapping, for callers with their own contract.
    pub metadata: Mapping,
    /// The publishing contract deserialized from `metadata`.
    pub page: PageMetadata,
    /// Layout-wrapped storage-format markup.
    pub markup: String,
    /// Local image paths to upload alongside the page, first-seen order,
    /// duplicates preserved.
    pub attachments: Vec<String>,
}

/// Convert raw document text to storage-format markup.
///
/// # Errors
/// Fatal for the whole document: invalid front matter
/// ([`MarkonError::Frontmatter`], [`MarkonError::FrontmatterNotMapping`])
/// or an unrenderable body ([`MarkonError::Markdown`]). There is no
/// partial result.
pub fn convert(raw_text: &str) -> Result<ConvertedPage, MarkonError> {
    let document = frontmatter::split(raw_text)?;
    let page = PageMetadata::from_mapping(&document.metadata)?;
    let rendered = storage::render(&document.body)?;

    Ok(ConvertedPage {
        metadata: document.metadata,
        page,
        markup: rendered.markup,
        attachments: rendered.attachments,
    })
}

/// Read a markdown file and convert it.
///
/// The read happens once, up front; no further I/O occurs during
/// conversion.
pub fn convert_file(path: impl AsRef<Path>) -> Result<ConvertedPage, MarkonError> {
    let path = path.as_ref();

    let supported = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| SUPPORTED_EXTENSIONS.contains(&e));
    if !supported {
        return Err(MarkonError::UnsupportedExtension {
            path: path.to_path_buf(),
        });
    }

    let raw_text = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            MarkonError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            MarkonError::ReadFailed {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    debug!(path = %path.display(), bytes = raw_text.len(), "Read markdown file");
    convert(&raw_text)
}

/// Derive the page slug from a file path: the stem with `-` turned into `_`.
///
/// The slug doubles as the page label used to find existing pages.
pub fn page_slug(path: impl AsRef<Path>) -> String {
    path.as_ref()
        .file_stem()
        .map(|s| s.to_string_lossy().replace('-', "_"))
        .unwrap_or_default()
}
