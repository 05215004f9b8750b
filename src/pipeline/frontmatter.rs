//! Front-matter splitting: separate the YAML header from the markdown body.
//!
//! ## How the scan works
//!
//! The splitter walks the document line by line with a single boolean state,
//! "in header". A line whose trimmed content is `---` flips the state to
//! body mode, but only when the header accumulator is already non-empty.
//! The *first* `---` therefore lands in the header accumulator itself —
//! harmless, since YAML treats a leading `---` as a document-start marker.
//! Once the state has flipped, every remaining line (further `---` lines
//! included) belongs to the body.
//!
//! ## The degenerate-header quirk
//!
//! A document with a single `---` and no closing delimiter never leaves
//! header mode: the whole file is parsed as YAML and the body comes back
//! empty. Likewise a document with no delimiter at all. This mirrors the
//! long-standing upstream behaviour and is deliberately not "fixed" — it is
//! not a parse error, and downstream eligibility checks (`confluence.share`)
//! keep such documents from being published by accident.

use crate::error::MarkonError;
use serde_yaml::{Mapping, Value};
use tracing::debug;

/// Line that terminates the front-matter block (after trimming).
pub const FRONT_MATTER_DELIMITER: &str = "---";

/// A document split into structured metadata and a markdown body.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument {
    /// Deserialized front matter. Empty when the header is absent or null.
    pub metadata: Mapping,
    /// Markdown body, whitespace-trimmed at both ends. Never contains the
    /// front-matter block.
    pub body: String,
}

/// Split a raw document into front matter and markdown body.
///
/// # Errors
/// Returns [`MarkonError::Frontmatter`] when the header is not valid YAML
/// and [`MarkonError::FrontmatterNotMapping`] when it parses to something
/// other than a mapping (or null). Both are fatal for the document.
pub fn split(raw_text: &str) -> Result<ParsedDocument, MarkonError> {
    let mut header = String::new();
    let mut body = String::new();
    let mut in_header = true;

    for line in raw_text.lines() {
        if line.trim() == FRONT_MATTER_DELIMITER && in_header && !header.is_empty() {
            // Closing delimiter: consumed, belongs to neither side.
            in_header = false;
            continue;
        }
        if in_header {
            header.push_str(line);
            header.push('\n');
        } else {
            body.push_str(line);
            body.push('\n');
        }
    }

    let metadata = parse_header(&header)?;
    debug!(
        keys = metadata.len(),
        body_bytes = body.trim().len(),
        "Split document"
    );

    Ok(ParsedDocument {
        metadata,
        body: body.trim().to_string(),
    })
}

/// Deserialize the accumulated header text into a YAML mapping.
///
/// Empty or null headers become an empty mapping; any other non-mapping
/// top level (scalar, sequence) is rejected.
fn parse_header(header: &str) -> Result<Mapping, MarkonError> {
    if header.trim().is_empty() {
        return Ok(Mapping::new());
    }

    let value: Value =
        serde_yaml::from_str(header).map_err(|source| MarkonError::Frontmatter { source })?;

    match value {
        Value::Null => Ok(Mapping::new()),
        Value::Mapping(m) => Ok(m),
        Value::Bool(_) => Err(MarkonError::FrontmatterNotMapping { kind: "boolean" }),
        Value::Number(_) => Err(MarkonError::FrontmatterNotMapping { kind: "number" }),
        Value::String(_) => Err(MarkonError::FrontmatterNotMapping { kind: "string" }),
        Value::Sequence(_) => Err(MarkonError::FrontmatterNotMapping { kind: "sequence" }),
        Value::Tagged(_) => Err(MarkonError::FrontmatterNotMapping { kind: "tagged value" }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata_str<'a>(doc: &'a ParsedDocument, key: &str) -> Option<&'a str> {
        doc.metadata.get(key).and_then(Value::as_str)
    }

    #[test]
    fn splits_well_formed_document() {
        let doc = split("---\ntitle: Foo\n---\nHello **world**").unwrap();
        assert_eq!(metadata_str(&doc, "title"), Some("Foo"));
        assert_eq!(doc.body, "Hello **world**");
    }

    #[test]
    fn recovers_body_exactly_after_trim() {
        let raw = "---\ntitle: Foo\n---\n\n# Heading\n\nParagraph text.\n\n";
        let doc = split(raw).unwrap();
        assert_eq!(doc.body, "# Heading\n\nParagraph text.");
        // Re-trimming is a no-op.
        assert_eq!(doc.body.trim(), doc.body);
    }

    #[test]
    fn nested_metadata_survives() {
        let raw = "---\ntitle: Foo\nconfluence:\n  share: true\n  space: DOC\n---\nbody";
        let doc = split(raw).unwrap();
        let confluence = doc
            .metadata
            .get("confluence")
            .and_then(Value::as_mapping)
            .unwrap();
        assert_eq!(confluence.get("share").and_then(Value::as_bool), Some(true));
    }

    #[test]
    fn later_delimiters_stay_in_body() {
        let raw = "---\ntitle: Foo\n---\nbefore\n---\nafter";
        let doc = split(raw).unwrap();
        assert_eq!(doc.body, "before\n---\nafter");
    }

    #[test]
    fn degenerate_single_delimiter() {
        // One delimiter, nothing before it, no closing delimiter: the whole
        // file stays in header mode. Documented quirk, not a parse error.
        let doc = split("---\n").unwrap();
        assert!(doc.metadata.is_empty());
        assert_eq!(doc.body, "");
    }

    #[test]
    fn unclosed_header_consumes_everything() {
        let doc = split("---\ntitle: Foo\nauthor: Bar").unwrap();
        assert_eq!(metadata_str(&doc, "title"), Some("Foo"));
        assert_eq!(metadata_str(&doc, "author"), Some("Bar"));
        assert_eq!(doc.body, "");
    }

    #[test]
    fn document_without_front_matter_is_all_header() {
        // With no delimiter at all the scan never leaves header mode, so a
        // plain markdown file parses as a YAML scalar and is rejected.
        let err = split("Just some prose, no front matter.").unwrap_err();
        assert!(matches!(
            err,
            MarkonError::FrontmatterNotMapping { kind: "string" }
        ));
    }

    #[test]
    fn empty_document() {
        let doc = split("").unwrap();
        assert!(doc.metadata.is_empty());
        assert_eq!(doc.body, "");
    }

    #[test]
    fn invalid_yaml_is_fatal() {
        let err = split("---\ntitle: [unclosed\n---\nbody").unwrap_err();
        assert!(matches!(err, MarkonError::Frontmatter { .. }));
    }

    #[test]
    fn indented_delimiter_still_closes() {
        // The delimiter check trims the line first.
        let doc = split("---\ntitle: Foo\n  ---  \nbody").unwrap();
        assert_eq!(metadata_str(&doc, "title"), Some("Foo"));
        assert_eq!(doc.body, "body");
    }
}
