//! # markon
//!
//! Publish markdown documents to Atlassian Confluence.
//!
//! Markdown files carry a YAML front-matter header describing where the
//! page belongs; the body is converted to Confluence's native *storage
//! format* and pushed through the content REST API.
//!
//! ## Pipeline Overview
//!
//! ```text
//! document.md
//!  │
//!  ├─ 1. Split    YAML front matter ⇄ markdown body
//!  ├─ 2. Render   markdown → storage-format markup (pulldown-cmark)
//!  ├─ 3. Layout   TOC sidebar column (30%) + main column (800px)
//!  └─ 4. Publish  create-or-update via the Confluence content API
//! ```
//!
//! Steps 1–3 are pure and synchronous — one call per document, no shared
//! state — so conversion parallelizes trivially. Step 4 is async and lives
//! in [`api`]; the CLI binary wires the two together.
//!
//! ## Quick Start
//!
//! ```rust
//! use markon::convert;
//!
//! let page = convert("---\ntitle: Foo\nconfluence:\n  share: true\n---\nHello **world**")?;
//! assert_eq!(page.page.title.as_deref(), Some("Foo"));
//! assert!(page.markup.contains("<strong>world</strong>"));
//! assert!(page.attachments.is_empty());
//! # Ok::<(), markon::MarkonError>(())
//! ```
//!
//! ## Front-matter contract
//!
//! ```yaml
//! ---
//! title: My Page
//! confluence:
//!   share: true        # required to publish at all
//!   space: DOC         # optional, overrides --space
//!   ancestor_id: 12345 # optional, overrides --ancestor-id
//! ---
//! ```
//!
//! Local images referenced by the body are collected as attachment paths on
//! the converted page; uploading them is left to the caller.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `markon` binary (clap + anyhow + tokio + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! markon = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod api;
pub mod convert;
pub mod error;
pub mod metadata;
pub mod pipeline;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use api::{ConfluenceApi, Label, PageSpec, RemotePage};
pub use convert::{convert, convert_file, page_slug, ConvertedPage, SUPPORTED_EXTENSIONS};
pub use error::MarkonError;
pub use metadata::{AncestorId, ConfluenceMeta, PageMetadata};
pub use pipeline::frontmatter::{split, ParsedDocument, FRONT_MATTER_DELIMITER};
pub use pipeline::storage::{render, RenderResult};
