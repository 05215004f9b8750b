//! Pipeline stages for markdown-to-Confluence conversion.
//!
//! Each submodule implements exactly one transformation step, keeping every
//! stage independently testable.
//!
//! ## Data Flow
//!
//! ```text
//! raw text ──▶ frontmatter ──▶ storage ──▶ layout
//! (file body)  (YAML split)   (markup +   (column
//!                             attachments) wrapping)
//! ```
//!
//! 1. [`frontmatter`] — split the YAML header from the markdown body
//! 2. [`storage`]     — render the body to storage-format markup, collecting
//!    local image paths as attachments
//! 3. [`layout`]      — wrap the rendered body in the TOC-sidebar + main
//!    column skeleton (invoked by [`storage::render`])

pub mod frontmatter;
pub mod layout;
pub mod storage;
