//! Page layout: wrap rendered content in the two-column macro structure.
//!
//! Every published page uses the same skeleton: a narrow sidebar column
//! holding a table-of-contents macro, then a fixed-width main column holding
//! the rendered body. Both are `column` structured macros whose inner markup
//! travels in an `ac:rich-text-body`. The TOC macro excludes the headings it
//! would duplicate ("Table of Contents" itself) and the "Authors" block.

use std::fmt::Write as _;

/// Sidebar column width.
pub const SIDEBAR_WIDTH: &str = "30%";

/// Main content column width.
pub const MAIN_WIDTH: &str = "800px";

/// Headings hidden from the generated table of contents.
pub const TOC_EXCLUDE_PATTERN: &str = "^(Authors|Table of Contents)$";

/// Wrap rendered body markup in the sidebar + main column layout.
///
/// The main column's inner markup is `content`, verbatim.
pub fn wrap(content: &str) -> String {
    let sidebar = format!("<h1>Table of Contents</h1><p>{}</p>", toc_macro());
    let mut markup = column(SIDEBAR_WIDTH, &sidebar);
    markup.push_str(&column(MAIN_WIDTH, content));
    markup
}

/// Extract the main column's inner markup from layout-wrapped output.
///
/// Returns `None` when `markup` was not produced by [`wrap`].
pub fn main_content(markup: &str) -> Option<&str> {
    let open = format!(
        "<ac:parameter ac:name=\"width\">{MAIN_WIDTH}</ac:parameter><ac:rich-text-body>"
    );
    let start = markup.find(&open)? + open.len();
    let end = markup[start..].rfind("</ac:rich-text-body>")?;
    Some(&markup[start..start + end])
}

/// A `column` structured macro with the given width and rich-text body.
fn column(width: &str, body: &str) -> String {
    let mut out = String::with_capacity(body.len() + 160);
    out.push_str("<ac:structured-macro ac:name=\"column\" ac:schema-version=\"1\">");
    let _ = write!(
        out,
        "<ac:parameter ac:name=\"width\">{width}</ac:parameter>"
    );
    let _ = write!(out, "<ac:rich-text-body>{body}</ac:rich-text-body>");
    out.push_str("</ac:structured-macro>");
    out
}

/// The table-of-contents structured macro for the sidebar.
fn toc_macro() -> String {
    format!(
        "<ac:structured-macro ac:name=\"toc\" ac:schema-version=\"1\">\
         <ac:parameter ac:name=\"exclude\">{TOC_EXCLUDE_PATTERN}</ac:parameter>\
         </ac:structured-macro>"
    )
}
