//! Markdown → Confluence storage-format rendering.
//!
//! ## Why an event-driven writer?
//!
//! `pulldown-cmark` exposes the document as a stream of `Start`/`End`/leaf
//! events over a closed set of node tags. Emitting markup directly from the
//! event stream keeps the renderer a single pass with no intermediate tree,
//! and the `match` over [`pulldown_cmark::Tag`] gives one emission rule per
//! node type. The writer owns only call-local state (its output buffer and
//! the attachment list), so document conversions stay independent and can be
//! parallelized freely by the caller.
//!
//! ## Image handling
//!
//! Images are the one node with dialect-specific behaviour. An image source
//! that parses as a URL with a non-empty host is *external* and rendered as
//! a `<ri:url>` reference carrying the literal source. Anything else is a
//! *local* attachment: the emitted tag carries only the file's base name,
//! while the untouched source path is recorded in
//! [`RenderResult::attachments`] — first-seen order, duplicates preserved —
//! for the upload layer to ship alongside the page. Alt text and titles are
//! accepted by the markdown parser but do not appear in the emitted tag,
//! matching upstream behaviour.

use crate::error::MarkonError;
use crate::pipeline::layout;
use pulldown_cmark::{CodeBlockKind, Event, LinkType, Options, Parser, Tag, TagEnd};
use std::fmt::Write as _;
use tracing::debug;

/// The outcome of rendering one markdown body.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderResult {
    /// Storage-format markup: TOC sidebar column followed by the main
    /// content column.
    pub markup: String,
    /// Local image paths referenced by the body, in order of first
    /// appearance, duplicates preserved. External image URLs never
    /// appear here.
    pub attachments: Vec<String>,
}

/// Render a markdown body to layout-wrapped Confluence storage format.
///
/// # Errors
/// Returns [`MarkonError::Markdown`] when the body contains characters the
/// storage format (an XML dialect) cannot carry. There is no partial-render
/// recovery.
pub fn render(body: &str) -> Result<RenderResult, MarkonError> {
    if let Some(c) = body.chars().find(|&c| is_xml_illegal(c)) {
        return Err(MarkonError::Markdown {
            detail: format!("control character U+{:04X} is not representable", c as u32),
        });
    }

    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut writer = StorageWriter::default();
    writer.run(Parser::new_ext(body, options));

    debug!(
        markup_bytes = writer.out.len(),
        attachments = writer.attachments.len(),
        "Rendered markdown body"
    );

    Ok(RenderResult {
        markup: layout::wrap(&writer.out),
        attachments: writer.attachments,
    })
}

/// Characters no XML 1.0 document (storage format included) can encode.
fn is_xml_illegal(c: char) -> bool {
    c < '\u{20}' && !matches!(c, '\t' | '\n' | '\r')
}

/// Classify an image source: external iff it parses as a URL with a
/// non-empty host. Relative paths fail URL parsing and scheme-only
/// references (`mailto:`, `file:///...`) have no host, so both count as
/// local.
fn is_external_source(src: &str) -> bool {
    url::Url::parse(src)
        .ok()
        .and_then(|u| u.host_str().map(|h| !h.is_empty()))
        .unwrap_or(false)
}

/// Strip directory components from an image source, keeping the base name.
fn base_name(src: &str) -> &str {
    src.rsplit('/').next().unwrap_or(src)
}

/// A fenced or indented code block being captured for the `code` macro.
struct CodeCapture {
    language: Option<String>,
    text: String,
}

/// Single-pass writer from `pulldown-cmark` events to storage markup.
#[derive(Default)]
struct StorageWriter {
    out: String,
    attachments: Vec<String>,
    /// Inside `<thead>`: table cells render as `<th>` instead of `<td>`.
    in_table_head: bool,
    /// Nesting depth of image tags; inner alt-text events are dropped.
    image_depth: usize,
    /// Set while buffering a code block for its CDATA body.
    code: Option<CodeCapture>,
}

impl StorageWriter {
    fn run<'a>(&mut self, events: impl Iterator<Item = Event<'a>>) {
        for event in events {
            match event {
                Event::Start(tag) => self.start_tag(tag),
                Event::End(tag) => self.end_tag(tag),
                Event::Text(text) => {
                    if let Some(code) = self.code.as_mut() {
                        code.text.push_str(&text);
                    } else if self.image_depth == 0 {
                        self.out.push_str(&escape_xml(&text));
                    }
                }
                Event::Code(text) => {
                    if self.image_depth == 0 {
                        let _ = write!(self.out, "<code>{}</code>", escape_xml(&text));
                    }
                }
                // Raw HTML passes through: storage format is an XHTML
                // dialect and upstream forwards author markup verbatim.
                Event::Html(html) | Event::InlineHtml(html) => {
                    if self.image_depth == 0 {
                        self.out.push_str(&html);
                    }
                }
                Event::SoftBreak => {
                    if self.image_depth == 0 {
                        self.out.push('\n');
                    }
                }
                Event::HardBreak => {
                    if self.image_depth == 0 {
                        self.out.push_str("<br />");
                    }
                }
                Event::Rule => self.out.push_str("<hr />"),
                _ => {}
            }
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        // Alt text is dropped wholesale, markup included. Nested image
        // starts still count so the depth balances on the matching ends.
        if self.image_depth > 0 {
            if matches!(tag, Tag::Image { .. }) {
                self.image_depth += 1;
            }
            return;
        }
        match tag {
            Tag::Paragraph => self.out.push_str("<p>"),
            Tag::Heading { level, .. } => {
                let _ = write!(self.out, "<{level}>");
            }
            Tag::BlockQuote(_) => self.out.push_str("<blockquote>"),
            Tag::CodeBlock(kind) => {
                let language = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .filter(|l| !l.is_empty())
                        .map(str::to_owned),
                    CodeBlockKind::Indented => None,
                };
                self.code = Some(CodeCapture {
                    language,
                    text: String::new(),
                });
            }
            Tag::List(Some(1)) => self.out.push_str("<ol>"),
            Tag::List(Some(start)) => {
                let _ = write!(self.out, "<ol start=\"{start}\">");
            }
            Tag::List(None) => self.out.push_str("<ul>"),
            Tag::Item => self.out.push_str("<li>"),
            Tag::Table(_) => self.out.push_str("<table>"),
            Tag::TableHead => {
                self.in_table_head = true;
                self.out.push_str("<thead><tr>");
            }
            Tag::TableRow => self.out.push_str("<tr>"),
            Tag::TableCell => self
                .out
                .push_str(if self.in_table_head { "<th>" } else { "<td>" }),
            Tag::Emphasis => self.out.push_str("<em>"),
            Tag::Strong => self.out.push_str("<strong>"),
            Tag::Strikethrough => self.out.push_str("<s>"),
            Tag::Link {
                link_type,
                dest_url,
                ..
            } => {
                let href = match link_type {
                    LinkType::Email => format!("mailto:{dest_url}"),
                    _ => dest_url.to_string(),
                };
                let _ = write!(self.out, "<a href=\"{}\">", escape_xml(&href));
            }
            Tag::Image { dest_url, .. } => {
                self.image(&dest_url);
                self.image_depth += 1;
            }
            Tag::HtmlBlock => {}
            _ => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        if self.image_depth > 0 {
            if tag == TagEnd::Image {
                self.image_depth -= 1;
            }
            return;
        }
        match tag {
            TagEnd::Paragraph => self.out.push_str("</p>"),
            TagEnd::Heading(level) => {
                let _ = write!(self.out, "</{level}>");
            }
            TagEnd::BlockQuote(_) => self.out.push_str("</blockquote>"),
            TagEnd::CodeBlock => {
                if let Some(code) = self.code.take() {
                    self.code_macro(code);
                }
            }
            TagEnd::List(true) => self.out.push_str("</ol>"),
            TagEnd::List(false) => self.out.push_str("</ul>"),
            TagEnd::Item => self.out.push_str("</li>"),
            TagEnd::Table => self.out.push_str("</tbody></table>"),
            TagEnd::TableHead => {
                self.in_table_head = false;
                self.out.push_str("</tr></thead><tbody>");
            }
            TagEnd::TableRow => self.out.push_str("</tr>"),
            TagEnd::TableCell => self
                .out
                .push_str(if self.in_table_head { "</th>" } else { "</td>" }),
            TagEnd::Emphasis => self.out.push_str("</em>"),
            TagEnd::Strong => self.out.push_str("</strong>"),
            TagEnd::Strikethrough => self.out.push_str("</s>"),
            TagEnd::Link => self.out.push_str("</a>"),
            TagEnd::HtmlBlock => {}
            _ => {}
        }
    }

    /// Emit an image reference, collecting local sources as attachments.
    fn image(&mut self, src: &str) {
        self.out.push_str("<ac:image>");
        if is_external_source(src) {
            let _ = write!(self.out, "<ri:url ri:value=\"{}\" />", escape_xml(src));
        } else {
            let _ = write!(
                self.out,
                "<ri:attachment ri:filename=\"{}\" />",
                escape_xml(base_name(src))
            );
            self.attachments.push(src.to_string());
        }
        self.out.push_str("</ac:image>");
    }

    /// Emit a buffered code block as the Confluence `code` structured macro.
    fn code_macro(&mut self, code: CodeCapture) {
        self.out
            .push_str("<ac:structured-macro ac:name=\"code\" ac:schema-version=\"1\">");
        if let Some(language) = code.language {
            let _ = write!(
                self.out,
                "<ac:parameter ac:name=\"language\">{}</ac:parameter>",
                escape_xml(&language)
            );
        }
        let _ = write!(
            self.out,
            "<ac:plain-text-body><![CDATA[{}]]></ac:plain-text-body>",
            escape_cdata(code.text.trim_end_matches('\n'))
        );
        self.out.push_str("</ac:structured-macro>");
    }
}

/// Escape XML special characters in text content and attribute values.
fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// A literal `]]>` would terminate the CDATA section early; split it across
/// two sections.
fn escape_cdata(s: &str) -> String {
    s.replace("]]>", "]]]]><![CDATA[>")
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Render and return only the main column's inner markup.
    fn render_body(body: &str) -> String {
        let result = render(body).unwrap();
        layout::main_content(&result.markup)
            .expect("markup has a main column")
            .to_string()
    }

    #[test]
    fn paragraph_and_emphasis() {
        assert_eq!(
            render_body("Hello **world** and *others*"),
            "<p>Hello <strong>world</strong> and <em>others</em></p>"
        );
    }

    #[test]
    fn headings() {
        assert_eq!(render_body("# One"), "<h1>One</h1>");
        assert_eq!(render_body("### Three"), "<h3>Three</h3>");
    }

    #[test]
    fn links_and_inline_code() {
        assert_eq!(
            render_body("See [docs](https://example.com/a?b=1&c=2) or `code`"),
            "<p>See <a href=\"https://example.com/a?b=1&amp;c=2\">docs</a> \
             or <code>code</code></p>"
        );
    }

    #[test]
    fn lists() {
        assert_eq!(
            render_body("- a\n- b"),
            "<ul><li>a</li><li>b</li></ul>"
        );
        assert_eq!(
            render_body("3. a\n4. b"),
            "<ol start=\"3\"><li>a</li><li>b</li></ol>"
        );
    }

    #[test]
    fn fenced_code_becomes_code_macro() {
        let markup = render_body("```rust\nfn main() {}\n```");
        assert_eq!(
            markup,
            "<ac:structured-macro ac:name=\"code\" ac:schema-version=\"1\">\
             <ac:parameter ac:name=\"language\">rust</ac:parameter>\
             <ac:plain-text-body><![CDATA[fn main() {}]]></ac:plain-text-body>\
             </ac:structured-macro>"
        );
    }

    #[test]
    fn cdata_terminator_is_split() {
        let markup = render_body("```\na ]]> b\n```");
        assert!(markup.contains("a ]]]]><![CDATA[> b"));
        assert!(!markup.contains("a ]]> b"));
    }

    #[test]
    fn external_image_is_not_collected() {
        let result = render("![alt](https://example.com/x.png)").unwrap();
        assert!(result
            .markup
            .contains("<ac:image><ri:url ri:value=\"https://example.com/x.png\" /></ac:image>"));
        assert!(result.attachments.is_empty());
    }

    #[test]
    fn local_image_is_collected_with_base_name_in_tag() {
        let result = render("![diagram](images/diagram.png)").unwrap();
        assert!(result
            .markup
            .contains("<ac:image><ri:attachment ri:filename=\"diagram.png\" /></ac:image>"));
        assert_eq!(result.attachments, vec!["images/diagram.png"]);
    }

    #[test]
    fn attachment_order_preserves_duplicates() {
        let result = render("![](a.png)\n\n![](b.png)\n\n![](a.png)").unwrap();
        assert_eq!(result.attachments, vec!["a.png", "b.png", "a.png"]);
    }

    #[test]
    fn alt_text_is_dropped_from_the_tag() {
        let markup = render_body("![A very wordy caption](pic.png)");
        assert!(!markup.contains("wordy caption"));
        assert!(markup.contains("ri:filename=\"pic.png\""));
    }

    #[test]
    fn styled_alt_text_leaves_no_markup_behind() {
        assert_eq!(
            render_body("![*styled* [linked](https://example.com) alt](pic.png)"),
            "<p><ac:image><ri:attachment ri:filename=\"pic.png\" /></ac:image></p>"
        );
    }

    #[test]
    fn scheme_without_host_is_local() {
        let result = render("![](file:///tmp/x.png)").unwrap();
        assert_eq!(result.attachments, vec!["file:///tmp/x.png"]);
    }

    #[test]
    fn table_rendering() {
        let markup = render_body("| A | B |\n| --- | --- |\n| 1 | 2 |");
        assert_eq!(
            markup,
            "<table><thead><tr><th>A</th><th>B</th></tr></thead>\
             <tbody><tr><td>1</td><td>2</td></tr></tbody></table>"
        );
    }

    #[test]
    fn blockquote_rule_and_breaks() {
        assert_eq!(
            render_body("> quoted"),
            "<blockquote><p>quoted</p></blockquote>"
        );
        assert_eq!(render_body("a\n\n---\n\nb"), "<p>a</p><hr /><p>b</p>");
        assert_eq!(render_body("a  \nb"), "<p>a<br />b</p>");
    }

    #[test]
    fn strikethrough() {
        assert_eq!(render_body("~~gone~~"), "<p><s>gone</s></p>");
    }

    #[test]
    fn text_is_xml_escaped() {
        assert_eq!(
            render_body("a < b & c > d"),
            "<p>a &lt; b &amp; c &gt; d</p>"
        );
    }

    #[test]
    fn raw_html_passes_through() {
        assert_eq!(
            render_body("before <sup>1</sup> after"),
            "<p>before <sup>1</sup> after</p>"
        );
    }

    #[test]
    fn control_characters_are_fatal() {
        let err = render("bad \u{0} byte").unwrap_err();
        assert!(matches!(err, MarkonError::Markdown { .. }));
    }

    #[test]
    fn classification_rules() {
        assert!(is_external_source("https://example.com/x.png"));
        assert!(is_external_source("http://host/x.png"));
        assert!(!is_external_source("images/diagram.png"));
        assert!(!is_external_source("../x.png"));
        assert!(!is_external_source("mailto:a@b.c"));
    }

    #[test]
    fn base_name_strips_directories() {
        assert_eq!(base_name("images/nested/diagram.png"), "diagram.png");
        assert_eq!(base_name("plain.png"), "plain.png");
    }
}
