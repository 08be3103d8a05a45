//! Flat, indented table of contents for the generated TOC page.
//!
//! Unlike the navigation map there is no nesting here: every heading becomes
//! one paragraph, indented by its level, and each document gets its own block.

use crate::outline::Outline;
use crate::util::{encode_href, escape_xml, relative_href};

/// Render the listing as an XHTML fragment for a page at `from`.
///
/// Links are written relative to `from`, which is the TOC page's own path.
pub fn render_linear_toc(outline: &Outline, from: &str) -> String {
    let mut html = String::new();

    for document in outline.documents() {
        html.push_str("<div style=\"margin-top: 1em;\">\n");
        for heading in &document.headings {
            html.push_str(&format!(
                "<p style=\"text-indent: {}em;\"><a href=\"{}\">{}</a></p>\n",
                heading.level,
                escape_xml(&encode_href(&relative_href(from, &heading.href()))),
                escape_xml(&heading.text)
            ));
        }
        html.push_str("</div>\n");
    }

    html
}
