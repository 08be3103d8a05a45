//! A parsed content document and the two scans run over it.

use std::path::Path;

use percent_encoding::percent_decode_str;
use tracing::warn;

use super::HeadingNode;
use crate::dom::{self, Dom, NodeId};
use crate::error::{Error, Result};
use crate::util::{decode_document, is_remote, resolve_path};

/// One content document, parsed once and scanned for headings and images.
pub struct ContentDocument {
    source: String,
    dom: Dom,
}

impl ContentDocument {
    /// Read and parse `source`, relative to the book root.
    pub fn open(root: &Path, source: &str) -> Result<Self> {
        let path = root.join(source);
        let bytes = std::fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::missing_asset(&path),
            _ => Error::document_read(&path, e),
        })?;
        let html = decode_document(&bytes).map_err(|e| Error::document_read(&path, e))?;
        Ok(Self::parse(source, &html))
    }

    /// Parse markup already in memory.
    pub fn parse(source: impl Into<String>, html: &str) -> Self {
        Self {
            source: source.into(),
            dom: dom::parse_html(html),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Headings that are direct children of `body`, up to `max_depth`.
    ///
    /// Headings nested in other elements are not part of the outline.
    /// `<br>` inside a heading becomes `line_break` in the extracted text.
    pub fn headings(&self, max_depth: u8, line_break: &str) -> Vec<HeadingNode> {
        let Some(body) = self.dom.body() else {
            return Vec::new();
        };

        self.dom
            .children(body)
            .filter_map(|id| {
                let level = dom::heading_level(self.dom.element_name(id)?)?;
                if level > max_depth {
                    return None;
                }
                let anchor = self
                    .dom
                    .attr(id, "id")
                    .filter(|a| !a.is_empty())
                    .map(str::to_string);
                Some(HeadingNode {
                    document: self.source.clone(),
                    level,
                    anchor,
                    text: self.heading_text(id, line_break),
                })
            })
            .collect()
    }

    /// Image paths referenced by `img` elements anywhere in the body,
    /// resolved against this document's directory.
    ///
    /// Remote and inline (`data:`) images are skipped.
    pub fn image_refs(&self) -> Vec<String> {
        let Some(body) = self.dom.body() else {
            return Vec::new();
        };

        let mut refs = Vec::new();
        for id in self.dom.descendants(body) {
            if !self.dom.is_tag(id, "img") {
                continue;
            }
            let Some(src) = self.dom.attr(id, "src").filter(|s| !s.is_empty()) else {
                continue;
            };
            if is_remote(src) {
                warn!(document = %self.source, src, "skipping remote image");
                continue;
            }
            let decoded = percent_decode_str(src).decode_utf8_lossy();
            refs.push(resolve_path(&self.source, &decoded));
        }
        refs
    }

    fn heading_text(&self, heading: NodeId, line_break: &str) -> String {
        let mut text = String::new();
        let mut pending_space = false;
        // Whitespace next to a <br> is absorbed by the replacement.
        let mut after_break = false;

        for id in self.dom.descendants(heading) {
            if let Some(chunk) = self.dom.text(id) {
                if chunk.starts_with(char::is_whitespace) {
                    pending_space = true;
                }
                let mut words = chunk.split_whitespace().peekable();
                while let Some(word) = words.next() {
                    if pending_space && !after_break && !text.is_empty() {
                        text.push(' ');
                    }
                    text.push_str(word);
                    after_break = false;
                    pending_space = words.peek().is_some();
                }
                if chunk.ends_with(char::is_whitespace) {
                    pending_space = true;
                }
            } else if self.dom.is_tag(id, "br") {
                text.push_str(line_break);
                pending_space = false;
                after_break = true;
            }
        }

        text.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(body: &str) -> ContentDocument {
        ContentDocument::parse(
            "ch1.html",
            &format!(
                r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml"><head><title>t</title></head>
<body>{body}</body></html>"#
            ),
        )
    }

    fn summary(headings: &[HeadingNode]) -> Vec<(u8, Option<&str>, &str)> {
        headings
            .iter()
            .map(|h| (h.level, h.anchor.as_deref(), h.text.as_str()))
            .collect()
    }

    #[test]
    fn test_top_level_headings_only() {
        let d = doc(r#"
            <h1 id="a">One</h1>
            <p>text</p>
            <div><h2 id="nested">Nested</h2></div>
            <section><h1>Also nested</h1></section>
            <h2>Two</h2>"#);
        let headings = d.headings(6, " ");
        assert_eq!(summary(&headings), [(1, Some("a"), "One"), (2, None, "Two")]);
        assert!(headings.iter().all(|h| h.document == "ch1.html"));
    }

    #[test]
    fn test_self_closed_anchors_keep_headings_top_level() {
        let d = ContentDocument::parse(
            "ch1.html",
            r#"<body><a id="page1"/><h1 id="a">One</h1><p>x</p><h2>Two</h2><div class="pb"/><h1>Three</h1></body>"#,
        );
        let texts: Vec<_> = d.headings(6, " ").into_iter().map(|h| h.text).collect();
        assert_eq!(texts, ["One", "Two", "Three"]);

        let d = doc(r#"<a id="page1"/><h1>One</h1><span class="pagebreak"/><h2>Two</h2>"#);
        let texts: Vec<_> = d.headings(6, " ").into_iter().map(|h| h.text).collect();
        assert_eq!(texts, ["One", "Two"]);
    }

    #[test]
    fn test_depth_filter() {
        let d = doc("<h1>One</h1><h2>Two</h2><h3>Three</h3><h2>Four</h2>");
        let texts: Vec<_> = d.headings(2, " ").into_iter().map(|h| h.text).collect();
        assert_eq!(texts, ["One", "Two", "Four"]);
    }

    #[test]
    fn test_line_break_replacement() {
        let d = doc("<h1>Canto I<br/>A ira de Aquiles</h1><h2>Line <br /> break</h2>");
        let texts: Vec<_> = d.headings(6, " — ").into_iter().map(|h| h.text).collect();
        assert_eq!(texts, ["Canto I — A ira de Aquiles", "Line — break"]);

        let texts: Vec<_> = d.headings(6, " ").into_iter().map(|h| h.text).collect();
        assert_eq!(texts, ["Canto I A ira de Aquiles", "Line break"]);
    }

    #[test]
    fn test_heading_text_whitespace_and_inline_markup() {
        let d = doc("<h1>\n   The <em>Long</em>\n  Title  </h1><h2 id=\"\">Empty id</h2>");
        let headings = d.headings(6, " ");
        assert_eq!(headings[0].text, "The Long Title");
        assert_eq!(headings[1].anchor, None);
    }

    #[test]
    fn test_entities_decoded() {
        let d = doc("<h1>Tom &amp; Jerry</h1>");
        assert_eq!(d.headings(1, " ")[0].text, "Tom & Jerry");
    }

    #[test]
    fn test_image_refs() {
        let d = ContentDocument::parse(
            "text/ch1.html",
            r#"<html><body>
                <p><img src="../images/a.png"/></p>
                <div><figure><img src="b%20c.jpg"/></figure></div>
                <img alt="no src"/>
                <img src="http://example.com/x.png"/>
                <img src="data:image/png;base64,AAAA"/>
            </body></html>"#,
        );
        assert_eq!(d.image_refs(), ["images/a.png", "text/b c.jpg"]);
    }

    #[test]
    fn test_open_missing_and_malformed() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = ContentDocument::open(dir.path(), "absent.html").err().unwrap();
        assert!(matches!(err, Error::MissingAsset { .. }));

        std::fs::write(dir.path().join("bad.html"), [b'<', b'p', b'>', 0xFF, 0xFE]).unwrap();
        let err = ContentDocument::open(dir.path(), "bad.html").err().unwrap();
        assert!(matches!(err, Error::DocumentRead { .. }));
    }
}
