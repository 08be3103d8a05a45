//! Generated XHTML pages: cover, title page and table of contents.

use crate::book::BookDescriptor;
use crate::epub::package::STYLESHEET_HREF;
use crate::outline::Outline;
use crate::toc::render_linear_toc;
use crate::util::{encode_path, escape_xml, relative_href};

/// Stylesheet written when the descriptor does not name one.
pub const DEFAULT_STYLESHEET: &str = r#"body {
  margin: 0 5%;
  font-family: serif;
  line-height: 1.4;
}

h1, h2, h3, h4, h5, h6 {
  font-weight: normal;
  text-align: center;
}

p {
  margin: 0;
  text-indent: 1.5em;
}

a {
  text-decoration: none;
}

div.cover {
  text-align: center;
  height: 100%;
}

div.cover img {
  max-width: 100%;
  max-height: 100%;
}

div.title-page {
  margin-top: 30%;
  text-align: center;
}

div.title-page p {
  text-indent: 0;
}

p.author {
  margin-top: 2em;
  font-size: 1.2em;
}

div.toc p {
  text-indent: 0;
}
"#;

/// Wrap `body` in an XHTML 1.1 document that links the shared stylesheet.
fn page(path: &str, title: &str, body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.1//EN" "http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd">
<html xmlns="http://www.w3.org/1999/xhtml">
<head>
<title>{}</title>
<link rel="stylesheet" type="text/css" href="{}"/>
</head>
<body>
{}</body>
</html>
"#,
        escape_xml(title),
        escape_xml(&encode_path(&relative_href(path, STYLESHEET_HREF))),
        body
    )
}

/// Cover page at `path`, showing the cover image.
pub fn cover_page(book: &BookDescriptor, path: &str, cover: &str) -> String {
    let body = format!(
        "<div class=\"cover\">\n<img src=\"{}\" alt=\"{}\"/>\n</div>\n",
        escape_xml(&encode_path(&relative_href(path, cover))),
        escape_xml(&book.title)
    );
    page(path, &book.title, &body)
}

pub fn title_page(book: &BookDescriptor, path: &str) -> String {
    let mut body = format!(
        "<div class=\"title-page\">\n<h1>{}</h1>\n",
        escape_xml(&book.title)
    );
    if let Some(author) = book.first_author() {
        body.push_str(&format!(
            "<p class=\"author\">{}</p>\n",
            escape_xml(&author.name)
        ));
    }
    body.push_str("</div>\n");
    page(path, &book.title, &body)
}

/// Table-of-contents page at `path`, listing every outlined heading.
pub fn toc_page(book: &BookDescriptor, path: &str, outline: &Outline) -> String {
    let title = book.toc.page_title();
    let body = format!(
        "<h1>{}</h1>\n<div class=\"toc\">\n{}</div>\n",
        escape_xml(title),
        render_linear_toc(outline, path)
    );
    page(path, title, &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::{Author, Identifier, TocConfig, TocPageOptions};
    use crate::outline::HeadingNode;

    fn book() -> BookDescriptor {
        BookDescriptor::new("Dom <Casmurro>", Identifier::new("uuid", "1"))
            .with_author(Author::new("Machado de Assis"))
    }

    fn assert_well_formed(xml: &str) {
        let mut reader = quick_xml::Reader::from_str(xml);
        loop {
            match reader.read_event() {
                Ok(quick_xml::events::Event::Eof) => break,
                Ok(_) => {}
                Err(e) => panic!("malformed XML at {}: {e}", reader.buffer_position()),
            }
        }
    }

    #[test]
    fn test_cover_page() {
        let html = cover_page(&book(), "cover.html", "images/cover.jpg");
        assert!(html.contains("<img src=\"images/cover.jpg\" alt=\"Dom &lt;Casmurro&gt;\"/>"));
        assert!(html.contains("href=\"style.css\""));
        assert_well_formed(&html);
    }

    #[test]
    fn test_nested_page_paths() {
        let html = cover_page(&book(), "front/cover.html", "images/cover.jpg");
        assert!(html.contains("src=\"../images/cover.jpg\""));
        assert!(html.contains("href=\"../style.css\""));
    }

    #[test]
    fn test_title_page() {
        let html = title_page(&book(), "title.html");
        assert!(html.contains("<h1>Dom &lt;Casmurro&gt;</h1>"));
        assert!(html.contains("<p class=\"author\">Machado de Assis</p>"));
        assert_well_formed(&html);
    }

    #[test]
    fn test_toc_page() {
        let book = book().with_toc(
            TocConfig::new(2).with_page(TocPageOptions::new("Índice")),
        );
        let mut outline = Outline::new();
        outline.push("ch1.html", vec![
            HeadingNode::new("ch1.html", 1, "Capítulo I").with_anchor("c1"),
        ]);

        let html = toc_page(&book, "toc.html", &outline);
        assert!(html.contains("<title>Índice</title>"));
        assert!(html.contains("<h1>Índice</h1>"));
        assert!(html.contains(
            "<p style=\"text-indent: 1em;\"><a href=\"ch1.html#c1\">Capítulo I</a></p>"
        ));
        assert_well_formed(&html);
    }

    #[test]
    fn test_toc_page_default_title() {
        let html = toc_page(&book(), "toc.html", &Outline::new());
        assert!(html.contains("<h1>Contents</h1>"));
        assert_well_formed(&html);
    }
}
