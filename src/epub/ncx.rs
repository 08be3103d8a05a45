//! Navigation control document (NCX 2005-1).

use crate::book::BookDescriptor;
use crate::toc::{NavMap, NavPoint};
use crate::util::{encode_href, escape_xml};

/// Render the NCX for `nav`.
///
/// An EPUB 2 navMap must hold at least one navPoint, so an empty map is
/// replaced by a single point labelled with the book title that targets
/// `fallback_href`.
pub fn render_ncx(book: &BookDescriptor, nav: &NavMap, fallback_href: &str) -> String {
    let mut ncx = String::new();

    ncx.push_str(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE ncx PUBLIC "-//NISO//DTD ncx 2005-1//EN" "http://www.daisy.org/z3986/2005/ncx-2005-1.dtd">
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head>
"#,
    );
    ncx.push_str(&format!(
        "    <meta name=\"dtb:uid\" content=\"{}\"/>\n",
        escape_xml(&book.identifier.value)
    ));
    ncx.push_str(&format!(
        "    <meta name=\"dtb:depth\" content=\"{}\"/>\n",
        nav.depth().max(1)
    ));
    ncx.push_str(
        r#"    <meta name="dtb:totalPageCount" content="0"/>
    <meta name="dtb:maxPageNumber" content="0"/>
  </head>
"#,
    );

    ncx.push_str(&format!(
        "  <docTitle>\n    <text>{}</text>\n  </docTitle>\n",
        escape_xml(&book.title)
    ));
    if let Some(author) = book.first_author() {
        ncx.push_str(&format!(
            "  <docAuthor>\n    <text>{}</text>\n  </docAuthor>\n",
            escape_xml(&author.name)
        ));
    }

    ncx.push_str("  <navMap>\n");
    if nav.is_empty() {
        let fallback = NavPoint {
            id: "nav1".to_string(),
            play_order: 1,
            level: 1,
            label: book.title.clone(),
            href: fallback_href.to_string(),
            children: Vec::new(),
        };
        write_nav_point(&mut ncx, &fallback, 2);
    } else {
        for point in nav.points() {
            write_nav_point(&mut ncx, point, 2);
        }
    }
    ncx.push_str("  </navMap>\n</ncx>\n");

    ncx
}

fn write_nav_point(ncx: &mut String, point: &NavPoint, indent: usize) {
    let indent_str = "  ".repeat(indent);

    ncx.push_str(&format!(
        "{}<navPoint id=\"{}\" playOrder=\"{}\">\n",
        indent_str,
        escape_xml(&point.id),
        point.play_order
    ));
    ncx.push_str(&format!(
        "{}  <navLabel>\n{}    <text>{}</text>\n{}  </navLabel>\n",
        indent_str,
        indent_str,
        escape_xml(&point.label),
        indent_str
    ));
    ncx.push_str(&format!(
        "{}  <content src=\"{}\"/>\n",
        indent_str,
        escape_xml(&encode_href(&point.href))
    ));

    for child in &point.children {
        write_nav_point(ncx, child, indent + 1);
    }

    ncx.push_str(&format!("{}</navPoint>\n", indent_str));
}
