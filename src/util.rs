//! Shared helpers: text decoding, XML escaping, archive path handling.

use std::borrow::Cow;
use std::path::{Component, Path};

use encoding_rs::{Encoding, UTF_8};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

/// Bytes escaped inside one segment of an href path.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'/');

const FRAGMENT: &AsciiSet = &CONTROLS.add(b' ').add(b'"').add(b'<').add(b'>').add(b'`');

/// Decode a document's bytes to a string.
///
/// The encoding comes from a byte-order mark, then the XML declaration, then
/// defaults to UTF-8. Unlike a browser this does not guess: bytes that are not
/// valid in the chosen encoding are an error.
pub fn decode_document(bytes: &[u8]) -> Result<String, String> {
    let (encoding, bom_len) = match Encoding::for_bom(bytes) {
        Some((encoding, len)) => (encoding, len),
        None => {
            let declared = extract_xml_encoding(bytes)
                .and_then(|label| Encoding::for_label(label.as_bytes()));
            (declared.unwrap_or(UTF_8), 0)
        }
    };

    encoding
        .decode_without_bom_handling_and_without_replacement(&bytes[bom_len..])
        .map(Cow::into_owned)
        .ok_or_else(|| format!("malformed {} text", encoding.name()))
}

/// Extract the encoding label from an XML declaration, if any.
pub fn extract_xml_encoding(bytes: &[u8]) -> Option<&str> {
    // Only check the first 100 bytes for the XML declaration
    let prefix = &bytes[..bytes.len().min(100)];

    let xml_start = prefix.windows(5).position(|w| w == b"<?xml")?;
    let after_xml = &prefix[xml_start..];

    let enc_pos = after_xml
        .windows(9)
        .position(|w| w.eq_ignore_ascii_case(b"encoding="))?;
    let after_enc = &after_xml[enc_pos + 9..];

    let quote = *after_enc.first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }

    let value_end = after_enc[1..].iter().position(|&b| b == quote)? + 1;
    std::str::from_utf8(&after_enc[1..value_end]).ok()
}

/// Escape XML special characters in text and attribute values.
pub fn escape_xml(s: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(s)
}

/// Whether a reference points outside the book (URL or inline data).
pub fn is_remote(reference: &str) -> bool {
    reference.contains("://") || reference.starts_with("data:")
}

/// Resolve `rel` against the directory of `base`, both relative to the book
/// root, without touching the filesystem.
///
/// `..` never climbs above the book root.
pub fn resolve_path(base: &str, rel: &str) -> String {
    let rel_path = Path::new(rel);

    if rel_path.has_root() {
        return sanitize_path(rel);
    }

    let mut stack: Vec<&str> = Path::new(base)
        .parent()
        .unwrap_or(Path::new(""))
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect();

    for component in rel_path.components() {
        match component {
            Component::ParentDir => {
                stack.pop();
            }
            Component::Normal(c) => {
                if let Some(s) = c.to_str() {
                    stack.push(s);
                }
            }
            _ => {}
        }
    }

    stack.join("/")
}

/// Express `target` relative to the directory of `from`; both are relative to
/// the book root. A fragment on `target` is kept.
pub fn relative_href(from: &str, target: &str) -> String {
    let from_dirs: Vec<&str> = from.split('/').collect();
    let from_dirs = &from_dirs[..from_dirs.len() - 1];
    let target_parts: Vec<&str> = target.split('/').collect();

    let common = from_dirs
        .iter()
        .zip(&target_parts)
        .take_while(|(a, b)| a == b)
        .count()
        .min(target_parts.len() - 1);

    let mut parts: Vec<&str> = vec![".."; from_dirs.len() - common];
    parts.extend(&target_parts[common..]);
    parts.join("/")
}

/// Percent-encode a book-relative file path for an `href` or `src` attribute.
///
/// Archive entry names stay decoded; only the references are encoded.
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| utf8_percent_encode(segment, PATH_SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Like [`encode_path`], but keeps a `#fragment` and encodes it separately.
pub fn encode_href(href: &str) -> String {
    let Some((path, fragment)) = href.split_once('#') else {
        return encode_path(href);
    };
    let mut encoded = encode_path(path);
    encoded.push('#');
    encoded.extend(utf8_percent_encode(fragment, FRAGMENT));
    encoded
}

/// Whether a book-relative path tries to climb out of the book root.
pub fn escapes_root(path: &str) -> bool {
    path.split(['/', '\\']).any(|part| part == "..")
}

/// Normalize a path for use inside the zip archive.
pub fn sanitize_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    path.split('/')
        .filter(|part| !part.is_empty() && *part != ".")
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf8() {
        assert_eq!(decode_document("Ilíada".as_bytes()).unwrap(), "Ilíada");
    }

    #[test]
    fn test_decode_strips_bom() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"<html/>");
        assert_eq!(decode_document(&bytes).unwrap(), "<html/>");
    }

    #[test]
    fn test_decode_declared_encoding() {
        let mut bytes = b"<?xml version=\"1.0\" encoding=\"windows-1252\"?><p>caf".to_vec();
        bytes.push(0xE9);
        bytes.extend_from_slice(b"</p>");
        let text = decode_document(&bytes).unwrap();
        assert!(text.ends_with("<p>café</p>"));
    }

    #[test]
    fn test_decode_rejects_malformed_utf8() {
        let err = decode_document(&[b'a', 0xFF, 0xFE, b'b']).unwrap_err();
        assert!(err.contains("UTF-8"));
    }

    #[test]
    fn test_extract_xml_encoding() {
        assert_eq!(
            extract_xml_encoding(b"<?xml version='1.0' encoding='ISO-8859-1'?>"),
            Some("ISO-8859-1")
        );
        assert_eq!(extract_xml_encoding(b"<?xml version=\"1.0\"?>"), None);
        assert_eq!(extract_xml_encoding(b"<html>"), None);
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("Hello & World"), "Hello &amp; World");
        assert_eq!(escape_xml("<tag>"), "&lt;tag&gt;");
        assert_eq!(escape_xml("\"quoted\""), "&quot;quoted&quot;");
        assert!(matches!(escape_xml("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_resolve_path() {
        assert_eq!(resolve_path("text/ch1.html", "../images/logo.png"), "images/logo.png");
        assert_eq!(resolve_path("ch1.html", "images/photo.jpg"), "images/photo.jpg");
        assert_eq!(resolve_path("ch1.html", "./fig.png"), "fig.png");
        assert_eq!(resolve_path("ch1.html", "/images/absolute.png"), "images/absolute.png");
        assert_eq!(resolve_path("ch1.html", "../../escape.png"), "escape.png");
    }

    #[test]
    fn test_relative_href() {
        assert_eq!(relative_href("toc.html", "ch1.html#a"), "ch1.html#a");
        assert_eq!(relative_href("front/cover.html", "style.css"), "../style.css");
        assert_eq!(relative_href("front/cover.html", "front/img/c.jpg"), "img/c.jpg");
        assert_eq!(relative_href("a/b/toc.html", "a/c/ch.html"), "../c/ch.html");
    }

    #[test]
    fn test_sanitize_path() {
        assert_eq!(sanitize_path("/path/to/file.xhtml"), "path/to/file.xhtml");
        assert_eq!(sanitize_path("path\\to\\file.xhtml"), "path/to/file.xhtml");
        assert_eq!(sanitize_path("./a//b.png"), "a/b.png");
    }

    #[test]
    fn test_encode_path() {
        assert_eq!(encode_path("images/my fig.png"), "images/my%20fig.png");
        assert_eq!(encode_path("text/ch1.html"), "text/ch1.html");
        assert_eq!(encode_path("100%.png"), "100%25.png");
        assert_eq!(encode_path("a#b?.png"), "a%23b%3F.png");
        assert_eq!(encode_path("capítulo.html"), "cap%C3%ADtulo.html");
    }

    #[test]
    fn test_encode_href() {
        assert_eq!(encode_href("my text/ch 1.html#sec 2"), "my%20text/ch%201.html#sec%202");
        assert_eq!(encode_href("../style.css"), "../style.css");
        assert_eq!(encode_href("ch1.html#c1"), "ch1.html#c1");
    }

    #[test]
    fn test_escapes_root() {
        assert!(escapes_root("../x.html"));
        assert!(escapes_root("text/../../x.html"));
        assert!(escapes_root("text\\..\\x.html"));
        assert!(!escapes_root("text/..x.html"));
        assert!(!escapes_root("text/ch1.html"));
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("http://example.com/a.png"));
        assert!(is_remote("data:image/png;base64,AAAA"));
        assert!(!is_remote("images/a.png"));
    }
}
