//! JSON descriptor loading and resolution.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use super::{Author, BookDescriptor, ContentItem, ContentType, GuideReference, Identifier, TocConfig};
use crate::error::{Error, Result};

#[derive(Deserialize)]
struct RawDescriptor {
    title: String,
    #[serde(default)]
    authors: Vec<Author>,
    identifier: Identifier,
    language: String,
    #[serde(default)]
    publisher: String,
    #[serde(default)]
    rights: String,
    #[serde(default)]
    cover: Option<String>,
    #[serde(default)]
    stylesheet: Option<String>,
    contents: Vec<RawContentItem>,
    toc: TocConfig,
    #[serde(default)]
    guide: Vec<GuideReference>,
}

#[derive(Deserialize)]
struct RawContentItem {
    #[serde(rename = "type")]
    kind: ContentType,
    source: String,
    #[serde(default)]
    generate: Option<bool>,
}

/// Load a descriptor from a JSON file.
///
/// Content sources are resolved against the file's directory.
pub fn load_descriptor(path: impl AsRef<Path>) -> Result<BookDescriptor> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|e| Error::config(path, e.to_string()))?;
    let root = book_root(path);
    resolve(&json, &root, path)
}

/// Parse a descriptor from a JSON string, resolving wildcards against `root`.
pub fn parse_descriptor(json: &str, root: impl AsRef<Path>) -> Result<BookDescriptor> {
    let root = root.as_ref();
    resolve(json, root, root)
}

/// Directory holding the descriptor, which all sources are relative to.
pub(crate) fn book_root(descriptor_path: &Path) -> PathBuf {
    match descriptor_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn resolve(json: &str, root: &Path, origin: &Path) -> Result<BookDescriptor> {
    let raw: RawDescriptor =
        serde_json::from_str(json).map_err(|e| Error::config(origin, e.to_string()))?;

    let toc_page_configured = raw.toc.generate.is_some();
    let mut contents = Vec::with_capacity(raw.contents.len());
    for item in raw.contents {
        let generate = item
            .generate
            .unwrap_or(item.kind == ContentType::Toc && toc_page_configured);

        if item.kind == ContentType::Text && item.source.contains('*') {
            let matches = expand_wildcard(root, &item.source, origin)?;
            debug!(pattern = %item.source, count = matches.len(), "expanded wildcard");
            contents.extend(matches.into_iter().map(ContentItem::text));
            continue;
        }

        contents.push(ContentItem::new(item.kind, item.source, generate));
    }

    let mut descriptor = BookDescriptor {
        title: raw.title,
        authors: raw.authors,
        identifier: raw.identifier,
        language: raw.language,
        publisher: raw.publisher,
        rights: raw.rights,
        cover: raw.cover,
        stylesheet: raw.stylesheet,
        contents,
        toc: raw.toc,
        guide: raw.guide,
    };
    descriptor.ensure_cover_page();
    descriptor.validate(origin)?;
    Ok(descriptor)
}

/// Expand a wildcard source into sorted paths relative to `root`.
fn expand_wildcard(root: &Path, pattern: &str, origin: &Path) -> Result<Vec<String>> {
    // Only the source is a pattern; the root is matched literally.
    let full = format!("{}/{pattern}", glob::Pattern::escape(&root.to_string_lossy()));
    let entries = glob::glob(&full)
        .map_err(|e| Error::config(origin, format!("bad wildcard {pattern:?}: {e}")))?;

    let mut matches = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| Error::config(origin, e.to_string()))?;
        if !path.is_file() {
            continue;
        }
        let relative = path.strip_prefix(root).unwrap_or(&path);
        matches.push(to_slash(relative));
    }

    if matches.is_empty() {
        return Err(Error::config(
            origin,
            format!("can't find files from expression: {pattern:?}"),
        ));
    }
    matches.sort();
    Ok(matches)
}

fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MINIMAL: &str = r#"{
        "title": "Ilíada",
        "authors": [{"name": "Homero", "sort": "Homero"}],
        "identifier": {"scheme": "isbn", "value": "123"},
        "language": "pt",
        "publisher": "Pub",
        "rights": "Public domain",
        "contents": [
            {"type": "title-page", "source": "title.html", "generate": true},
            {"type": "toc", "source": "toc.html"},
            {"type": "text", "source": "ch1.html"}
        ],
        "toc": {"depth": 2, "parse": ["text"], "generate": {"title": "Índice"}}
    }"#;

    #[test]
    fn test_parse_minimal() {
        let book = parse_descriptor(MINIMAL, ".").unwrap();
        assert_eq!(book.title, "Ilíada");
        assert_eq!(book.authors[0].sort.as_deref(), Some("Homero"));
        assert_eq!(book.contents.len(), 3);
        assert!(book.contents[0].generate);
        // toc items default to generated when toc.generate is present
        assert!(book.contents[1].generate);
        assert!(!book.contents[2].generate);
        assert_eq!(book.toc.page_title(), "Índice");
        assert!(book.guide.is_empty());
    }

    #[test]
    fn test_toc_not_generated_without_options() {
        let json = MINIMAL.replace(r#", "generate": {"title": "Índice"}"#, "");
        let book = parse_descriptor(&json, ".").unwrap();
        assert!(!book.contents[1].generate);
    }

    #[test]
    fn test_cover_page_inserted() {
        let json = MINIMAL.replace(r#""rights""#, r#""cover": "capa.jpg", "rights""#);
        let book = parse_descriptor(&json, ".").unwrap();
        assert_eq!(book.contents[0].kind, ContentType::Cover);
        assert_eq!(book.contents[0].source, "cover.html");
        assert!(book.contents[0].generate);
        assert_eq!(book.contents.len(), 4);
    }

    #[test]
    fn test_wildcard_expansion() {
        let dir = TempDir::new().unwrap();
        for name in ["rapsodia-ii.html", "rapsodia-i.html", "notes.txt"] {
            std::fs::write(dir.path().join(name), "<html></html>").unwrap();
        }
        let json = MINIMAL.replace("ch1.html", "rapsodia-*.html");
        let book = parse_descriptor(&json, dir.path()).unwrap();

        let sources: Vec<_> = book.contents.iter().map(|i| i.source.as_str()).collect();
        assert_eq!(
            sources,
            ["title.html", "toc.html", "rapsodia-i.html", "rapsodia-ii.html"]
        );
        assert!(!book.contents[2].generate);
    }

    #[test]
    fn test_wildcard_under_bracketed_directory() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("Books [2024]");
        std::fs::create_dir(&root).unwrap();
        std::fs::write(root.join("ch1.html"), "<html></html>").unwrap();

        let json = MINIMAL.replace("ch1.html", "ch*.html");
        let book = parse_descriptor(&json, &root).unwrap();
        assert_eq!(book.contents[2].source, "ch1.html");
    }

    #[test]
    fn test_wildcard_without_matches() {
        let dir = TempDir::new().unwrap();
        let json = MINIMAL.replace("ch1.html", "missing-*.html");
        let err = parse_descriptor(&json, dir.path()).unwrap_err();
        match err {
            Error::Config { message, .. } => assert!(message.contains("missing-*.html")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_json() {
        let err = parse_descriptor("{ not json", ".").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("book.json");
        std::fs::write(&path, MINIMAL).unwrap();
        let book = load_descriptor(&path).unwrap();
        assert_eq!(book.language, "pt");

        let err = load_descriptor(dir.path().join("absent.json")).unwrap_err();
        assert!(err.to_string().contains("absent.json"));
    }

    #[test]
    fn test_book_root() {
        assert_eq!(book_root(Path::new("book.json")), PathBuf::from("."));
        assert_eq!(book_root(Path::new("a/b/book.json")), PathBuf::from("a/b"));
    }
}
