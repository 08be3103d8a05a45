//! Book descriptor: the declarative input of a generation run.
//!
//! A [`BookDescriptor`] names the book's metadata, the ordered content
//! documents that make up the spine, and how the table of contents is built.
//! It is usually loaded from JSON with [`load_descriptor`], but can also be
//! assembled in memory:
//!
//! ```
//! use bindery::{Author, BookDescriptor, ContentItem, ContentType, Identifier};
//!
//! let book = BookDescriptor::new("Agnes Grey", Identifier::new("isbn", "978-0-00-000000-0"))
//!     .with_author(Author::new("Anne Brontë").with_sort("Brontë, Anne"))
//!     .with_content(ContentItem::generated(ContentType::TitlePage, "title.html"))
//!     .with_content(ContentItem::text("chapter1.html"));
//!
//! assert_eq!(book.contents.len(), 2);
//! ```

mod load;

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::util::escapes_root;

pub(crate) use load::book_root;
pub use load::{load_descriptor, parse_descriptor};

/// Source path of the cover page inserted when a cover image is set but no
/// cover item is declared.
pub const DEFAULT_COVER_PAGE: &str = "cover.html";

/// Fully resolved description of one book.
#[derive(Debug, Clone, PartialEq)]
pub struct BookDescriptor {
    pub title: String,
    pub authors: Vec<Author>,
    pub identifier: Identifier,
    pub language: String,
    pub publisher: String,
    pub rights: String,
    /// Cover image, relative to the book root.
    pub cover: Option<String>,
    /// Stylesheet copied to `style.css`; a built-in one is used when absent.
    pub stylesheet: Option<String>,
    /// Content documents in spine order.
    pub contents: Vec<ContentItem>,
    pub toc: TocConfig,
    pub guide: Vec<GuideReference>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Author {
    pub name: String,
    /// Sort key, emitted as `opf:file-as` for the first author.
    #[serde(default)]
    pub sort: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Identifier {
    pub scheme: String,
    pub value: String,
}

/// Kind of a content document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentType {
    Text,
    Cover,
    Toc,
    TitlePage,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Text => "text",
            ContentType::Cover => "cover",
            ContentType::Toc => "toc",
            ContentType::TitlePage => "title-page",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the spine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentItem {
    pub kind: ContentType,
    /// Document path relative to the book root; also its path inside the archive.
    pub source: String,
    /// Synthesize the document instead of copying it from disk.
    pub generate: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TocConfig {
    /// Deepest heading level included in the outline (1-6).
    pub depth: u8,
    /// Content types whose documents are scanned for headings.
    #[serde(default)]
    pub parse: Vec<ContentType>,
    #[serde(default)]
    pub generate: Option<TocPageOptions>,
}

/// Options for the generated table-of-contents page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TocPageOptions {
    #[serde(default = "default_toc_title")]
    pub title: String,
    /// Text substituted for `<br>` inside headings.
    #[serde(rename = "replaceLineBreakWith", default)]
    pub replace_line_break_with: Option<String>,
}

fn default_toc_title() -> String {
    "Contents".to_string()
}

/// A semantic landmark in the package guide.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GuideReference {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub href: String,
}

impl BookDescriptor {
    pub fn new(title: impl Into<String>, identifier: Identifier) -> Self {
        Self {
            title: title.into(),
            authors: Vec::new(),
            identifier,
            language: "en".to_string(),
            publisher: String::new(),
            rights: String::new(),
            cover: None,
            stylesheet: None,
            contents: Vec::new(),
            toc: TocConfig::default(),
            guide: Vec::new(),
        }
    }

    pub fn with_author(mut self, author: Author) -> Self {
        self.authors.push(author);
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_publisher(mut self, publisher: impl Into<String>) -> Self {
        self.publisher = publisher.into();
        self
    }

    pub fn with_rights(mut self, rights: impl Into<String>) -> Self {
        self.rights = rights.into();
        self
    }

    pub fn with_cover(mut self, cover: impl Into<String>) -> Self {
        self.cover = Some(cover.into());
        self
    }

    pub fn with_stylesheet(mut self, stylesheet: impl Into<String>) -> Self {
        self.stylesheet = Some(stylesheet.into());
        self
    }

    pub fn with_content(mut self, item: ContentItem) -> Self {
        self.contents.push(item);
        self
    }

    pub fn with_toc(mut self, toc: TocConfig) -> Self {
        self.toc = toc;
        self
    }

    pub fn with_guide(mut self, reference: GuideReference) -> Self {
        self.guide.push(reference);
        self
    }

    pub fn first_author(&self) -> Option<&Author> {
        self.authors.first()
    }

    /// Insert a generated cover page at the front of the spine when a cover
    /// image is set and no cover item is declared.
    ///
    /// Returns `true` if an item was inserted.
    pub fn ensure_cover_page(&mut self) -> bool {
        if self.cover.is_none() || self.contents.iter().any(|i| i.kind == ContentType::Cover) {
            return false;
        }
        self.contents
            .insert(0, ContentItem::generated(ContentType::Cover, DEFAULT_COVER_PAGE));
        true
    }

    /// Check the invariants the generator relies on.
    ///
    /// `origin` is only used to label the error.
    pub fn validate(&self, origin: &Path) -> Result<()> {
        if !(1..=6).contains(&self.toc.depth) {
            return Err(Error::config(
                origin,
                format!("toc depth must be between 1 and 6, got {}", self.toc.depth),
            ));
        }
        if self.contents.is_empty() {
            return Err(Error::config(origin, "no content items"));
        }
        let sources = self.contents.iter().map(|i| &i.source);
        if let Some(outside) = sources
            .chain(&self.cover)
            .chain(&self.stylesheet)
            .find(|s| escapes_root(s))
        {
            return Err(Error::config(
                origin,
                format!("{outside} points outside the book directory"),
            ));
        }
        let mut seen = HashSet::new();
        for item in &self.contents {
            if item.source.is_empty() {
                return Err(Error::config(origin, format!("{} item without a source", item.kind)));
            }
            if !seen.insert(item.source.as_str()) {
                return Err(Error::config(
                    origin,
                    format!("{} is listed more than once", item.source),
                ));
            }
            if !item.generate {
                continue;
            }
            match item.kind {
                ContentType::Text => {
                    return Err(Error::config(
                        origin,
                        format!("text item {} cannot be generated", item.source),
                    ));
                }
                ContentType::Cover if self.cover.is_none() => {
                    return Err(Error::config(
                        origin,
                        format!("cover page {} is generated but no cover image is set", item.source),
                    ));
                }
                ContentType::TitlePage if self.authors.is_empty() => {
                    return Err(Error::config(
                        origin,
                        format!("title page {} is generated but no author is set", item.source),
                    ));
                }
                _ => {}
            }
        }
        for reference in &self.guide {
            if reference.kind.is_empty() || reference.title.is_empty() || reference.href.is_empty() {
                return Err(Error::config(
                    origin,
                    "guide references need a type, a title and an href",
                ));
            }
        }
        Ok(())
    }
}

impl Author {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sort: None,
        }
    }

    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }
}

impl Identifier {
    pub fn new(scheme: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            value: value.into(),
        }
    }
}

impl ContentItem {
    pub fn new(kind: ContentType, source: impl Into<String>, generate: bool) -> Self {
        Self {
            kind,
            source: source.into(),
            generate,
        }
    }

    /// A `text` document copied from disk.
    pub fn text(source: impl Into<String>) -> Self {
        Self::new(ContentType::Text, source, false)
    }

    /// A document synthesized during the run.
    pub fn generated(kind: ContentType, source: impl Into<String>) -> Self {
        Self::new(kind, source, true)
    }
}

impl Default for TocConfig {
    fn default() -> Self {
        Self {
            depth: 2,
            parse: vec![ContentType::Text],
            generate: None,
        }
    }
}

impl TocConfig {
    pub fn new(depth: u8) -> Self {
        Self {
            depth,
            ..Default::default()
        }
    }

    pub fn with_parse(mut self, parse: Vec<ContentType>) -> Self {
        self.parse = parse;
        self
    }

    pub fn with_page(mut self, options: TocPageOptions) -> Self {
        self.generate = Some(options);
        self
    }

    /// Whether documents of this type contribute to the outline.
    pub fn parses(&self, kind: ContentType) -> bool {
        self.parse.contains(&kind)
    }

    /// Text substituted for line breaks inside headings.
    pub fn line_break_replacement(&self) -> &str {
        self.generate
            .as_ref()
            .and_then(|g| g.replace_line_break_with.as_deref())
            .unwrap_or(" ")
    }

    /// Title of the generated TOC page.
    pub fn page_title(&self) -> &str {
        self.generate.as_ref().map_or("Contents", |g| g.title.as_str())
    }
}

impl TocPageOptions {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            replace_line_break_with: None,
        }
    }

    pub fn with_line_break(mut self, replacement: impl Into<String>) -> Self {
        self.replace_line_break_with = Some(replacement.into());
        self
    }
}

impl GuideReference {
    pub fn new(kind: impl Into<String>, title: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            title: title.into(),
            href: href.into(),
        }
    }
}
