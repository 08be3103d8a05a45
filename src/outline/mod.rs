//! Outline index and image collection.
//!
//! Every non-generated content document is parsed once. Documents whose type
//! is listed in `toc.parse` contribute their headings to the [`Outline`];
//! every non-generated document contributes its image references.

mod document;

use std::collections::BTreeSet;
use std::path::Path;

use tracing::debug;

use crate::book::BookDescriptor;
use crate::error::Result;

pub use document::ContentDocument;

/// A heading found at the top level of a content document's body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingNode {
    /// Source path of the document the heading belongs to.
    pub document: String,
    /// Heading level, 1-6.
    pub level: u8,
    /// The heading's `id`, used as the link fragment.
    pub anchor: Option<String>,
    pub text: String,
}

impl HeadingNode {
    pub fn new(document: impl Into<String>, level: u8, text: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            level,
            anchor: None,
            text: text.into(),
        }
    }

    pub fn with_anchor(mut self, anchor: impl Into<String>) -> Self {
        self.anchor = Some(anchor.into());
        self
    }

    /// Link target: `document#anchor`, or the bare document path.
    pub fn href(&self) -> String {
        match &self.anchor {
            Some(anchor) => format!("{}#{}", self.document, anchor),
            None => self.document.clone(),
        }
    }
}

/// The headings of one document, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentOutline {
    pub source: String,
    pub headings: Vec<HeadingNode>,
}

/// Per-document heading sequences, in descriptor order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outline {
    documents: Vec<DocumentOutline>,
}

impl Outline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, source: impl Into<String>, headings: Vec<HeadingNode>) {
        self.documents.push(DocumentOutline {
            source: source.into(),
            headings,
        });
    }

    pub fn documents(&self) -> &[DocumentOutline] {
        &self.documents
    }

    /// Headings of one document, if it is part of the outline.
    pub fn headings(&self, source: &str) -> Option<&[HeadingNode]> {
        self.documents
            .iter()
            .find(|d| d.source == source)
            .map(|d| d.headings.as_slice())
    }

    pub fn heading_count(&self) -> usize {
        self.documents.iter().map(|d| d.headings.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Result of scanning a book's content documents.
#[derive(Debug, Clone, Default)]
pub struct Scan {
    pub outline: Outline,
    /// Deduplicated image paths, lexically sorted.
    pub images: Vec<String>,
}

/// Parse every non-generated content document of `book` once, building the
/// outline and the image set.
pub fn scan(book: &BookDescriptor, root: &Path) -> Result<Scan> {
    let mut outline = Outline::new();
    let mut images = BTreeSet::new();

    for item in &book.contents {
        let parses = book.toc.parses(item.kind);
        if item.generate {
            if parses {
                debug!(source = %item.source, "generated document has no outline");
            }
            continue;
        }

        let document = ContentDocument::open(root, &item.source)?;
        if parses {
            let headings = document.headings(book.toc.depth, book.toc.line_break_replacement());
            debug!(source = %item.source, headings = headings.len(), "outlined document");
            outline.push(item.source.clone(), headings);
        }
        images.extend(document.image_refs());
    }

    Ok(Scan {
        outline,
        images: images.into_iter().collect(),
    })
}

/// Union image references from several documents into a sorted, deduplicated list.
pub fn collect_images<'a>(documents: impl IntoIterator<Item = &'a ContentDocument>) -> Vec<String> {
    documents
        .into_iter()
        .flat_map(ContentDocument::image_refs)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
