//! # bindery
//!
//! Build EPUB 2 archives from a declarative book descriptor and a set of
//! pre-rendered XHTML documents.
//!
//! ## Pipeline
//!
//! - Every non-generated content document is parsed once. Headings that are
//!   direct children of `body` form the [`Outline`]; `img` references from
//!   all documents form the image set.
//! - The outline feeds two tables of contents: the nested [`NavMap`] written
//!   to `toc.ncx`, and a flat indented listing used by the generated TOC page.
//! - The package document lists every content item, image, the cover, the
//!   stylesheet and the NCX; the spine follows descriptor order.
//! - The archive is written with `mimetype` first and stored, to a temporary
//!   file that is renamed into place only once complete.
//!
//! ## Quick Start
//!
//! ```no_run
//! use bindery::Generator;
//!
//! let generator = Generator::open("iliada/iliada.json")?;
//! generator.write(None)?;
//! # Ok::<(), bindery::Error>(())
//! ```
//!
//! ## In-memory descriptors
//!
//! ```no_run
//! use std::path::Path;
//!
//! use bindery::{Author, BookDescriptor, ContentItem, ContentType, Generator, Identifier};
//!
//! let book = BookDescriptor::new("Agnes Grey", Identifier::new("uuid", "urn:uuid:1234"))
//!     .with_author(Author::new("Anne Brontë"))
//!     .with_cover("images/cover.jpg")
//!     .with_content(ContentItem::generated(ContentType::TitlePage, "title.html"))
//!     .with_content(ContentItem::text("chapter1.html"));
//!
//! // The cover page is inserted ahead of the title page.
//! let generator = Generator::new(book, "agnes-grey")?;
//! generator.write(Some(Path::new("agnes-grey.epub")))?;
//! # Ok::<(), bindery::Error>(())
//! ```

pub mod book;
pub mod dom;
pub mod epub;
pub mod error;
pub mod generator;
pub mod outline;
pub mod toc;
pub(crate) mod util;

pub use book::{
    Author, BookDescriptor, ContentItem, ContentType, GuideReference, Identifier, TocConfig,
    TocPageOptions, load_descriptor, parse_descriptor,
};
pub use epub::EpubConfig;
pub use error::{Error, Result};
pub use generator::Generator;
pub use outline::{HeadingNode, Outline};
pub use toc::{NavMap, NavPoint, PlayOrder};
