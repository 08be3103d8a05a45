//! EPUB 2 output: package document, navigation map, generated pages and the
//! archive itself.

pub mod ncx;
pub mod package;
pub mod pages;
mod writer;

pub use ncx::render_ncx;
pub use package::{GuideEntry, ManifestEntry, Package, SpineEntry, image_media_type, render_opf};
pub use pages::{DEFAULT_STYLESHEET, cover_page, title_page, toc_page};
pub use writer::{ArchiveEntry, CONTENT_DIR, EntryData, EpubConfig, EpubWriter};
