//! One generation run: descriptor in, EPUB archive out.
//!
//! # Example
//!
//! ```no_run
//! use bindery::Generator;
//!
//! let generator = Generator::open("iliada/iliada.json")?;
//! let output = generator.write(None)?;
//! println!("wrote {}", output.display());
//! # Ok::<(), bindery::Error>(())
//! ```

use std::io::{Seek, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::book::{self, BookDescriptor, ContentItem, ContentType};
use crate::epub::{
    self, ArchiveEntry, DEFAULT_STYLESHEET, EpubConfig, EpubWriter, Package,
    package::{NCX_HREF, STYLESHEET_HREF},
};
use crate::error::{Error, Result};
use crate::outline::{self, Outline};
use crate::toc::{NavMap, render_linear_toc};
use crate::util::sanitize_path;

const OPF_HREF: &str = "content.opf";

/// Everything derived from a descriptor, built once and then serialized.
pub struct Generator {
    book: BookDescriptor,
    root: PathBuf,
    /// Descriptor file, when loaded from disk.
    origin: Option<PathBuf>,
    outline: Outline,
    images: Vec<String>,
    nav: NavMap,
    config: EpubConfig,
}

impl Generator {
    /// Prepare a run for an in-memory descriptor whose sources are relative
    /// to `root`.
    ///
    /// Every content document is parsed here, so read errors and missing
    /// assets surface before anything is written.
    pub fn new(book: BookDescriptor, root: impl Into<PathBuf>) -> Result<Self> {
        Self::prepare(book, root.into(), None)
    }

    /// Load a descriptor file and prepare a run for it.
    pub fn open(descriptor: impl AsRef<Path>) -> Result<Self> {
        let descriptor = descriptor.as_ref();
        let book = book::load_descriptor(descriptor)?;
        Self::prepare(book, book::book_root(descriptor), Some(descriptor.to_path_buf()))
    }

    fn prepare(mut book: BookDescriptor, root: PathBuf, origin: Option<PathBuf>) -> Result<Self> {
        if book.ensure_cover_page() {
            debug!(source = book::DEFAULT_COVER_PAGE, "inserted cover page");
        }
        book.validate(origin.as_deref().unwrap_or(&root))?;

        for asset in book.cover.iter().chain(&book.stylesheet) {
            let path = root.join(asset);
            if !path.is_file() {
                return Err(Error::missing_asset(path));
            }
        }

        let scan = outline::scan(&book, &root)?;

        // The cover image has its own manifest entry.
        let cover = book.cover.as_deref().map(sanitize_path);
        let mut images = scan.images;
        images.retain(|image| Some(image) != cover.as_ref());

        if let Some(missing) = images.iter().map(|i| root.join(i)).find(|p| !p.is_file()) {
            return Err(Error::missing_asset(missing));
        }

        let nav = NavMap::build(&scan.outline);
        info!(
            title = %book.title,
            documents = book.contents.len(),
            headings = scan.outline.heading_count(),
            images = images.len(),
            "prepared book"
        );

        Ok(Self {
            book,
            root,
            origin,
            outline: scan.outline,
            images,
            nav,
            config: EpubConfig::default(),
        })
    }

    pub fn with_config(mut self, config: EpubConfig) -> Self {
        self.config = config;
        self
    }

    pub fn book(&self) -> &BookDescriptor {
        &self.book
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn outline(&self) -> &Outline {
        &self.outline
    }

    /// Images referenced by the content documents, sorted, without the cover.
    pub fn images(&self) -> &[String] {
        &self.images
    }

    pub fn nav_map(&self) -> &NavMap {
        &self.nav
    }

    /// The flat TOC listing, with links relative to a page at `from`.
    pub fn linear_toc(&self, from: &str) -> String {
        render_linear_toc(&self.outline, from)
    }

    pub fn package(&self) -> Package {
        Package::assemble(&self.book, &self.images)
    }

    /// The package document.
    pub fn opf(&self) -> String {
        epub::render_opf(&self.book, &self.package())
    }

    /// The navigation map document.
    pub fn ncx(&self) -> String {
        let fallback = self.book.contents.first().map_or("", |i| i.source.as_str());
        epub::render_ncx(&self.book, &self.nav, fallback)
    }

    /// Archive entries under `OEBPS/`, in write order.
    pub fn entries(&self) -> Result<Vec<ArchiveEntry>> {
        let mut entries = Vec::with_capacity(self.images.len() + self.book.contents.len() + 4);

        if let Some(cover) = &self.book.cover {
            entries.push(ArchiveEntry::file(cover.clone(), self.root.join(cover)));
        }
        for image in &self.images {
            entries.push(ArchiveEntry::file(image.clone(), self.root.join(image)));
        }

        entries.push(match &self.book.stylesheet {
            Some(css) => ArchiveEntry::file(STYLESHEET_HREF, self.root.join(css)),
            None => ArchiveEntry::generated(STYLESHEET_HREF, DEFAULT_STYLESHEET),
        });

        for item in &self.book.contents {
            let entry = if item.generate {
                ArchiveEntry::generated(item.source.clone(), self.generated_page(item)?)
            } else {
                ArchiveEntry::file(item.source.clone(), self.root.join(&item.source))
            };
            entries.push(entry);
        }

        entries.push(ArchiveEntry::generated(OPF_HREF, self.opf()));
        entries.push(ArchiveEntry::generated(NCX_HREF, self.ncx()));
        Ok(entries)
    }

    fn generated_page(&self, item: &ContentItem) -> Result<String> {
        let page = match (item.kind, &self.book.cover) {
            (ContentType::Cover, Some(cover)) => epub::cover_page(&self.book, &item.source, cover),
            (ContentType::TitlePage, _) => epub::title_page(&self.book, &item.source),
            (ContentType::Toc, _) => epub::toc_page(&self.book, &item.source, &self.outline),
            _ => {
                return Err(Error::config(
                    self.origin.as_deref().unwrap_or(&self.root),
                    format!("cannot generate {} item {}", item.kind, item.source),
                ));
            }
        };
        debug!(source = %item.source, kind = %item.kind, "generated page");
        Ok(page)
    }

    /// `<descriptor stem>.epub` next to the descriptor, or `book.epub` in the
    /// book root.
    pub fn default_output(&self) -> PathBuf {
        match &self.origin {
            Some(descriptor) => descriptor.with_extension("epub"),
            None => self.root.join("book.epub"),
        }
    }

    /// Write the archive to `output` (or [`default_output`](Self::default_output)),
    /// returning the path written.
    pub fn write(&self, output: Option<&Path>) -> Result<PathBuf> {
        let output = output.map_or_else(|| self.default_output(), Path::to_path_buf);
        let entries = self.entries()?;
        EpubWriter::new()
            .with_config(self.config.clone())
            .write_file(&output, &entries)?;
        Ok(output)
    }

    /// Write the archive to any seekable destination.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<W> {
        let entries = self.entries()?;
        EpubWriter::new()
            .with_config(self.config.clone())
            .write_to(writer, &entries, Path::new("<memory>"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::{Author, Identifier, TocConfig, TocPageOptions};
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("ch1.html"),
            r#"<html><body><h1 id="c1">One</h1><img src="img/fig.png"/><img src="capa.jpg"/></body></html>"#,
        )
        .unwrap();
        fs::create_dir(dir.path().join("img")).unwrap();
        fs::write(dir.path().join("img/fig.png"), b"png").unwrap();
        fs::write(dir.path().join("capa.jpg"), b"jpg").unwrap();
        dir
    }

    fn book() -> BookDescriptor {
        BookDescriptor::new("Ilíada", Identifier::new("isbn", "1"))
            .with_author(Author::new("Homero"))
            .with_content(ContentItem::generated(ContentType::Toc, "toc.html"))
            .with_content(ContentItem::text("ch1.html"))
            .with_toc(TocConfig::new(2).with_page(TocPageOptions::new("Índice")))
    }

    #[test]
    fn test_cover_excluded_from_images() {
        let dir = fixture();
        let generator = Generator::new(book().with_cover("capa.jpg"), dir.path()).unwrap();

        assert_eq!(generator.images(), ["img/fig.png"]);
        assert_eq!(generator.book().contents[0].source, "cover.html");

        let names: Vec<_> = generator
            .entries()
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, [
            "capa.jpg",
            "img/fig.png",
            "style.css",
            "cover.html",
            "toc.html",
            "ch1.html",
            "content.opf",
            "toc.ncx"
        ]);
    }

    #[test]
    fn test_missing_cover() {
        let dir = fixture();
        let err = Generator::new(book().with_cover("nope.jpg"), dir.path())
            .err()
            .unwrap();
        assert!(matches!(err, Error::MissingAsset { path } if path.ends_with("nope.jpg")));
    }

    #[test]
    fn test_missing_image() {
        let dir = fixture();
        fs::remove_file(dir.path().join("img/fig.png")).unwrap();
        let err = Generator::new(book(), dir.path()).err().unwrap();
        assert!(matches!(err, Error::MissingAsset { path } if path.ends_with("img/fig.png")));
    }

    #[test]
    fn test_image_with_space_in_name() {
        let dir = fixture();
        fs::write(
            dir.path().join("ch2.html"),
            r#"<html><body><h1>Two</h1><img src="img/my%20fig.png"/></body></html>"#,
        )
        .unwrap();
        fs::write(dir.path().join("img/my fig.png"), b"png").unwrap();

        let generator =
            Generator::new(book().with_content(ContentItem::text("ch2.html")), dir.path()).unwrap();
        assert_eq!(generator.images(), ["capa.jpg", "img/fig.png", "img/my fig.png"]);
        assert!(generator.opf().contains(
            "<item id=\"image2\" href=\"img/my%20fig.png\" media-type=\"image/png\"/>"
        ));

        let entries = generator.entries().unwrap();
        assert!(entries.iter().any(|e| e.name == "img/my fig.png"));
    }

    #[test]
    fn test_custom_stylesheet() {
        let dir = fixture();
        fs::write(dir.path().join("book.css"), "p { margin: 0 }").unwrap();
        let generator = Generator::new(book().with_stylesheet("book.css"), dir.path()).unwrap();
        let style = generator
            .entries()
            .unwrap()
            .into_iter()
            .find(|e| e.name == "style.css")
            .unwrap();
        assert_eq!(style.data, epub::EntryData::File(dir.path().join("book.css")));
    }

    #[test]
    fn test_generated_toc_page_lists_headings() {
        let dir = fixture();
        let generator = Generator::new(book(), dir.path()).unwrap();
        let toc = generator
            .entries()
            .unwrap()
            .into_iter()
            .find(|e| e.name == "toc.html")
            .unwrap();
        let epub::EntryData::Generated(html) = toc.data else {
            panic!("toc page should be generated");
        };
        assert!(html.contains("<a href=\"ch1.html#c1\">One</a>"));
        assert!(html.contains("<h1>Índice</h1>"));
        assert!(generator.linear_toc("toc.html").contains("ch1.html#c1"));
    }

    #[test]
    fn test_default_output() {
        let dir = fixture();
        let generator = Generator::new(book(), dir.path()).unwrap();
        assert_eq!(generator.default_output(), dir.path().join("book.epub"));

        fs::write(
            dir.path().join("iliada.json"),
            r#"{
                "title": "Ilíada",
                "authors": [{"name": "Homero"}],
                "identifier": {"scheme": "isbn", "value": "1"},
                "language": "pt",
                "contents": [{"type": "text", "source": "ch1.html"}],
                "toc": {"depth": 1, "parse": ["text"]}
            }"#,
        )
        .unwrap();
        let generator = Generator::open(dir.path().join("iliada.json")).unwrap();
        assert_eq!(generator.default_output(), dir.path().join("iliada.epub"));
    }
}
