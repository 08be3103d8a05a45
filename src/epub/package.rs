//! Package document (OPF): manifest, spine and guide.

use std::path::Path;

use crate::book::BookDescriptor;
use crate::util::{encode_path, escape_xml};

/// Manifest id of the cover image.
pub const COVER_IMAGE_ID: &str = "coverimage";
/// Manifest id of the navigation map.
pub const NCX_ID: &str = "ncx";
/// Manifest id of the shared stylesheet.
pub const STYLESHEET_ID: &str = "style";

pub const NCX_HREF: &str = "toc.ncx";
pub const STYLESHEET_HREF: &str = "style.css";

const XHTML_MEDIA_TYPE: &str = "application/xhtml+xml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub id: String,
    /// Path relative to the package document.
    pub href: String,
    pub media_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpineEntry {
    pub idref: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuideEntry {
    pub kind: String,
    pub title: String,
    pub href: String,
}

/// Everything the package document lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub manifest: Vec<ManifestEntry>,
    pub spine: Vec<SpineEntry>,
    pub guide: Vec<GuideEntry>,
}

impl Package {
    /// Assemble manifest, spine and guide.
    ///
    /// Content documents get `item{i}` in descriptor order and images get
    /// `image{i}` in the order given, which callers keep sorted so that ids
    /// are stable across runs.
    pub fn assemble(book: &BookDescriptor, images: &[String]) -> Self {
        let mut manifest = vec![
            ManifestEntry {
                id: NCX_ID.to_string(),
                href: NCX_HREF.to_string(),
                media_type: "application/x-dtbncx+xml".to_string(),
            },
            ManifestEntry {
                id: STYLESHEET_ID.to_string(),
                href: STYLESHEET_HREF.to_string(),
                media_type: "text/css".to_string(),
            },
        ];

        if let Some(cover) = &book.cover {
            manifest.push(ManifestEntry {
                id: COVER_IMAGE_ID.to_string(),
                href: cover.clone(),
                media_type: image_media_type(cover),
            });
        }

        let mut spine = Vec::with_capacity(book.contents.len());
        for (i, item) in book.contents.iter().enumerate() {
            let id = format!("item{i}");
            manifest.push(ManifestEntry {
                id: id.clone(),
                href: item.source.clone(),
                media_type: XHTML_MEDIA_TYPE.to_string(),
            });
            spine.push(SpineEntry { idref: id });
        }

        for (i, image) in images.iter().enumerate() {
            manifest.push(ManifestEntry {
                id: format!("image{i}"),
                href: image.clone(),
                media_type: image_media_type(image),
            });
        }

        let guide = book
            .guide
            .iter()
            .map(|r| GuideEntry {
                kind: r.kind.clone(),
                title: r.title.clone(),
                href: r.href.clone(),
            })
            .collect();

        Self {
            manifest,
            spine,
            guide,
        }
    }

    pub fn entry(&self, id: &str) -> Option<&ManifestEntry> {
        self.manifest.iter().find(|e| e.id == id)
    }
}

/// Media type of an image from its extension.
///
/// `jpg` maps to `image/jpeg`; any other extension is used as the subtype.
pub fn image_media_type(path: &str) -> String {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "" => "application/octet-stream".to_string(),
        "jpg" => "image/jpeg".to_string(),
        _ => format!("image/{ext}"),
    }
}

/// Render the OPF 2.0 package document.
pub fn render_opf(book: &BookDescriptor, package: &Package) -> String {
    let mut opf = String::new();

    opf.push_str(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0" unique-identifier="BookId">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:opf="http://www.idpf.org/2007/opf">
"#,
    );

    opf.push_str(&format!(
        "    <dc:title>{}</dc:title>\n",
        escape_xml(&book.title)
    ));

    for (i, author) in book.authors.iter().enumerate() {
        let file_as = match (&author.sort, i) {
            (Some(sort), 0) => format!(" opf:file-as=\"{}\"", escape_xml(sort)),
            _ => String::new(),
        };
        opf.push_str(&format!(
            "    <dc:creator opf:role=\"aut\"{}>{}</dc:creator>\n",
            file_as,
            escape_xml(&author.name)
        ));
    }

    opf.push_str(&format!(
        "    <dc:language>{}</dc:language>\n",
        escape_xml(&book.language)
    ));

    opf.push_str(&format!(
        "    <dc:identifier id=\"BookId\" opf:scheme=\"{}\">{}</dc:identifier>\n",
        escape_xml(&book.identifier.scheme.to_uppercase()),
        escape_xml(&book.identifier.value)
    ));

    if !book.publisher.is_empty() {
        opf.push_str(&format!(
            "    <dc:publisher>{}</dc:publisher>\n",
            escape_xml(&book.publisher)
        ));
    }

    if !book.rights.is_empty() {
        opf.push_str(&format!(
            "    <dc:rights>{}</dc:rights>\n",
            escape_xml(&book.rights)
        ));
    }

    if book.cover.is_some() {
        opf.push_str(&format!(
            "    <meta name=\"cover\" content=\"{COVER_IMAGE_ID}\"/>\n"
        ));
    }

    opf.push_str("  </metadata>\n  <manifest>\n");
    for entry in &package.manifest {
        opf.push_str(&format!(
            "    <item id=\"{}\" href=\"{}\" media-type=\"{}\"/>\n",
            escape_xml(&entry.id),
            escape_xml(&encode_path(&entry.href)),
            escape_xml(&entry.media_type)
        ));
    }
    opf.push_str("  </manifest>\n");

    opf.push_str(&format!("  <spine toc=\"{NCX_ID}\">\n"));
    for entry in &package.spine {
        opf.push_str(&format!(
            "    <itemref idref=\"{}\"/>\n",
            escape_xml(&entry.idref)
        ));
    }
    opf.push_str("  </spine>\n");

    if !package.guide.is_empty() {
        opf.push_str("  <guide>\n");
        for entry in &package.guide {
            opf.push_str(&format!(
                "    <reference type=\"{}\" title=\"{}\" href=\"{}\"/>\n",
                escape_xml(&entry.kind),
                escape_xml(&entry.title),
                escape_xml(&entry.href)
            ));
        }
        opf.push_str("  </guide>\n");
    }

    opf.push_str("</package>\n");
    opf
}
