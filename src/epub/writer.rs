//! EPUB archive writer.
//!
//! The archive layout is fixed: `mimetype` first and stored, then
//! `META-INF/container.xml`, then the caller's entries under `OEBPS/` in the
//! order given, all deflated.

use std::io::{self, Seek, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{Error, Result};
use crate::util::sanitize_path;

/// Directory holding the package inside the archive.
pub const CONTENT_DIR: &str = "OEBPS";

const MIMETYPE: &[u8] = b"application/epub+zip";

const CONTAINER_XML: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>
"#;

/// Configuration for archive writing.
#[derive(Debug, Clone, Default)]
pub struct EpubConfig {
    /// Compression level for deflate (0-9, default 6).
    pub compression_level: Option<u32>,
}

impl EpubConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.compression_level = Some(level);
        self
    }
}

/// Where an entry's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryData {
    /// Markup synthesized during the run.
    Generated(String),
    /// A file copied verbatim.
    File(PathBuf),
}

/// One file under `OEBPS/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Path relative to the package directory.
    pub name: String,
    pub data: EntryData,
}

impl ArchiveEntry {
    pub fn generated(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: EntryData::Generated(content.into()),
        }
    }

    pub fn file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            data: EntryData::File(path.into()),
        }
    }

    /// Full path inside the archive.
    pub fn archive_path(&self) -> String {
        format!("{CONTENT_DIR}/{}", sanitize_path(&self.name))
    }
}

/// Writes EPUB archives.
pub struct EpubWriter {
    config: EpubConfig,
}

impl EpubWriter {
    pub fn new() -> Self {
        Self {
            config: EpubConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EpubConfig) -> Self {
        self.config = config;
        self
    }

    /// Fail with [`Error::MissingAsset`] if a file-backed entry does not exist.
    pub fn check_sources(entries: &[ArchiveEntry]) -> Result<()> {
        for entry in entries {
            if let EntryData::File(path) = &entry.data
                && !path.is_file()
            {
                return Err(Error::missing_asset(path));
            }
        }
        Ok(())
    }

    /// Write the archive to `writer`. `label` names the destination in errors.
    ///
    /// Sources are checked before the first entry is written.
    pub fn write_to<W: Write + Seek>(
        &self,
        writer: W,
        entries: &[ArchiveEntry],
        label: &Path,
    ) -> Result<W> {
        Self::check_sources(entries)?;
        self.write_entries(writer, entries, label)
    }

    /// Write the archive to `output`.
    ///
    /// The archive is built in a temporary file next to `output` and renamed
    /// over it only once complete; on failure the temporary file is removed
    /// and `output` is left untouched.
    pub fn write_file(&self, output: &Path, entries: &[ArchiveEntry]) -> Result<()> {
        Self::check_sources(entries)?;

        let dir = match output.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::Builder::new()
            .prefix(".bindery-")
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(|e| Error::archive_write(output, e))?;

        self.write_entries(tmp.as_file_mut(), entries, output)?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| Error::archive_write(output, e))?;
        tmp.persist(output)
            .map_err(|e| Error::archive_write(output, e.error))?;

        info!(path = %output.display(), entries = entries.len() + 2, "wrote archive");
        Ok(())
    }

    fn write_entries<W: Write + Seek>(
        &self,
        writer: W,
        entries: &[ArchiveEntry],
        label: &Path,
    ) -> Result<W> {
        let mut zip = ZipWriter::new(writer);

        let compression_level = self.config.compression_level.unwrap_or(6);
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        let deflated = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(compression_level as i64));

        let write_err = |e: io::Error| Error::archive_write(label, e);

        // mimetype must be first and uncompressed
        zip.start_file("mimetype", stored)
            .map_err(|e| zip_error(label, e))?;
        zip.write_all(MIMETYPE).map_err(write_err)?;

        zip.start_file("META-INF/container.xml", deflated)
            .map_err(|e| zip_error(label, e))?;
        zip.write_all(CONTAINER_XML).map_err(write_err)?;

        for entry in entries {
            let path = entry.archive_path();
            zip.start_file(path.as_str(), deflated)
                .map_err(|e| zip_error(label, e))?;

            match &entry.data {
                EntryData::Generated(content) => {
                    zip.write_all(content.as_bytes()).map_err(write_err)?;
                }
                EntryData::File(source) => {
                    let data = std::fs::read(source).map_err(|e| match e.kind() {
                        io::ErrorKind::NotFound => Error::missing_asset(source),
                        _ => Error::document_read(source, e),
                    })?;
                    zip.write_all(&data).map_err(write_err)?;
                }
            }
            debug!(entry = %path, "added entry");
        }

        zip.finish().map_err(|e| zip_error(label, e))
    }
}

impl Default for EpubWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn zip_error(label: &Path, e: ZipError) -> Error {
    Error::archive_write(label, io::Error::other(e))
}
