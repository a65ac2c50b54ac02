//! Content materializer
//!
//! Turns request content into a file the spooler or renderer can consume.
//! Transient artifacts are deleted when their [`Artifact`] guard is dropped
//! or released; decoded PDFs are retained in the output directory.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tempfile::TempPath;
use tracing::{debug, info, warn};

use super::error::{DispatchError, DispatchResult};
use super::types::ContentType;

const TEMP_PREFIX: &str = "print-bridge-";
const PDF_MIME: &str = "application/pdf";

/// A materialized print artifact
#[derive(Debug)]
pub enum Artifact {
    /// Owned temp file, deleted on drop
    Transient(TempPath),
    /// Decoded output kept after printing
    Retained(PathBuf),
    /// Caller-supplied path, never touched
    Borrowed(PathBuf),
}

impl Artifact {
    pub fn path(&self) -> &Path {
        match self {
            Artifact::Transient(temp) => &**temp,
            Artifact::Retained(path) | Artifact::Borrowed(path) => path,
        }
    }

    /// Delete transient files now; returns the path of a retained artifact
    pub fn release(self) -> Option<PathBuf> {
        match self {
            Artifact::Transient(temp) => {
                let path = temp.to_path_buf();
                if let Err(e) = temp.close() {
                    warn!(path = %path.display(), error = %e, "Failed to remove print artifact");
                }
                None
            }
            Artifact::Retained(path) => Some(path),
            Artifact::Borrowed(_) => None,
        }
    }
}

/// `data:<mime>;base64,<payload>`
struct DataUri<'a> {
    mime: &'a str,
    payload: &'a str,
}

impl<'a> DataUri<'a> {
    fn parse(content: &'a str) -> Option<Self> {
        let rest = content.strip_prefix("data:")?;
        let (header, payload) = rest.split_once(',')?;
        let mime = header.strip_suffix(";base64")?;
        Some(Self { mime, payload })
    }

    fn decode(&self) -> DispatchResult<Vec<u8>> {
        let compact: String = self
            .payload
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        STANDARD
            .decode(compact)
            .map_err(|e| DispatchError::DecodeFailed(e.to_string()))
    }
}

/// File extension for a decoded image, from its MIME type
pub fn image_extension(mime: &str) -> &'static str {
    let mime = mime.to_ascii_lowercase();
    if mime.contains("jpeg") || mime.contains("jpg") {
        ".jpg"
    } else if mime.contains("png") {
        ".png"
    } else if mime.contains("gif") {
        ".gif"
    } else {
        ".png"
    }
}

#[derive(Debug, Clone)]
pub struct Materializer {
    temp_dir: PathBuf,
    output_dir: PathBuf,
}

impl Materializer {
    pub fn new(temp_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            temp_dir: temp_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    /// Produce a fresh artifact for `content`
    pub fn materialize(&self, content: &str, content_type: ContentType) -> DispatchResult<Artifact> {
        match content_type {
            ContentType::Text => self.transient(content.as_bytes(), ".txt"),
            ContentType::Html => self.transient(content.as_bytes(), ".html"),
            ContentType::Pdf => self.pdf(content),
            ContentType::Image => self.image(content),
        }
    }

    fn pdf(&self, content: &str) -> DispatchResult<Artifact> {
        if !content.starts_with("data:") {
            return Ok(Artifact::Borrowed(PathBuf::from(content)));
        }

        let uri = DataUri::parse(content)
            .filter(|uri| uri.mime.eq_ignore_ascii_case(PDF_MIME))
            .ok_or_else(|| {
                DispatchError::DecodeFailed("expected data:application/pdf;base64,".to_string())
            })?;
        let bytes = uri.decode()?;

        fs::create_dir_all(&self.output_dir)?;
        let file_name = format!(
            "printed_pdf_{}_{}.pdf",
            chrono::Local::now().format("%Y%m%d_%H%M%S"),
            &uuid::Uuid::new_v4().simple().to_string()[..8]
        );
        let path = self.output_dir.join(file_name);

        write_new_file(&path, |file| file.write_all(&bytes))?;

        info!(path = %path.display(), bytes = bytes.len(), "Saved PDF for printing");
        Ok(Artifact::Retained(path))
    }

    fn image(&self, content: &str) -> DispatchResult<Artifact> {
        if !content.starts_with("data:") {
            return Ok(Artifact::Borrowed(PathBuf::from(content)));
        }

        let uri = DataUri::parse(content)
            .filter(|uri| uri.mime.to_ascii_lowercase().starts_with("image/"))
            .ok_or_else(|| {
                DispatchError::DecodeFailed("expected data:image/<type>;base64,".to_string())
            })?;
        let bytes = uri.decode()?;
        self.transient(&bytes, image_extension(uri.mime))
    }

    fn transient(&self, bytes: &[u8], suffix: &str) -> DispatchResult<Artifact> {
        fs::create_dir_all(&self.temp_dir)?;
        let mut file = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(suffix)
            .tempfile_in(&self.temp_dir)?;
        file.write_all(bytes)?;
        file.flush()?;

        // Close our handle so the spooler can open the file on any platform
        let path = file.into_temp_path();
        debug!(path = %path.display(), bytes = bytes.len(), "Materialized print artifact");
        Ok(Artifact::Transient(path))
    }
}

/// Create `path` and fill it with `write`; a failed write leaves no file behind
fn write_new_file(path: &Path, write: impl FnOnce(&mut File) -> io::Result<()>) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    let written = write(&mut file).and_then(|()| file.sync_all());
    drop(file);

    if let Err(e) = written {
        if let Err(remove) = fs::remove_file(path) {
            warn!(path = %path.display(), error = %remove, "Failed to remove partial artifact");
        }
        return Err(e);
    }
    Ok(())
}
