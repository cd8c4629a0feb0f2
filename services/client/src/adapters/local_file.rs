//! services/client/src/adapters/local_file.rs
//!
//! Reads a file from disk into an `UploadFile`, deciding its MIME type the way
//! a browser file picker would: by extension, falling back to content sniffing.

use knowledge_hub_core::domain::PDF_MIME_TYPE;
use knowledge_hub_core::UploadFile;
use std::io;
use std::path::Path;

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Loads `path` for upload. The MIME type is only a hint for the client-side
/// check; the backend decides what it accepts.
pub async fn load_upload_file(path: &Path) -> io::Result<UploadFile> {
    let bytes = tokio::fs::read(path).await?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
    let content_type = content_type_for(path, &bytes);
    Ok(UploadFile::new(filename, content_type, bytes))
}

pub fn content_type_for(path: &Path, bytes: &[u8]) -> &'static str {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase());
    match extension.as_deref() {
        Some("pdf") => PDF_MIME_TYPE,
        Some("txt") => "text/plain",
        Some("md") => "text/markdown",
        Some("html") | Some("htm") => "text/html",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        _ if bytes.starts_with(PDF_MAGIC) => PDF_MIME_TYPE,
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn extension_decides_first() {
        assert_eq!(content_type_for(Path::new("notes.PDF"), b""), PDF_MIME_TYPE);
        assert_eq!(content_type_for(Path::new("notes.txt"), PDF_MAGIC), "text/plain");
    }

    #[test]
    fn unknown_extension_is_sniffed() {
        assert_eq!(
            content_type_for(Path::new("download"), b"%PDF-1.7\n"),
            PDF_MIME_TYPE
        );
        assert_eq!(
            content_type_for(Path::new("download"), b"hello"),
            "application/octet-stream"
        );
    }

    #[tokio::test]
    async fn loads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path: PathBuf = dir.path().join("notes.pdf");
        std::fs::write(&path, b"%PDF-1.4 test").unwrap();

        let file = load_upload_file(&path).await.unwrap();

        assert_eq!(file.filename, "notes.pdf");
        assert!(file.is_pdf());
        assert_eq!(file.size(), 13);
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_upload_file(&dir.path().join("absent.pdf"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
