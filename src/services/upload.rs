use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::multipart::{Field, Multipart};
use tokio::{fs, io::AsyncWriteExt};

use crate::{
    config::UploadConfig,
    dto::upload::UploadedFile,
    error::UploadError,
    models::upload::ReceivedFile,
    services::id::IdGenerator,
    utils::filename::{has_allowed_extension, is_safe_file_name},
};

/// Multipart field that carries the uploaded file.
pub const FILE_FIELD: &str = "file";

/// Stores uploaded images in a single flat directory.
///
/// Files are streamed to `dest_dir/<temporary name>` and then renamed to
/// `<temporary name>.<extension>`. Nothing is ever cleaned up except through
/// [`UploadService::delete`].
pub struct UploadService {
    dest_dir: String,
    max_file_size: u64,
    allowed_extensions: Vec<String>,
    id_generator: Arc<dyn IdGenerator>,
}

impl UploadService {
    pub fn new(config: &UploadConfig, id_generator: Arc<dyn IdGenerator>) -> Self {
        Self {
            dest_dir: config.dest_dir.clone(),
            max_file_size: config.max_file_size,
            allowed_extensions: config.allowed_extensions.clone(),
            id_generator,
        }
    }

    pub fn dest_dir(&self) -> &Path {
        Path::new(&self.dest_dir)
    }

    /// Pre-filter on the client-supplied name. File content is never inspected.
    pub fn accepts(&self, original_name: &str) -> bool {
        has_allowed_extension(original_name, &self.allowed_extensions)
    }

    /// Path reported to clients for a stored file.
    pub fn stored_path(&self, name: &str) -> String {
        if self.dest_dir.ends_with('/') || self.dest_dir.ends_with('\\') {
            format!("{}{}", self.dest_dir, name)
        } else {
            format!("{}/{}", self.dest_dir, name)
        }
    }

    /// Receive, validate and store the single `file` field, then give it
    /// its final name.
    pub async fn process(&self, multipart: &mut Multipart) -> Result<UploadedFile, UploadError> {
        let received = self.receive(multipart).await?.ok_or(UploadError::NoFile)?;
        self.finalize(received).await
    }

    /// Stream the request's file field to disk under a temporary name.
    ///
    /// Returns `Ok(None)` when the body held no file. On error nothing is
    /// left in the destination directory and the rest of the body is drained.
    pub async fn receive(&self, multipart: &mut Multipart) -> Result<Option<ReceivedFile>, UploadError> {
        let mut received = None;

        if let Err(e) = self.receive_fields(multipart, &mut received).await {
            if let Some(file) = received.take() {
                self.discard(&file.temp_path).await;
            }

            tracing::warn!("Upload failed early: {}. Consuming remaining stream...", e);
            while let Ok(Some(mut field)) = multipart.next_field().await {
                while let Ok(Some(_)) = field.chunk().await {}
            }
            return Err(e);
        }

        Ok(received)
    }

    async fn receive_fields(
        &self,
        multipart: &mut Multipart,
        received: &mut Option<ReceivedFile>,
    ) -> Result<(), UploadError> {
        while let Some(mut field) = multipart
            .next_field()
            .await
            .map_err(|e| UploadError::from_multipart(e, self.max_file_size))?
        {
            let field_name = field.name().unwrap_or_default().to_string();

            // Parts without a filename are plain form values
            let Some(original_name) = field.file_name().map(str::to_string) else {
                tracing::debug!("Skipping form field {:?}", field_name);
                while field
                    .chunk()
                    .await
                    .map_err(|e| UploadError::from_multipart(e, self.max_file_size))?
                    .is_some()
                {}
                continue;
            };

            if field_name != FILE_FIELD {
                return Err(UploadError::UnexpectedField(field_name));
            }
            if received.is_some() {
                return Err(UploadError::TooManyFiles);
            }
            if !self.accepts(&original_name) {
                return Err(UploadError::InvalidFileType);
            }

            let temporary_name = self.id_generator.next_id();
            let temp_path = self.dest_dir().join(&temporary_name);
            tracing::info!("Receiving {:?} as {}", original_name, temporary_name);

            let size = match self.write_field(&mut field, &temp_path).await {
                Ok(size) => size,
                Err(e) => {
                    self.discard(&temp_path).await;
                    return Err(e);
                }
            };

            *received = Some(ReceivedFile {
                temporary_name,
                original_name,
                size,
                temp_path,
            });
        }

        Ok(())
    }

    /// Copy a field to `path` chunk by chunk, stopping as soon as the
    /// running total passes the size limit.
    async fn write_field(&self, field: &mut Field<'_>, path: &Path) -> Result<u64, UploadError> {
        fs::create_dir_all(self.dest_dir()).await?;
        let mut file = fs::File::create(path).await?;
        let mut size: u64 = 0;

        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| UploadError::from_multipart(e, self.max_file_size))?
        {
            size += chunk.len() as u64;
            if size > self.max_file_size {
                return Err(UploadError::FileTooLarge {
                    limit_bytes: self.max_file_size,
                });
            }
            file.write_all(&chunk).await?;
        }

        file.flush().await?;
        Ok(size)
    }

    /// Rename the temporary file to `<temporary name>.<extension>`.
    pub async fn finalize(&self, received: ReceivedFile) -> Result<UploadedFile, UploadError> {
        let name = received.final_name();
        let final_path = self.dest_dir().join(&name);

        fs::rename(&received.temp_path, &final_path).await?;
        tracing::info!("File saved to: {}", final_path.display());

        Ok(UploadedFile {
            path: self.stored_path(&name),
            name,
            size: received.size,
        })
    }

    /// Location of a stored file, refusing anything that is not a plain
    /// file name inside the destination directory.
    pub async fn resolve(&self, name: &str) -> Result<PathBuf, UploadError> {
        if !is_safe_file_name(name) {
            return Err(UploadError::InvalidFileName(name.to_string()));
        }

        let path = self.dest_dir().join(name);
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            Ok(_) => Err(UploadError::NotFound(name.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(UploadError::NotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn delete(&self, name: &str) -> Result<(), UploadError> {
        let path = self.resolve(name).await?;
        fs::remove_file(&path).await?;
        tracing::info!("File deleted: {}", path.display());
        Ok(())
    }

    async fn discard(&self, path: &Path) {
        match fs::remove_file(path).await {
            Ok(()) => tracing::debug!("Removed partial upload {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::error!("Failed to remove partial upload {}: {}", path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::services::id::SequentialId;
    use axum::http::StatusCode;
    use tempfile::TempDir;

    fn service_in(dir: &TempDir) -> UploadService {
        let mut config = AppConfig::default().upload;
        config.dest_dir = format!("{}/", dir.path().display());
        UploadService::new(&config, Arc::new(SequentialId::new("unit")))
    }

    fn received_in(dir: &TempDir, temporary_name: &str, original_name: &str) -> ReceivedFile {
        ReceivedFile {
            temporary_name: temporary_name.to_string(),
            original_name: original_name.to_string(),
            size: 5,
            temp_path: dir.path().join(temporary_name),
        }
    }

    #[test]
    fn accepts_only_configured_extensions() {
        let dir = TempDir::new().unwrap();
        let service = service_in(&dir);
        assert!(service.accepts("cat.gif"));
        assert!(!service.accepts("cat.webp"));
        assert!(!service.accepts("cat.GIF"));
    }

    #[test]
    fn stored_path_joins_without_doubling_separator() {
        let mut config = AppConfig::default().upload;
        config.dest_dir = "uploads".to_string();
        let service = UploadService::new(&config, Arc::new(SequentialId::new("p")));
        assert_eq!(service.stored_path("a.png"), "uploads/a.png");

        config.dest_dir = "uploads/".to_string();
        let service = UploadService::new(&config, Arc::new(SequentialId::new("p")));
        assert_eq!(service.stored_path("a.png"), "uploads/a.png");
    }

    #[tokio::test]
    async fn finalize_renames_temporary_file() {
        let dir = TempDir::new().unwrap();
        let service = service_in(&dir);
        tokio::fs::write(dir.path().join("tmp01"), b"hello").await.unwrap();

        let stored = service
            .finalize(received_in(&dir, "tmp01", "me.png"))
            .await
            .unwrap();

        assert_eq!(stored.name, "tmp01.png");
        assert_eq!(stored.size, 5);
        assert_eq!(stored.path, service.stored_path("tmp01.png"));
        assert!(!dir.path().join("tmp01").exists());
        assert_eq!(tokio::fs::read(dir.path().join("tmp01.png")).await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn finalize_surfaces_rename_failure_as_internal_error() {
        let dir = TempDir::new().unwrap();
        let service = service_in(&dir);

        let err = service
            .finalize(received_in(&dir, "missing", "me.png"))
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::Io(_)));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn resolve_rejects_paths_outside_destination() {
        let dir = TempDir::new().unwrap();
        let service = service_in(&dir);
        for name in ["../secret.png", "..", "a/b.png", ""] {
            assert!(matches!(
                service.resolve(name).await,
                Err(UploadError::InvalidFileName(_))
            ));
        }
    }

    #[tokio::test]
    async fn resolve_and_delete_missing_file() {
        let dir = TempDir::new().unwrap();
        let service = service_in(&dir);
        assert!(matches!(
            service.resolve("nope.png").await,
            Err(UploadError::NotFound(_))
        ));
        assert!(matches!(
            service.delete("nope.png").await,
            Err(UploadError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_removes_stored_file() {
        let dir = TempDir::new().unwrap();
        let service = service_in(&dir);
        tokio::fs::write(dir.path().join("x.gif"), b"GIF89a").await.unwrap();

        service.delete("x.gif").await.unwrap();
        assert!(!dir.path().join("x.gif").exists());
    }
}
