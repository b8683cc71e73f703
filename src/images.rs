use std::path::{Path, PathBuf};

use image::ImageFormat;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

use crate::{
    entities::movie_image,
    error::{AppError, AppResult},
};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Lowercased extension of an uploaded image file name, if it is one we accept.
pub fn image_extension(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    let ext = ext.to_ascii_lowercase();
    IMAGE_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// The bytes must decode as an image of the format named by `ext`.
fn check_image(ext: &str, data: &[u8]) -> AppResult<()> {
    let expected = ImageFormat::from_extension(ext)
        .ok_or_else(|| AppError::Validation(format!("unsupported image type {ext}")))?;
    let actual = image::guess_format(data)
        .map_err(|_| AppError::Validation("uploaded file is not an image".into()))?;
    if actual != expected {
        return Err(AppError::Validation(format!(
            "uploaded file is {} but named .{ext}",
            actual.extensions_str().first().copied().unwrap_or("unknown")
        )));
    }
    image::load_from_memory_with_format(data, actual)
        .map_err(|e| AppError::Validation(format!("uploaded image cannot be decoded: {e}")))?;
    Ok(())
}

/// Relative storage path: `<movie id>/<uuid>.<ext>`.
pub fn image_path(movie_id: i32, ext: &str) -> String {
    format!("{movie_id}/{}.{ext}", uuid::Uuid::new_v4())
}

/// Uploaded movie images: files under the media root, rows in `movie_image`.
#[derive(Clone)]
pub struct ImageStore {
    db: DatabaseConnection,
    root: PathBuf,
    max_bytes: usize,
}

impl ImageStore {
    pub fn new(db: DatabaseConnection, root: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self { db, root: root.into(), max_bytes }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub async fn store(
        &self,
        movie_id: i32,
        user_id: i32,
        file_name: &str,
        data: &[u8],
    ) -> AppResult<movie_image::Model> {
        let ext = image_extension(file_name)
            .ok_or_else(|| AppError::Validation(format!("{file_name:?} is not an image file")))?;
        if data.is_empty() {
            return Err(AppError::Validation("uploaded image is empty".into()));
        }
        if data.len() > self.max_bytes {
            return Err(AppError::Validation(format!(
                "uploaded image exceeds {} bytes",
                self.max_bytes
            )));
        }

        let owned = data.to_vec();
        let check_ext = ext.clone();
        tokio::task::spawn_blocking(move || check_image(&check_ext, &owned))
            .await
            .map_err(|e| anyhow::anyhow!("image check task failed: {e}"))??;

        let rel_path = image_path(movie_id, &ext);
        let full_path = self.root.join(&rel_path);
        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full_path, data).await?;

        let model = movie_image::ActiveModel {
            id: Default::default(),
            image: Set(rel_path),
            uploaded: Set(jiff::Timestamp::now().as_second()),
            movie_id: Set(movie_id),
            user_id: Set(user_id),
        };
        let image = match model.insert(&self.db).await {
            Ok(image) => image,
            Err(err) => {
                if let Err(rm_err) = tokio::fs::remove_file(&full_path).await {
                    tracing::warn!(path = ?full_path, error = %rm_err, "failed to remove orphaned upload");
                }
                return Err(err.into());
            }
        };

        tracing::info!(movie_id, user_id, path = %image.image, size = data.len(), "stored movie image");
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{catalog::Catalog, testing};

    #[test]
    fn accepts_image_extensions() {
        assert_eq!(image_extension("poster.JPG").as_deref(), Some("jpg"));
        assert_eq!(image_extension("a.b.webp").as_deref(), Some("webp"));
        assert_eq!(image_extension("notes.txt"), None);
        assert_eq!(image_extension("noext"), None);
        assert_eq!(image_extension(".png"), None);
    }

    #[test]
    fn paths_are_per_movie_and_random() {
        let a = image_path(7, "png");
        let b = image_path(7, "png");
        assert!(a.starts_with("7/"));
        assert!(a.ends_with(".png"));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn stores_file_and_row() {
        let db = testing::test_db().await;
        let media = tempfile::tempdir().unwrap();
        let catalog = Catalog::new(db.clone());
        let store = ImageStore::new(db.clone(), media.path(), 1024);
        let movie = catalog.save_movie(None, &testing::movie_input("Metropolis", 1927)).await.unwrap();
        let user = testing::user(&db, "fritz").await;

        let png = testing::png_bytes();
        let image = store.store(movie.id, user.id, "still.png", &png).await.unwrap();
        assert!(image.image.starts_with(&format!("{}/", movie.id)));
        let on_disk = tokio::fs::read(media.path().join(&image.image)).await.unwrap();
        assert_eq!(on_disk, png);

        let detail = catalog.movie_detail(movie.id).await.unwrap();
        assert_eq!(detail.images.len(), 1);

        let err = store.store(movie.id, user.id, "still.exe", b"x").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        let err = store.store(movie.id, user.id, "big.png", &[0u8; 2048]).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn rejects_content_that_is_not_the_named_image() {
        let db = testing::test_db().await;
        let media = tempfile::tempdir().unwrap();
        let catalog = Catalog::new(db.clone());
        let store = ImageStore::new(db.clone(), media.path(), 1024);
        let movie = catalog.save_movie(None, &testing::movie_input("Metropolis", 1927)).await.unwrap();
        let user = testing::user(&db, "fritz").await;

        let png = testing::png_bytes();
        for (name, data) in [
            ("x.png", b"<html><script>alert(1)</script>".as_slice()),
            ("x.png", b"\x89PNG\r\n\x1a\n truncated".as_slice()),
            ("x.jpg", png.as_slice()),
        ] {
            let err = store.store(movie.id, user.id, name, data).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{name}");
        }

        let detail = catalog.movie_detail(movie.id).await.unwrap();
        assert!(detail.images.is_empty());
        let movie_dir = media.path().join(movie.id.to_string());
        assert!(!movie_dir.exists());
    }
}
