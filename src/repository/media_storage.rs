// ==========================================
// 商品导入暂存系统 - 媒体存储
// ==========================================
// 职责: 暂存商品图片的存取（唯一文件名，无需加锁）
// 实现: LocalMediaStorage（本地文件系统，tokio::fs）
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// 允许的图片扩展名
pub const ALLOWED_IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "webp", "gif"];

/// 默认单张图片上限（10MB）
pub const DEFAULT_MAX_IMAGE_SIZE: u64 = 10 * 1024 * 1024;

/// 暂存图片子目录
const TEMP_DIR: &str = "temp";

// ==========================================
// MediaStorage Trait
// ==========================================
// 用途: 存储抽象（保存 / 复制 / 删除 / 存在 / URL）
// 实现者: LocalMediaStorage
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// 保存字节内容
    ///
    /// # 返回
    /// - Ok(String): 存储相对路径（temp/<uuid>.<ext>）
    async fn store(&self, content: &[u8], extension: &str) -> RepositoryResult<String>;

    /// 复制已有文件到新的唯一路径
    async fn copy(&self, from: &str) -> RepositoryResult<String>;

    async fn delete(&self, path: &str) -> RepositoryResult<()>;

    async fn exists(&self, path: &str) -> RepositoryResult<bool>;

    /// 相对路径 → 访问 URL
    fn url(&self, path: &str) -> String;
}

// ==========================================
// LocalMediaStorage
// ==========================================
pub struct LocalMediaStorage {
    root: PathBuf,
    base_url: String,
    max_size: u64,
}

impl LocalMediaStorage {
    pub fn new(root: PathBuf, base_url: &str, max_size: u64) -> Self {
        Self {
            root,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_size,
        }
    }

    /// 默认根目录: <data_local_dir>/product-import-staging/media
    pub fn default_root() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("product-import-staging")
            .join("media")
    }

    pub fn with_default_root() -> Self {
        Self::new(Self::default_root(), "/media", DEFAULT_MAX_IMAGE_SIZE)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 相对路径解析（拒绝绝对路径与 ..）
    fn resolve(&self, relative: &str) -> RepositoryResult<PathBuf> {
        let candidate = Path::new(relative);
        let safe = candidate
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !safe || relative.trim().is_empty() {
            return Err(RepositoryError::StorageError(format!(
                "非法存储路径: {}",
                relative
            )));
        }
        Ok(self.root.join(candidate))
    }

    fn normalize_extension(extension: &str) -> RepositoryResult<String> {
        let ext = extension.trim().trim_start_matches('.').to_lowercase();
        if !ALLOWED_IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            return Err(RepositoryError::StorageError(format!(
                "不支持的图片格式: {}",
                extension
            )));
        }
        Ok(ext)
    }

    fn unique_relative_path(ext: &str) -> String {
        format!("{}/{}.{}", TEMP_DIR, Uuid::new_v4(), ext)
    }
}

#[async_trait]
impl MediaStorage for LocalMediaStorage {
    async fn store(&self, content: &[u8], extension: &str) -> RepositoryResult<String> {
        if content.len() as u64 > self.max_size {
            return Err(RepositoryError::StorageError(format!(
                "图片过大: {} 字节（上限 {} 字节）",
                content.len(),
                self.max_size
            )));
        }
        let ext = Self::normalize_extension(extension)?;
        let relative = Self::unique_relative_path(&ext);
        let target = self.resolve(&relative)?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, content).await?;
        debug!(path = %relative, size = content.len(), "图片已保存");
        Ok(relative)
    }

    async fn copy(&self, from: &str) -> RepositoryResult<String> {
        let source = self.resolve(from)?;
        let ext = source
            .extension()
            .and_then(|e| e.to_str())
            .map(Self::normalize_extension)
            .transpose()?
            .unwrap_or_else(|| "jpg".to_string());

        let relative = Self::unique_relative_path(&ext);
        let target = self.resolve(&relative)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(&source, &target).await?;
        Ok(relative)
    }

    async fn delete(&self, path: &str) -> RepositoryResult<()> {
        let target = self.resolve(path)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path, "删除的图片不存在");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, path: &str) -> RepositoryResult<bool> {
        let target = self.resolve(path)?;
        Ok(tokio::fs::try_exists(&target).await?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(dir: &tempfile::TempDir) -> LocalMediaStorage {
        LocalMediaStorage::new(dir.path().to_path_buf(), "/media/", 16)
    }

    #[tokio::test]
    async fn test_store_copy_delete() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir);

        let first = storage.store(b"png-bytes", ".PNG").await.unwrap();
        assert!(first.starts_with("temp/"));
        assert!(first.ends_with(".png"));
        assert!(storage.exists(&first).await.unwrap());

        let second = storage.copy(&first).await.unwrap();
        assert_ne!(first, second);
        assert!(storage.exists(&second).await.unwrap());

        storage.delete(&first).await.unwrap();
        assert!(!storage.exists(&first).await.unwrap());
        // 重复删除不报错
        storage.delete(&first).await.unwrap();

        assert_eq!(storage.url(&second), format!("/media/{}", second));
    }

    #[tokio::test]
    async fn test_store_rejects_oversize_and_bad_extension() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir);

        assert!(storage.store(&[0u8; 17], "png").await.is_err());
        assert!(storage.store(b"x", "exe").await.is_err());
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir);
        assert!(storage.exists("../etc/passwd").await.is_err());
        assert!(storage.delete("/etc/passwd").await.is_err());
    }
}
