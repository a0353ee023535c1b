//! 토큰 영속 저장소.
//!
//! 클라이언트는 정확히 하나의 불투명 토큰 값을 하나의 키 아래 보관합니다.
//! 로그아웃, 강제 만료, 서버 무효화 시 삭제됩니다.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

/// 영속 문서에서 토큰이 저장되는 키.
pub const TOKEN_KEY: &str = "portal.token";

/// 저장소 에러.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("저장소 입출력 실패: {0}")]
    Io(#[from] std::io::Error),

    #[error("저장소 문서 형식 오류: {0}")]
    Format(#[from] serde_json::Error),
}

/// 토큰 저장소 trait.
#[async_trait]
pub trait TokenStorage: Send + Sync {
    /// 저장된 토큰 로드. 없으면 `None`.
    async fn load(&self) -> Result<Option<String>, StorageError>;

    /// 토큰 저장 (기존 값 대체).
    async fn save(&self, token: &str) -> Result<(), StorageError>;

    /// 토큰 삭제. 없어도 성공합니다.
    async fn clear(&self) -> Result<(), StorageError>;
}

/// 메모리 저장소. 테스트와 단일 프로세스 실행용.
#[derive(Debug, Default)]
pub struct MemoryTokenStorage {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 토큰이 미리 저장된 상태로 생성.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

#[async_trait]
impl TokenStorage for MemoryTokenStorage {
    async fn load(&self) -> Result<Option<String>, StorageError> {
        Ok(self.token.lock().await.clone())
    }

    async fn save(&self, token: &str) -> Result<(), StorageError> {
        *self.token.lock().await = Some(token.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        *self.token.lock().await = None;
        Ok(())
    }
}

/// 디스크에 저장되는 문서. 키는 정확히 하나입니다.
#[derive(Debug, Serialize, Deserialize)]
struct TokenDocument {
    #[serde(rename = "portal.token")]
    token: String,
}

/// JSON 파일 저장소.
///
/// 쓰기는 임시 파일에 기록한 뒤 rename하여 부분적으로 쓰인 문서가 남지 않도록 합니다.
#[derive(Debug, Clone)]
pub struct FileTokenStorage {
    path: PathBuf,
}

impl FileTokenStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 저장 파일 경로.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl TokenStorage for FileTokenStorage {
    async fn load(&self) -> Result<Option<String>, StorageError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let document: TokenDocument = serde_json::from_slice(&bytes)?;
        Ok(Some(document.token).filter(|t| !t.is_empty()))
    }

    async fn save(&self, token: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let document = TokenDocument {
            token: token.to_string(),
        };
        let temp = self.temp_path();
        tokio::fs::write(&temp, serde_json::to_vec(&document)?).await?;
        tokio::fs::rename(&temp, &self.path).await?;

        debug!(path = %self.path.display(), "Token persisted");
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "Token purged");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_memory_storage() {
        let storage = MemoryTokenStorage::new();
        assert_eq!(storage.load().await.unwrap(), None);

        storage.save("abc").await.unwrap();
        assert_eq!(storage.load().await.unwrap(), Some("abc".to_string()));

        storage.clear().await.unwrap();
        assert_eq!(storage.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_storage_single_key_document() {
        let dir = TempDir::new().unwrap();
        let storage = FileTokenStorage::new(dir.path().join("nested").join("session.json"));

        assert_eq!(storage.load().await.unwrap(), None);

        storage.save("first").await.unwrap();
        storage.save("second").await.unwrap();
        assert_eq!(storage.load().await.unwrap(), Some("second".to_string()));

        let raw = std::fs::read_to_string(storage.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 1);
        assert_eq!(object[TOKEN_KEY], "second");
    }

    #[tokio::test]
    async fn test_file_storage_clear_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let storage = FileTokenStorage::new(dir.path().join("session.json"));

        storage.clear().await.unwrap();
        storage.save("token").await.unwrap();
        storage.clear().await.unwrap();
        storage.clear().await.unwrap();

        assert!(!storage.path().exists());
        assert_eq!(storage.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_storage_corrupt_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();

        let storage = FileTokenStorage::new(&path);
        assert!(matches!(storage.load().await, Err(StorageError::Format(_))));
    }
}
