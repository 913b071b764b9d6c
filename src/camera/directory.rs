//! Camera lookup
//!
//! The streaming core never owns equipment records. Handlers resolve a
//! [`CameraProfile`] through a [`CameraDirectory`] each time they need one, so
//! configuration edits made by the provider take effect on the next start.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CameraId, CameraProfile, ConfigError};

/// Source of camera configuration
#[async_trait]
pub trait CameraDirectory: Send + Sync {
    /// Look up one camera
    async fn camera(&self, id: CameraId) -> Option<CameraProfile>;

    /// All cameras visible to this directory
    async fn cameras(&self) -> Vec<CameraProfile>;
}

/// In-memory directory, typically loaded from a JSON file
#[derive(Debug, Default)]
pub struct StaticDirectory {
    cameras: RwLock<BTreeMap<CameraId, CameraProfile>>,
}

impl StaticDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a directory from a list of profiles, rejecting duplicate ids
    pub fn from_profiles(profiles: Vec<CameraProfile>) -> Result<Self, ConfigError> {
        let mut cameras = BTreeMap::new();
        for profile in profiles {
            let id = profile.id;
            if cameras.insert(id, profile).is_some() {
                return Err(ConfigError::DuplicateCamera(id));
            }
        }

        Ok(Self {
            cameras: RwLock::new(cameras),
        })
    }

    /// Parse a JSON array of profiles
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let profiles: Vec<CameraProfile> =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::from_profiles(profiles)
    }

    /// Load a JSON array of profiles from disk
    pub async fn load(path: impl AsRef<Path>) -> crate::error::Result<Self> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path).await?;
        let directory = Self::from_json(&json)?;

        tracing::info!(
            path = %path.display(),
            cameras = directory.cameras.read().await.len(),
            "Camera directory loaded"
        );

        Ok(directory)
    }

    /// Insert or replace a profile
    pub async fn upsert(&self, profile: CameraProfile) {
        self.cameras.write().await.insert(profile.id, profile);
    }

    /// Remove a profile
    pub async fn remove(&self, id: CameraId) -> Option<CameraProfile> {
        self.cameras.write().await.remove(&id)
    }
}

#[async_trait]
impl CameraDirectory for StaticDirectory {
    async fn camera(&self, id: CameraId) -> Option<CameraProfile> {
        self.cameras.read().await.get(&id).cloned()
    }

    async fn cameras(&self) -> Vec<CameraProfile> {
        self.cameras.read().await.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_from_json() {
        let directory = StaticDirectory::from_json(
            r#"[
                {"id": 1, "rtsp_url": "rtsp://a/1", "stream_enabled": true},
                {"id": 2, "rtsp_url": "rtsp://a/2"}
            ]"#,
        )
        .unwrap();

        assert!(directory.camera(CameraId(1)).await.unwrap().has_stream_capability());
        assert!(!directory.camera(CameraId(2)).await.unwrap().has_stream_capability());
        assert!(directory.camera(CameraId(3)).await.is_none());
        assert_eq!(directory.cameras().await.len(), 2);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = StaticDirectory::from_profiles(vec![
            CameraProfile::new(5u64, "rtsp://a/1"),
            CameraProfile::new(5u64, "rtsp://a/2"),
        ]);

        assert!(matches!(result, Err(ConfigError::DuplicateCamera(CameraId(5)))));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            StaticDirectory::from_json("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_upsert_and_remove() {
        let directory = StaticDirectory::new();
        directory.upsert(CameraProfile::new(4u64, "rtsp://a/4")).await;
        assert!(directory.camera(CameraId(4)).await.is_some());

        assert!(directory.remove(CameraId(4)).await.is_some());
        assert!(directory.camera(CameraId(4)).await.is_none());
    }
}
