use crate::services::error::{ServiceError, ServiceResult};
use crate::services::storage::{StageEncryption, StageStore};
use crate::utils::keyed_mutex::KeyedMutex;
use crate::utils::validation::validate_stage_name;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// The stage was already there with the required encryption
    Existing,
    /// The stage was created by this call
    Created,
}

/// Makes sure a stage exists before anything is written to it.
///
/// Existence is never cached: every call describes the stage. A stage that
/// is missing, or present without the required encryption, is (re)created;
/// only then is it reported as `Created`. Calls for the same name are
/// serialized, so once one creation succeeds the others observe the stage.
pub struct StageManager {
    store: Arc<dyn StageStore>,
    encryption: StageEncryption,
    locks: KeyedMutex,
}

impl StageManager {
    pub fn new(store: Arc<dyn StageStore>) -> Self {
        Self {
            store,
            encryption: StageEncryption::ServerSide,
            locks: KeyedMutex::new(),
        }
    }

    pub async fn ensure_stage_exists(&self, stage: &str) -> ServiceResult<StageStatus> {
        validate_stage_name(stage)?;

        let guard = self.locks.lock(stage).await;
        let result = self.describe_or_create(stage).await;
        drop(guard);
        self.locks.cleanup();

        result
    }

    async fn describe_or_create(&self, stage: &str) -> ServiceResult<StageStatus> {
        match self.store.describe_stage(stage).await {
            Ok(Some(encryption)) if encryption == self.encryption => {
                return Ok(StageStatus::Existing);
            }
            Ok(_) => warn!(
                "⚠️ Stage @{} exists without {:?} encryption, re-applying",
                stage, self.encryption
            ),
            Err(_) => {}
        }

        match self.store.create_stage(stage, self.encryption).await {
            Ok(()) => {
                info!("🪣 Stage @{} has been created.", stage);
                Ok(StageStatus::Created)
            }
            Err(e) => {
                error!("❌ Failed to create stage @{}: {:?}", stage, e);
                Err(ServiceError::StageUnavailable {
                    stage: stage.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::storage::MemoryStageStore;

    #[tokio::test]
    async fn test_locks_released_after_ensure() {
        let manager = StageManager::new(Arc::new(MemoryStageStore::new()));

        for stage in ["images_stage", "audio_stage", "docs_stage"] {
            manager.ensure_stage_exists(stage).await.unwrap();
        }

        assert!(manager.locks.is_empty());
    }
}
