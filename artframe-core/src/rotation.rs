use std::sync::Arc;

use artframe_model::UpdateFrequency;
use tracing::{debug, warn};

use crate::{
    clock::{Clock, duration_ms},
    error::{AssetError, Result},
    infra::{LastRotationKey, MetadataStore, UpdateFrequencyKey},
};

/// Whether a new tab should show the next artwork.
///
/// `every_tab` always rotates, as does a first rotation; otherwise the
/// frequency's period must have fully elapsed.
pub fn rotation_due(
    frequency: UpdateFrequency,
    last_rotation_ms: Option<i64>,
    now_ms: i64,
) -> bool {
    let Some(period) = frequency.period() else {
        return true;
    };
    match last_rotation_ms {
        None => true,
        Some(last) => now_ms.saturating_sub(last) >= duration_ms(period),
    }
}

/// Persisted rotation preferences.
#[derive(Debug, Clone)]
pub struct RotationPolicy {
    metadata: MetadataStore,
    clock: Arc<dyn Clock>,
}

impl RotationPolicy {
    /// Policy over the preferences persisted in `metadata`.
    pub fn new(metadata: MetadataStore, clock: Arc<dyn Clock>) -> Self {
        Self { metadata, clock }
    }

    /// Stored frequency. Absent or unreadable values read as the default.
    pub async fn frequency(&self) -> Result<UpdateFrequency> {
        match self.metadata.get::<UpdateFrequencyKey>().await {
            Ok(value) => Ok(value.unwrap_or_default()),
            Err(AssetError::Serialization(msg)) => {
                warn!("update frequency unreadable, using default: {}", msg);
                Ok(UpdateFrequency::default())
            }
            Err(err) => Err(err),
        }
    }

    /// Persist a new frequency.
    pub async fn set_frequency(&self, frequency: UpdateFrequency) -> Result<()> {
        self.metadata.put::<UpdateFrequencyKey>(&frequency).await?;
        debug!("update frequency set to {}", frequency);
        Ok(())
    }

    /// When the cursor last advanced for a new tab, if ever.
    pub async fn last_rotation(&self) -> Result<Option<i64>> {
        match self.metadata.get::<LastRotationKey>().await {
            // Zero is the stored default for "never".
            Ok(value) => Ok(value.filter(|ms| *ms > 0)),
            Err(AssetError::Serialization(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// [`rotation_due`] against the stored state and the clock.
    pub async fn is_due(&self) -> Result<bool> {
        let frequency = self.frequency().await?;
        let last = self.last_rotation().await?;
        Ok(rotation_due(frequency, last, self.clock.now_ms()))
    }

    /// Stamp the last rotation with the current time.
    pub async fn record_rotation(&self) -> Result<()> {
        self.metadata
            .put::<LastRotationKey>(&self.clock.now_ms())
            .await
    }
}
