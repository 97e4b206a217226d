//! Persistence of prediction records.

use async_trait::async_trait;
use fuelcell_core::{NewPrediction, PredictionRecord, Result};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

#[async_trait]
pub trait PredictionStore: Send + Sync {
    async fn create(&self, prediction: NewPrediction) -> Result<PredictionRecord>;

    async fn get(&self, id: Uuid) -> Result<Option<PredictionRecord>>;

    /// Up to `limit` records, newest first.
    async fn recent(&self, limit: usize) -> Result<Vec<PredictionRecord>>;
}

/// Process-local store for development and tests.
#[derive(Default)]
pub struct InMemoryPredictionStore {
    records: RwLock<Vec<PredictionRecord>>,
}

impl InMemoryPredictionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl PredictionStore for InMemoryPredictionStore {
    async fn create(&self, prediction: NewPrediction) -> Result<PredictionRecord> {
        prediction.validate()?;
        let record = prediction.into_record();
        debug!(id = %record.id, model_type = %record.model_type, "Storing prediction");
        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn get(&self, id: Uuid) -> Result<Option<PredictionRecord>> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .find(|record| record.id == id)
            .cloned())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<PredictionRecord>> {
        let records = self.records.read().await;
        let mut newest: Vec<PredictionRecord> = records.iter().rev().cloned().collect();
        // insertion order already breaks ties between equal timestamps
        newest.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        newest.truncate(limit);
        Ok(newest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fuelcell_core::{FuelCellError, RECENT_PREDICTIONS_LIMIT};

    fn prediction(temperature: f64) -> NewPrediction {
        NewPrediction {
            model_type: "svr".to_string(),
            currents: vec![0.0, 10.0],
            voltages: vec![1.0, 0.8],
            powers: vec![0.0, 8.0],
            temperature,
            hydrogen: 1.0,
            oxygen: 1.0,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = InMemoryPredictionStore::new();
        let record = store.create(prediction(60.0)).await.unwrap();

        let fetched = store.get(record.id).await.unwrap().unwrap();
        assert_eq!(fetched, record);
        assert!(store.get(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_recent_is_newest_first_and_limited() {
        let store = InMemoryPredictionStore::new();
        for i in 0..12 {
            store.create(prediction(i as f64)).await.unwrap();
        }

        let recent = store.recent(RECENT_PREDICTIONS_LIMIT).await.unwrap();
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].temperature, 11.0);
        assert_eq!(recent[9].temperature, 2.0);
        assert_eq!(store.len().await, 12);
    }

    #[tokio::test]
    async fn test_create_rejects_mismatched_curve() {
        let store = InMemoryPredictionStore::new();
        let mut bad = prediction(60.0);
        bad.powers.pop();

        let err = store.create(bad).await.unwrap_err();
        assert!(matches!(err, FuelCellError::InvalidInput(_)));
        assert!(store.is_empty().await);
    }
}
