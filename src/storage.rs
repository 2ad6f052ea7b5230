use crate::errors::AppError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::{env, path::Path, path::PathBuf};
use tokio::fs;
use tracing::error;

pub const CONFIGURATION_KEY: &str = "saved-configuration";
pub const PAYED_DAYS_KEY: &str = "payed-days";
pub const DAY_OF_LAST_PAYMENT_KEY: &str = "day-of-last-payment";

/// Untyped key-value access to persisted state.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<&Value>;
    fn set(&mut self, key: &str, value: Value);
    fn remove(&mut self, key: &str);
}

/// Everything persisted, as one JSON object keyed by storage key.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(transparent)]
pub struct StoredData {
    pub entries: BTreeMap<String, Value>,
}

impl KeyValueStore for StoredData {
    fn get(&self, key: &str) -> Option<&Value> {
        // A stored `null` reads the same as a missing key.
        self.entries.get(key).filter(|value| !value.is_null())
    }

    fn set(&mut self, key: &str, value: Value) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

pub fn resolve_data_path() -> Result<PathBuf, std::io::Error> {
    if let Ok(path) = env::var("APP_DATA_PATH") {
        return Ok(PathBuf::from(path));
    }

    Ok(PathBuf::from("data/state.json"))
}

pub async fn load_data(path: &Path) -> StoredData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(err) => {
                error!("failed to parse data file: {err}");
                StoredData::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => StoredData::default(),
        Err(err) => {
            error!("failed to read data file: {err}");
            StoredData::default()
        }
    }
}

pub async fn persist_data(path: &Path, data: &StoredData) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(data).map_err(AppError::internal)?;
    fs::write(path, payload).await.map_err(AppError::internal)?;
    Ok(())
}
