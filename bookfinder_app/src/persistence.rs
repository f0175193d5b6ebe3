use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;

use bookfinder_recommendations::api::{BookResult, SearchCriteria};

use crate::error::AppError;

pub const BOOK_RECOMMENDATIONS_KEY: &str = "bookRecommendations";
pub const BOOK_SEARCH_FORM_KEY: &str = "bookSearchForm";
pub const SHOW_FILTERS_KEY: &str = "showFilters";
pub const AUTH_TOKEN_KEY: &str = "authToken";

/// String key value storage surviving between sessions
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String) -> anyhow::Result<()>;
    fn remove(&self, key: &str) -> anyhow::Result<()>;
}

#[derive(Default)]
pub struct InMemoryKeyValueStore {
    values: parking_lot::RwLock<HashMap<String, String>>,
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: String) -> anyhow::Result<()> {
        self.values.write().insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.values.write().remove(key);
        Ok(())
    }
}

/// Keeps all values in one JSON object written back to disk on every change
pub struct JsonFileKeyValueStore {
    path: PathBuf,
    values: parking_lot::RwLock<BTreeMap<String, String>>,
}

impl JsonFileKeyValueStore {
    /// Opens the store, a missing or unreadable file starts empty
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let values = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|err| {
                tracing::warn!("Ignoring corrupt storage file {}: {}", path.display(), err);
                BTreeMap::default()
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::default(),
            Err(err) => {
                tracing::warn!("Failed to read storage file {}: {}", path.display(), err);
                BTreeMap::default()
            }
        };
        Self {
            path,
            values: parking_lot::RwLock::new(values),
        }
    }

    fn flush(&self, values: &BTreeMap<String, String>) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).context("Failed to create storage directory")?;
        }
        let content = serde_json::to_string_pretty(values)?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}

impl KeyValueStore for JsonFileKeyValueStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: String) -> anyhow::Result<()> {
        let mut values = self.values.write();
        values.insert(key.to_string(), value);
        self.flush(&values)
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        let mut values = self.values.write();
        if values.remove(key).is_some() {
            self.flush(&values)?;
        }
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(key: &str, raw: &str) -> Result<T, AppError> {
    serde_json::from_str(raw).map_err(|source| AppError::Decode {
        key: key.to_string(),
        source,
    })
}

/// Typed access to the values the application persists.
/// Reads never fail: missing or corrupt values are reported as absent.
#[derive(Clone)]
pub struct PersistenceBridge {
    store: Arc<dyn KeyValueStore>,
}

impl PersistenceBridge {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.store.get(key)?;
        match decode(key, &raw) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!("{}", err);
                None
            }
        }
    }

    /// Persists a value, failures are logged and otherwise ignored
    pub fn save<T: Serialize>(&self, key: &str, value: &T) {
        let result = serde_json::to_string(value)
            .context("Failed to encode value")
            .and_then(|raw| self.store.set(key, raw));
        if let Err(err) = result {
            tracing::warn!("Failed to persist {}: {:#}", key, err);
        }
    }

    pub fn remove(&self, key: &str) {
        if let Err(err) = self.store.remove(key) {
            tracing::warn!("Failed to remove {}: {:#}", key, err);
        }
    }

    pub fn load_results(&self) -> Vec<BookResult> {
        self.load(BOOK_RECOMMENDATIONS_KEY).unwrap_or_default()
    }

    pub fn save_results(&self, books: &[BookResult]) {
        self.save(BOOK_RECOMMENDATIONS_KEY, &books)
    }

    pub fn load_search_form(&self) -> Option<SearchCriteria> {
        self.load(BOOK_SEARCH_FORM_KEY)
    }

    pub fn save_search_form(&self, criteria: &SearchCriteria) {
        self.save(BOOK_SEARCH_FORM_KEY, criteria)
    }

    pub fn load_show_filters(&self) -> bool {
        self.load(SHOW_FILTERS_KEY).unwrap_or_default()
    }

    pub fn save_show_filters(&self, show_filters: bool) {
        self.save(SHOW_FILTERS_KEY, &show_filters)
    }

    /// Raw bearer token stored by the authentication flow
    pub fn auth_token(&self) -> Option<String> {
        self.store
            .get(AUTH_TOKEN_KEY)
            .filter(|token| !token.trim().is_empty())
    }

    /// Forgets the last search, results and filter panel state
    pub fn clear_search_state(&self) {
        for key in [BOOK_RECOMMENDATIONS_KEY, BOOK_SEARCH_FORM_KEY, SHOW_FILTERS_KEY] {
            self.remove(key);
        }
    }
}

#[cfg(test)]
mod persistence_tests {
    use bookfinder_recommendations::api::FilterField;
    use bookfinder_recommendations::size_range::SizeRange;

    use super::*;

    fn bridge() -> (Arc<InMemoryKeyValueStore>, PersistenceBridge) {
        let store = Arc::new(InMemoryKeyValueStore::default());
        (store.clone(), PersistenceBridge::new(store))
    }

    #[test]
    fn test_missing_values_degrade_to_defaults() {
        let (_, persistence) = bridge();
        assert!(persistence.load_results().is_empty());
        assert_eq!(persistence.load_search_form(), None);
        assert!(!persistence.load_show_filters());
        assert_eq!(persistence.auth_token(), None);
    }

    #[test]
    fn test_corrupt_values_degrade_to_defaults() {
        let (store, persistence) = bridge();
        store.set(BOOK_RECOMMENDATIONS_KEY, "[{\"title\":".to_string()).unwrap();
        store.set(BOOK_SEARCH_FORM_KEY, "42".to_string()).unwrap();
        store.set(SHOW_FILTERS_KEY, "yes".to_string()).unwrap();

        assert!(persistence.load_results().is_empty());
        assert_eq!(persistence.load_search_form(), None);
        assert!(!persistence.load_show_filters());
    }

    #[test]
    fn test_search_state_is_saved_and_cleared() {
        let (store, persistence) = bridge();
        let mut criteria = SearchCriteria::new("mystery");
        criteria.range = SizeRange::From20To30;
        criteria.filters.set(FilterField::Language, Some("English"));

        persistence.save_search_form(&criteria);
        persistence.save_results(&[BookResult::new("Gaudy Night", "Dorothy L. Sayers")]);
        persistence.save_show_filters(true);
        store.set(AUTH_TOKEN_KEY, "token".to_string()).unwrap();
        store.set("theme", "\"dark\"".to_string()).unwrap();

        assert_eq!(persistence.load_search_form(), Some(criteria));
        assert_eq!(persistence.load_results().len(), 1);
        assert!(persistence.load_show_filters());

        persistence.clear_search_state();
        assert_eq!(persistence.load_search_form(), None);
        assert!(persistence.load_results().is_empty());
        assert!(!persistence.load_show_filters());
        assert_eq!(persistence.auth_token().as_deref(), Some("token"));
        assert_eq!(store.get("theme").as_deref(), Some("\"dark\""));
    }

    #[test]
    fn test_json_file_store_survives_reopen_and_corruption() {
        let path = std::env::temp_dir().join(format!(
            "bookfinder_store_{}/storage.json",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);

        let store = JsonFileKeyValueStore::open(&path);
        assert_eq!(store.get(SHOW_FILTERS_KEY), None);
        store.set(SHOW_FILTERS_KEY, "true".to_string()).unwrap();
        store.set(BOOK_SEARCH_FORM_KEY, "{}".to_string()).unwrap();
        store.remove(BOOK_SEARCH_FORM_KEY).unwrap();

        let reopened = JsonFileKeyValueStore::open(&path);
        assert_eq!(reopened.get(SHOW_FILTERS_KEY).as_deref(), Some("true"));
        assert_eq!(reopened.get(BOOK_SEARCH_FORM_KEY), None);

        std::fs::write(&path, "not json").unwrap();
        let corrupt = JsonFileKeyValueStore::open(&path);
        assert_eq!(corrupt.get(SHOW_FILTERS_KEY), None);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
