use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use log::debug;

use crate::model::{Package, Subscriber};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid records in {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
}

/// In-memory subscriber records and the package catalog.
///
/// Record mutation is serialised behind a mutex; changes are never written
/// back to disk.
#[derive(Debug, Default)]
pub struct SubscriberStore {
    subscribers: Mutex<Vec<Subscriber>>,
    packages: Vec<Package>,
}

impl SubscriberStore {
    pub fn new(subscribers: Vec<Subscriber>, packages: Vec<Package>) -> Self {
        Self {
            subscribers: Mutex::new(subscribers),
            packages,
        }
    }

    pub fn from_json_files<P, Q>(users: P, packages: Q) -> Result<Self, StoreError>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let subscribers: Vec<Subscriber> = read_records(users.as_ref())?;
        let packages: Vec<Package> = read_records(packages.as_ref())?;
        debug!(
            "Loaded {} subscribers and {} packages",
            subscribers.len(),
            packages.len()
        );
        Ok(Self::new(subscribers, packages))
    }

    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    /// Copy of the first subscriber matching `identifier`.
    pub fn find(&self, identifier: &str) -> Option<Subscriber> {
        self.lock().iter().find(|s| s.matches(identifier)).cloned()
    }

    /// Run `f` on the matching subscriber while holding the store lock.
    pub fn update<R>(&self, identifier: &str, f: impl FnOnce(&mut Subscriber) -> R) -> Option<R> {
        self.lock()
            .iter_mut()
            .find(|s| s.matches(identifier))
            .map(f)
    }

    /// Run `f` over every record under one lock, for changes that span
    /// several subscribers.
    pub fn with_records<R>(&self, f: impl FnOnce(&mut [Subscriber]) -> R) -> R {
        let mut records = self.lock();
        f(records.as_mut_slice())
    }

    pub fn snapshot(&self) -> Vec<Subscriber> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Subscriber>> {
        // records stay readable after a panicking caller
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn read_records<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    let display = path.display().to_string();
    let raw = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: display.clone(),
        source,
    })?;
    let content = raw.strip_prefix('\u{feff}').unwrap_or(&raw);
    serde_json::from_str(content).map_err(|source| StoreError::Json {
        path: display,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn store() -> SubscriberStore {
        let subscribers = serde_json::from_value(json!([
            {"tc_no": "111", "name": "Ali", "phone_number": "0532 000 00 01"},
            {"tc_no": "222", "name": "Veli"}
        ]))
        .unwrap();
        SubscriberStore::new(subscribers, vec![])
    }

    #[test]
    fn test_find_and_update() {
        let store = store();
        assert_eq!(store.find("05320000001").unwrap().name, "Ali");
        assert!(store.find("999").is_none());

        let updated = store.update("222", |s| {
            s.esim_active = true;
            s.name.clone()
        });
        assert_eq!(updated.as_deref(), Some("Veli"));
        assert!(store.find("222").unwrap().esim_active);
        assert_eq!(store.update("999", |_| ()), None);
    }

    #[test]
    fn test_with_records_spans_subscribers() {
        let store = store();
        let names = store.with_records(|records| {
            for record in records.iter_mut() {
                record.esim_active = true;
            }
            records.iter().map(|r| r.name.clone()).collect::<Vec<_>>()
        });
        assert_eq!(names, vec!["Ali", "Veli"]);
        assert!(store.snapshot().iter().all(|s| s.esim_active));
    }

    #[test]
    fn test_from_json_files() -> std::io::Result<()> {
        let mut users = tempfile::NamedTempFile::new()?;
        users.write_all("\u{feff}[{\"tc_no\": \"1\", \"name\": \"Zeynep\"}]".as_bytes())?;
        let mut packages = tempfile::NamedTempFile::new()?;
        packages.write_all(br#"[{"name": "Mega 20GB", "allowed_groups": ["genel", "ogrenci"]}]"#)?;

        let store = SubscriberStore::from_json_files(users.path(), packages.path()).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.packages()[0].name, "Mega 20GB");
        Ok(())
    }

    #[test]
    fn test_bad_files() {
        let err = SubscriberStore::from_json_files("/missing/users.json", "/missing/p.json")
            .unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));

        let mut users = tempfile::NamedTempFile::new().unwrap();
        users.write_all(b"{not json").unwrap();
        let err = SubscriberStore::from_json_files(users.path(), users.path()).unwrap_err();
        assert!(matches!(err, StoreError::Json { .. }));
    }
}
