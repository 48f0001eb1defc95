//! On-disk configuration cache: one flat JSON file per (host, solution)

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::remote::HostIdentity;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("No configuration file at {}", path.display())]
    Missing { path: PathBuf },

    #[error("Configuration cache I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration file {} is not valid JSON: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Directory of exported configuration files
///
/// File names follow `<host token>_<solution id>.json`; the content is a
/// flat JSON object holding configuration keys only.
#[derive(Debug, Clone)]
pub struct ConfigurationCache {
    root: PathBuf,
}

impl ConfigurationCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the cache file for one host and solution
    pub fn file_path(&self, host: &HostIdentity, solution_id: &str) -> PathBuf {
        self.root
            .join(format!("{}_{}.json", host.cache_token(), solution_id))
    }

    pub fn exists(&self, host: &HostIdentity, solution_id: &str) -> bool {
        self.file_path(host, solution_id).is_file()
    }

    /// Load the exported configuration map for one host and solution
    pub fn load(
        &self,
        host: &HostIdentity,
        solution_id: &str,
    ) -> Result<BTreeMap<String, serde_json::Value>, CacheError> {
        let path = self.file_path(host, solution_id);
        if !path.is_file() {
            return Err(CacheError::Missing { path });
        }
        let content = fs::read_to_string(&path)?;
        serde_json::from_str(&content).map_err(|source| CacheError::Malformed { path, source })
    }

    /// Write the exported configuration map, creating the root as needed
    pub fn store(
        &self,
        host: &HostIdentity,
        solution_id: &str,
        values: &BTreeMap<String, serde_json::Value>,
    ) -> Result<(), CacheError> {
        fs::create_dir_all(&self.root)?;
        let path = self.file_path(host, solution_id);
        let content = serde_json::to_string_pretty(values)
            .map_err(|source| CacheError::Malformed {
                path: path.clone(),
                source,
            })?;
        fs::write(&path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn host() -> HostIdentity {
        HostIdentity::new("admin@10.0.0.7:22")
    }

    #[test]
    fn test_file_naming_uses_sanitized_host_token() {
        let cache = ConfigurationCache::new("/var/lib/sls");
        let path = cache.file_path(&host(), "guard");
        assert_eq!(
            path,
            PathBuf::from("/var/lib/sls/admin@10.0.0.7-22_guard.json")
        );
    }

    #[test]
    fn test_store_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ConfigurationCache::new(dir.path());

        let mut values = BTreeMap::new();
        values.insert("port".to_string(), serde_json::json!(8080));
        values.insert("mode".to_string(), serde_json::json!("alert"));

        cache.store(&host(), "guard", &values).unwrap();
        assert!(cache.exists(&host(), "guard"));
        assert_eq!(cache.load(&host(), "guard").unwrap(), values);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ConfigurationCache::new(dir.path());
        assert_matches!(cache.load(&host(), "guard"), Err(CacheError::Missing { .. }));
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ConfigurationCache::new(dir.path());
        let path = cache.file_path(&host(), "guard");
        std::fs::write(&path, "not json at all").unwrap();

        assert_matches!(
            cache.load(&host(), "guard"),
            Err(CacheError::Malformed { .. })
        );
    }

    #[test]
    fn test_hosts_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ConfigurationCache::new(dir.path());
        let other = HostIdentity::new("admin@10.0.0.8:22");

        let mut first = BTreeMap::new();
        first.insert("port".to_string(), serde_json::json!(1));
        let mut second = BTreeMap::new();
        second.insert("port".to_string(), serde_json::json!(2));

        cache.store(&host(), "guard", &first).unwrap();
        cache.store(&other, "guard", &second).unwrap();

        assert_eq!(cache.load(&host(), "guard").unwrap(), first);
        assert_eq!(cache.load(&other, "guard").unwrap(), second);
    }
}
