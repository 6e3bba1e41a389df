use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::Config;
use crate::errors::{GurlzError, Result};
use crate::request_store::RequestStore;

pub const STORAGE_DIR_NAME: &str = ".gurlz";
pub const REQUESTS_FILE: &str = "requests.yaml";
pub const CONFIG_FILE: &str = "config.yaml";

/// Owns the storage directory and moves [`RequestStore`] and [`Config`] to
/// and from their YAML documents.
///
/// Every save replaces the whole file. There is no locking: concurrent
/// invocations racing to save resolve as last writer wins.
#[derive(Debug, Clone)]
pub struct StorageManager {
    config_dir: PathBuf,
}

impl StorageManager {
    /// Storage under `$HOME/.gurlz`, created if missing.
    pub fn new() -> Result<StorageManager> {
        let home = home_dir()?;
        StorageManager::with_dir(home.join(STORAGE_DIR_NAME))
    }

    /// Storage rooted at an explicit directory, created if missing.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Result<StorageManager> {
        let config_dir = dir.into();
        create_storage_dir(&config_dir)?;
        debug!(dir = %config_dir.display(), "storage ready");
        Ok(StorageManager { config_dir })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn requests_path(&self) -> PathBuf {
        self.config_dir.join(REQUESTS_FILE)
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    /// Loads the saved requests. The first load writes an empty store so
    /// the file exists afterwards.
    pub fn load_requests(&self) -> Result<RequestStore> {
        load_or_init(&self.requests_path(), "requests", RequestStore::new)
    }

    pub fn save_requests(&self, store: &RequestStore) -> Result<()> {
        save_document(&self.requests_path(), "requests", store)
    }

    /// Loads the config, writing [`Config::default`] on first use.
    pub fn load_config(&self) -> Result<Config> {
        load_or_init(&self.config_path(), "config", Config::default)
    }

    pub fn save_config(&self, config: &Config) -> Result<()> {
        save_document(&self.config_path(), "config", config)
    }
}

fn home_dir() -> Result<PathBuf> {
    home_dir_from(|key| std::env::var_os(key))
}

/// First non-empty of `HOME` and `USERPROFILE`, as reported by `get`.
fn home_dir_from<F>(get: F) -> Result<PathBuf>
where
    F: Fn(&str) -> Option<OsString>,
{
    ["HOME", "USERPROFILE"]
        .iter()
        .filter_map(|key| get(key))
        .find(|it| !it.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| GurlzError::Environment("failed to get home directory".to_string()))
}

fn create_storage_dir(dir: &Path) -> Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }
    builder
        .create(dir)
        .map_err(|e| GurlzError::io("failed to create config directory", dir, e))
}

fn load_or_init<T, F>(path: &Path, what: &'static str, init: F) -> Result<T>
where
    T: Serialize + DeserializeOwned + Default,
    F: FnOnce() -> T,
{
    let content = match fs::read(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "no {} file yet, creating it", what);
            let value = init();
            save_document(path, what, &value)?;
            return Ok(value);
        }
        Err(e) => return Err(GurlzError::io("failed to read", path, e)),
    };

    // an empty document decodes to the empty value
    if content.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }

    let value = serde_yaml::from_slice(&content).map_err(|source| GurlzError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "loaded {}", what);
    Ok(value)
}

fn save_document<T: Serialize>(path: &Path, what: &'static str, value: &T) -> Result<()> {
    let data = serde_yaml::to_string(value).map_err(|source| GurlzError::Serialize { what, source })?;
    fs::write(path, data).map_err(|e| GurlzError::io("failed to write", path, e))?;
    debug!(path = %path.display(), "saved {}", what);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn env<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<OsString> + 'a {
        move |key: &str| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| OsString::from(*v))
        }
    }

    #[test]
    fn home_prefers_home_over_userprofile() {
        let home = home_dir_from(env(&[("HOME", "/home/me"), ("USERPROFILE", "C:\\Users\\me")])).unwrap();
        assert_eq!(home, PathBuf::from("/home/me"));
    }

    #[test]
    fn empty_home_falls_through_to_userprofile() {
        let home = home_dir_from(env(&[("HOME", ""), ("USERPROFILE", "/profiles/me")])).unwrap();
        assert_eq!(home, PathBuf::from("/profiles/me"));
    }

    #[test]
    fn no_home_is_environment_error() {
        let err = home_dir_from(env(&[])).unwrap_err();
        assert!(matches!(err, GurlzError::Environment(_)));

        let err = home_dir_from(env(&[("HOME", ""), ("USERPROFILE", "")])).unwrap_err();
        assert!(matches!(err, GurlzError::Environment(_)));
    }

    #[test]
    fn paths_are_fixed_names_under_dir() {
        let tmp = TempDir::new().unwrap();
        let storage = StorageManager::with_dir(tmp.path()).unwrap();
        assert_eq!(storage.requests_path(), tmp.path().join("requests.yaml"));
        assert_eq!(storage.config_path(), tmp.path().join("config.yaml"));
        assert!(!storage.requests_path().exists());
        assert!(!storage.config_path().exists());
    }

    #[test]
    fn creates_missing_parents() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("a").join("b").join(STORAGE_DIR_NAME);
        StorageManager::with_dir(&dir).unwrap();
        assert!(dir.is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn storage_dir_mode() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join(STORAGE_DIR_NAME);
        StorageManager::with_dir(&dir).unwrap();
        let mode = fs::metadata(&dir).unwrap().permissions().mode() & 0o777;
        // umask may only clear bits
        assert_eq!(mode & !0o755, 0);
        assert_ne!(mode & 0o700, 0);
    }

    #[test]
    fn dir_path_collision_with_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("taken");
        fs::write(&file, "x").unwrap();
        let err = StorageManager::with_dir(&file).unwrap_err();
        assert!(matches!(err, GurlzError::Io { .. }));
    }

    #[test]
    fn empty_file_loads_as_empty_store() {
        let tmp = TempDir::new().unwrap();
        let storage = StorageManager::with_dir(tmp.path()).unwrap();
        fs::write(storage.requests_path(), "\n").unwrap();
        assert!(storage.load_requests().unwrap().is_empty());
    }

    #[test]
    fn invalid_document_is_parse_error_and_file_untouched() {
        let tmp = TempDir::new().unwrap();
        let storage = StorageManager::with_dir(tmp.path()).unwrap();
        let garbage = "requests: [unterminated\n";
        fs::write(storage.requests_path(), garbage).unwrap();

        let err = storage.load_requests().unwrap_err();
        assert!(matches!(err, GurlzError::Parse { .. }));
        assert!(err.to_string().contains("requests.yaml"));
        assert_eq!(fs::read_to_string(storage.requests_path()).unwrap(), garbage);
    }

    #[test]
    fn invalid_utf8_is_parse_error_and_file_untouched() {
        let tmp = TempDir::new().unwrap();
        let storage = StorageManager::with_dir(tmp.path()).unwrap();
        let garbage: &[u8] = b"requests:\n  - name: \xff\xfe\n";
        fs::write(storage.requests_path(), garbage).unwrap();

        let err = storage.load_requests().unwrap_err();
        assert!(matches!(err, GurlzError::Parse { .. }), "got {:?}", err);
        assert_eq!(fs::read(storage.requests_path()).unwrap(), garbage);
    }
}
