//! Object store writing artifacts beneath a `cap-std` directory handle.
//!
//! Each object is a plain file at its key path with a JSON sidecar at
//! `{key}.meta.json` holding tags and metadata. The directory handle confines
//! every operation to the root, so keys cannot escape it.

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs::OpenOptions;
use cap_std::fs_utf8::Dir;
use chrono::{DateTime, Utc};
use mockable::{Clock, DefaultClock};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{ErrorKind, Write};
use std::sync::Arc;

use crate::agent::{
    domain::ObjectKey,
    ports::{ObjectEntry, ObjectStore, ObjectStoreResult, PutObject, StorageError},
};

const SIDECAR_SUFFIX: &str = ".meta.json";
const FIRST_VERSION: u32 = 2;

#[derive(Debug, Serialize, Deserialize)]
struct Sidecar {
    size: u64,
    content_type: String,
    tags: BTreeMap<String, String>,
    metadata: BTreeMap<String, String>,
    stored_at: DateTime<Utc>,
}

impl Sidecar {
    fn into_entry(self, key: ObjectKey) -> ObjectEntry {
        ObjectEntry {
            key,
            size: self.size,
            content_type: self.content_type,
            tags: self.tags,
            metadata: self.metadata,
            stored_at: self.stored_at,
        }
    }
}

/// Filesystem-backed object store.
#[derive(Clone)]
pub struct FsObjectStore {
    root: Arc<Dir>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl std::fmt::Debug for FsObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsObjectStore").finish_non_exhaustive()
    }
}

impl FsObjectStore {
    /// Creates a store rooted at an open directory handle.
    #[must_use]
    pub fn new(root: Dir) -> Self {
        Self::with_clock(root, Arc::new(DefaultClock))
    }

    /// Creates a store stamping writes with `clock`.
    #[must_use]
    pub fn with_clock(root: Dir, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self {
            root: Arc::new(root),
            clock,
        }
    }

    /// Opens (creating if needed) the directory at `path` as the store root.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Persistence`] when the directory cannot be
    /// created or opened.
    pub fn open_ambient(path: &Utf8Path) -> ObjectStoreResult<Self> {
        std::fs::create_dir_all(path).map_err(StorageError::persistence)?;
        let root =
            Dir::open_ambient_dir(path, ambient_authority()).map_err(StorageError::persistence)?;
        Ok(Self::new(root))
    }

    async fn run_blocking<F, T>(&self, f: F) -> ObjectStoreResult<T>
    where
        F: FnOnce(&Dir) -> ObjectStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let root = Arc::clone(&self.root);
        tokio::task::spawn_blocking(move || f(&root))
            .await
            .map_err(StorageError::persistence)?
    }
}

fn sidecar_path(key: &ObjectKey) -> String {
    format!("{key}{SIDECAR_SUFFIX}")
}

fn map_io(key: &ObjectKey, err: std::io::Error) -> StorageError {
    if err.kind() == ErrorKind::NotFound {
        StorageError::NotFound(key.clone())
    } else {
        StorageError::persistence(err)
    }
}

/// Creates the object file at the first free key and writes `bytes`.
fn create_versioned(
    root: &Dir,
    requested: &ObjectKey,
    bytes: &[u8],
) -> ObjectStoreResult<ObjectKey> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    let mut candidate = requested.clone();
    let mut version = FIRST_VERSION;
    loop {
        match root.open_with(candidate.as_str(), &options) {
            Ok(mut file) => {
                file.write_all(bytes).map_err(StorageError::persistence)?;
                file.sync_all().map_err(StorageError::persistence)?;
                return Ok(candidate);
            }
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                candidate = requested.versioned(version);
                version = version.saturating_add(1);
            }
            Err(err) => return Err(StorageError::persistence(err)),
        }
    }
}

fn read_sidecar(root: &Dir, key: &ObjectKey) -> ObjectStoreResult<Option<ObjectEntry>> {
    match root.read_to_string(sidecar_path(key)) {
        Ok(text) => {
            let sidecar: Sidecar =
                serde_json::from_str(&text).map_err(StorageError::persistence)?;
            Ok(Some(sidecar.into_entry(key.clone())))
        }
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(StorageError::persistence(err)),
    }
}

/// Collects object keys beneath `directory` by walking sidecar files.
fn collect_keys(
    root: &Dir,
    directory: &Utf8Path,
    keys: &mut Vec<ObjectKey>,
) -> ObjectStoreResult<()> {
    let listing = if directory.as_str().is_empty() {
        root.entries()
    } else {
        root.read_dir(directory)
    }
    .map_err(StorageError::persistence)?;
    for item in listing {
        let entry = item.map_err(StorageError::persistence)?;
        let name = entry.file_name().map_err(StorageError::persistence)?;
        let path: Utf8PathBuf = directory.join(&name);
        if entry.file_type().map_err(StorageError::persistence)?.is_dir() {
            collect_keys(root, &path, keys)?;
        } else if let Some(object_path) = path.as_str().strip_suffix(SIDECAR_SUFFIX)
            && let Some(key) = ObjectKey::parse(object_path)
        {
            keys.push(key);
        }
    }
    Ok(())
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn put(&self, object: PutObject) -> ObjectStoreResult<ObjectKey> {
        if object.key.as_str().ends_with(SIDECAR_SUFFIX) {
            return Err(StorageError::InvalidKey(object.key.to_string()));
        }
        let stored_at = self.clock.utc();
        self.run_blocking(move |root| {
            if let Some(parent) = Utf8Path::new(object.key.as_str()).parent()
                && !parent.as_str().is_empty()
            {
                root.create_dir_all(parent).map_err(StorageError::persistence)?;
            }
            let key = create_versioned(root, &object.key, &object.bytes)?;
            let sidecar = Sidecar {
                size: u64::try_from(object.bytes.len()).unwrap_or(u64::MAX),
                content_type: object.content_type,
                tags: object.tags,
                metadata: object.metadata,
                stored_at,
            };
            let encoded = serde_json::to_vec(&sidecar).map_err(StorageError::persistence)?;
            root.write(sidecar_path(&key), encoded)
                .map_err(StorageError::persistence)?;
            Ok(key)
        })
        .await
    }

    async fn get(&self, key: &ObjectKey) -> ObjectStoreResult<Vec<u8>> {
        let lookup = key.clone();
        self.run_blocking(move |root| {
            root.read(lookup.as_str())
                .map_err(|err| map_io(&lookup, err))
        })
        .await
    }

    async fn head(&self, key: &ObjectKey) -> ObjectStoreResult<Option<ObjectEntry>> {
        let lookup = key.clone();
        self.run_blocking(move |root| read_sidecar(root, &lookup)).await
    }

    async fn list(&self, prefix: &str) -> ObjectStoreResult<Vec<ObjectEntry>> {
        let wanted = prefix.to_owned();
        self.run_blocking(move |root| {
            let mut keys = Vec::new();
            collect_keys(root, Utf8Path::new(""), &mut keys)?;
            keys.retain(|key| key.has_prefix(&wanted));
            keys.sort();
            let mut entries = Vec::with_capacity(keys.len());
            for key in keys {
                if let Some(entry) = read_sidecar(root, &key)? {
                    entries.push(entry);
                }
            }
            Ok(entries)
        })
        .await
    }
}
