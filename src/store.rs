//! Local persisted state: named entries stored as JSON text files.
//!
//! Every save rewrites the whole entry through a temporary file followed by a
//! rename, so a reader never sees a half-written entry.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs::{self, create_dir_all, File};
use tokio::io::AsyncWriteExt;

pub const ATTENDANCE_KEY: &str = "attendance";
pub const SESSIONS_KEY: &str = "sessions";
pub const ACCOUNTS_KEY: &str = "accounts";

#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    pub async fn open<P: Into<PathBuf>>(root: P) -> anyhow::Result<Self> {
        let root = root.into();
        create_dir_all(&root)
            .await
            .with_context(|| format!("creating data directory {}", root.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }

    /// Reads an entry, or the type's default when it was never written.
    pub async fn load<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let path = self.path(key);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(T::default()),
            Err(err) => {
                return Err(err).with_context(|| format!("reading {}", path.display()));
            }
        };
        serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", path.display()))
    }

    pub async fn save<T>(&self, key: &str, value: &T) -> anyhow::Result<()>
    where
        T: Serialize,
    {
        let path = self.path(key);
        let tmp = self.root.join(format!(".{}.json.tmp", key));
        let bytes = serde_json::to_vec_pretty(value)?;

        let mut file = File::create(&tmp)
            .await
            .with_context(|| format!("creating {}", tmp.display()))?;
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("replacing {}", path.display()))?;
        log::debug!("Saved `{}` ({} bytes)", key, bytes.len());
        Ok(())
    }
}
