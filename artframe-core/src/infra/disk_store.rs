use std::{
    fmt,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};

use async_trait::async_trait;
use tokio::{io::AsyncWriteExt, sync::OnceCell};
use tracing::{debug, info};

use super::store::{Partition, PersistentStore};
use crate::error::{AssetError, Result};

/// Root directory for the persistent store.
///
/// Each [`Partition`] gets its own directory underneath.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct StoreRoot(PathBuf);

impl StoreRoot {
    /// Root at `path`. Nothing is created until the store is first used.
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    /// The root directory.
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Directory holding `partition`.
    pub fn partition_path(&self, partition: Partition) -> PathBuf {
        self.0.join(partition.dir_name())
    }
}

impl fmt::Debug for StoreRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StoreRoot").field(&self.0).finish()
    }
}

/// On-disk [`PersistentStore`].
///
/// - `images` is a `cacache` directory (index + content-addressed blobs).
///   Image entries are written once per URL.
/// - `metadata` holds one small file per key, replaced with tmp + rename on
///   every write, so rewriting the cursor or rotation time never grows the
///   directory.
///
/// Directories are created on first use; the result of that open is kept for
/// the lifetime of the value.
#[derive(Debug)]
pub struct DiskStore {
    root: StoreRoot,
    opened: OnceCell<()>,
    tmp_seq: AtomicU64,
}

impl DiskStore {
    /// Store under `root`.
    pub fn new(root: StoreRoot) -> Self {
        Self {
            root,
            opened: OnceCell::new(),
            tmp_seq: AtomicU64::new(0),
        }
    }

    /// Where the store lives.
    pub fn root(&self) -> &StoreRoot {
        &self.root
    }

    async fn open(&self) -> Result<()> {
        self.opened
            .get_or_try_init(|| async {
                for partition in Partition::ALL {
                    let path = self.root.partition_path(partition);
                    tokio::fs::create_dir_all(&path).await.map_err(|err| {
                        AssetError::Store(format!(
                            "failed to create {partition} partition at {:?}: {err}",
                            path
                        ))
                    })?;
                }
                info!("persistent store opened at {:?}", self.root.as_path());
                Ok::<(), AssetError>(())
            })
            .await?;
        Ok(())
    }

    async fn partition_dir(&self, partition: Partition) -> Result<PathBuf> {
        self.open().await?;
        Ok(self.root.partition_path(partition))
    }

    async fn read_image(&self, dir: &Path, key: &str) -> Result<Option<Vec<u8>>> {
        match cacache::read(dir, key).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(cacache::Error::EntryNotFound(_, _)) => Ok(None),
            Err(cacache::Error::IntegrityError(err)) => {
                Err(AssetError::Store(format!(
                    "images entry failed integrity check: {key} ({err})"
                )))
            }
            Err(cacache::Error::SizeMismatch(wanted, actual)) => {
                Err(AssetError::Store(format!(
                    "images entry size mismatch: key={key}, wanted={wanted}, actual={actual}"
                )))
            }
            Err(cacache::Error::IoError(_, msg)) => Err(AssetError::Store(
                format!("cacache read I/O error: {msg}"),
            )),
            Err(cacache::Error::SerdeError(_, msg)) => Err(AssetError::Store(
                format!("cacache read serde error: {msg}"),
            )),
        }
    }

    async fn write_image(&self, dir: &Path, key: &str, value: &[u8]) -> Result<()> {
        let integrity =
            cacache::write(dir, key, value).await.map_err(|e| {
                AssetError::Store(format!("cacache write failed: {e}"))
            })?;
        debug!(
            "store write: partition=images, key={}, bytes={}, integrity={}",
            key,
            value.len(),
            integrity
        );
        Ok(())
    }

    async fn read_metadata(
        &self,
        dir: &Path,
        key: &str,
    ) -> Result<Option<Vec<u8>>> {
        let path = dir.join(metadata_file_name(key));
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(AssetError::Store(format!(
                "failed to read metadata {:?}: {err}",
                path
            ))),
        }
    }

    /// Tmp + rename: a reader sees the old value or the new one, never a
    /// partial write.
    async fn write_metadata(
        &self,
        dir: &Path,
        key: &str,
        value: &[u8],
    ) -> Result<()> {
        let name = metadata_file_name(key);
        let path = dir.join(&name);
        let seq = self.tmp_seq.fetch_add(1, Ordering::Relaxed);
        let tmp = dir.join(format!(".{name}.tmp-{}-{seq}", std::process::id()));

        let written = async {
            let mut file = tokio::fs::File::create(&tmp).await?;
            file.write_all(value).await?;
            file.flush().await?;
            drop(file);
            tokio::fs::rename(&tmp, &path).await
        }
        .await;

        if let Err(err) = written {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(AssetError::Store(format!(
                "failed to write metadata {:?}: {err}",
                path
            )));
        }

        debug!(
            "store write: partition=metadata, key={}, bytes={}",
            key,
            value.len()
        );
        Ok(())
    }
}

#[async_trait]
impl PersistentStore for DiskStore {
    async fn read(
        &self,
        partition: Partition,
        key: &str,
    ) -> Result<Option<Vec<u8>>> {
        let dir = self.partition_dir(partition).await?;
        match partition {
            Partition::Images => self.read_image(&dir, key).await,
            Partition::Metadata => self.read_metadata(&dir, key).await,
        }
    }

    async fn write(
        &self,
        partition: Partition,
        key: &str,
        value: &[u8],
    ) -> Result<()> {
        let dir = self.partition_dir(partition).await?;
        match partition {
            Partition::Images => self.write_image(&dir, key, value).await,
            Partition::Metadata => self.write_metadata(&dir, key, value).await,
        }
    }

    async fn clear(&self, partition: Partition) -> Result<()> {
        let dir = self.partition_dir(partition).await?;
        match partition {
            Partition::Images => cacache::clear(&dir).await.map_err(|e| {
                AssetError::Store(format!("cacache clear failed: {e}"))
            })?,
            Partition::Metadata => {
                tokio::fs::remove_dir_all(&dir).await.map_err(|err| {
                    AssetError::Store(format!(
                        "failed to clear metadata at {:?}: {err}",
                        dir
                    ))
                })?;
                tokio::fs::create_dir_all(&dir).await.map_err(|err| {
                    AssetError::Store(format!(
                        "failed to recreate metadata at {:?}: {err}",
                        dir
                    ))
                })?;
            }
        }
        info!("cleared {} partition", partition);
        Ok(())
    }
}

/// File name for a metadata key. Bytes outside `[A-Za-z0-9_-]` are written
/// as `%XX`, so any key maps to exactly one plain file name.
fn metadata_file_name(key: &str) -> String {
    let mut name = String::with_capacity(key.len());
    for byte in key.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' => {
                name.push(char::from(byte))
            }
            other => name.push_str(&format!("%{other:02X}")),
        }
    }
    if name.is_empty() {
        name.push('%');
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn file_count(dir: &Path) -> usize {
        std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
    }

    #[tokio::test]
    async fn partitions_are_isolated() {
        let dir = tempdir().unwrap();
        let store = DiskStore::new(StoreRoot::new(dir.path().join("cache")));

        store
            .write(Partition::Images, "k", b"image-bytes")
            .await
            .unwrap();
        store.write(Partition::Metadata, "k", b"{}").await.unwrap();

        assert_eq!(
            store.read(Partition::Images, "k").await.unwrap().as_deref(),
            Some(&b"image-bytes"[..])
        );
        assert_eq!(
            store.read(Partition::Metadata, "k").await.unwrap().as_deref(),
            Some(&b"{}"[..])
        );
        assert!(dir.path().join("cache/images").is_dir());
        assert!(dir.path().join("cache/metadata").is_dir());
    }

    #[tokio::test]
    async fn missing_keys_read_as_absent() {
        let dir = tempdir().unwrap();
        let store = DiskStore::new(StoreRoot::new(dir.path().to_path_buf()));
        assert_eq!(store.read(Partition::Metadata, "nope").await.unwrap(), None);
        assert_eq!(store.read(Partition::Images, "nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn clear_only_touches_one_partition() {
        let dir = tempdir().unwrap();
        let store = DiskStore::new(StoreRoot::new(dir.path().to_path_buf()));
        store.write(Partition::Images, "a", b"1").await.unwrap();
        store.write(Partition::Metadata, "b", b"2").await.unwrap();

        store.clear(Partition::Images).await.unwrap();

        assert_eq!(store.read(Partition::Images, "a").await.unwrap(), None);
        assert!(store.read(Partition::Metadata, "b").await.unwrap().is_some());

        store.clear(Partition::Metadata).await.unwrap();
        assert_eq!(store.read(Partition::Metadata, "b").await.unwrap(), None);

        // Still writable after a clear.
        store.write(Partition::Images, "a", b"3").await.unwrap();
        store.write(Partition::Metadata, "b", b"4").await.unwrap();
        assert!(store.read(Partition::Images, "a").await.unwrap().is_some());
        assert!(store.read(Partition::Metadata, "b").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn overwrites_return_latest_value() {
        let dir = tempdir().unwrap();
        let store = DiskStore::new(StoreRoot::new(dir.path().to_path_buf()));
        store.write(Partition::Metadata, "idx", b"1").await.unwrap();
        store.write(Partition::Metadata, "idx", b"2").await.unwrap();
        assert_eq!(
            store.read(Partition::Metadata, "idx").await.unwrap().as_deref(),
            Some(&b"2"[..])
        );
    }

    #[tokio::test]
    async fn repeated_metadata_overwrites_keep_disk_usage_flat() {
        let dir = tempdir().unwrap();
        let store = DiskStore::new(StoreRoot::new(dir.path().to_path_buf()));

        for i in 0..500 {
            store
                .write(Partition::Metadata, "current_image_index", i.to_string().as_bytes())
                .await
                .unwrap();
            store
                .write(
                    Partition::Metadata,
                    "last_update_time",
                    (1_704_067_200_000_i64 + i).to_string().as_bytes(),
                )
                .await
                .unwrap();
        }

        let metadata = dir.path().join("metadata");
        assert_eq!(file_count(&metadata), 2);
        assert_eq!(
            store
                .read(Partition::Metadata, "current_image_index")
                .await
                .unwrap()
                .as_deref(),
            Some(&b"499"[..])
        );
    }

    #[test]
    fn metadata_keys_map_to_plain_file_names() {
        assert_eq!(metadata_file_name("asset_list"), "asset_list");
        assert_eq!(metadata_file_name("../etc/passwd"), "%2E%2E%2Fetc%2Fpasswd");
        assert_eq!(metadata_file_name(""), "%");
    }
}
