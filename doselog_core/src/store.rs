//! The entry store: a single CSV backing file plus an owned cached snapshot.
//!
//! Every mutation is write-through. The new collection is written to a temp
//! file in the same directory, synced, and renamed over the backing file;
//! only then does it replace the cached snapshot. A failed write leaves both
//! the file and the snapshot at their previous state.
//!
//! There is no locking. If two processes write the same file, the last rename
//! wins.

use crate::codec::{self, LoadReport};
use crate::validation::Limits;
use crate::{Entry, EntryChanges, EntryCollection, Error, Result, Selector};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tempfile::NamedTempFile;

/// Identifies one on-disk state of the backing file
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Fingerprint {
    len: u64,
    modified: Option<SystemTime>,
}

impl Fingerprint {
    /// `None` when the file does not exist
    fn of(path: &Path) -> Result<Option<Self>> {
        match std::fs::metadata(path) {
            Ok(meta) => Ok(Some(Self {
                len: meta.len(),
                modified: meta.modified().ok(),
            })),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug)]
struct Snapshot {
    collection: EntryCollection,
    fingerprint: Option<Fingerprint>,
}

/// Owns the backing file and the cached collection read from it
#[derive(Debug)]
pub struct EntryStore {
    path: PathBuf,
    limits: Limits,
    cache: Option<Snapshot>,
    version: u64,
}

impl EntryStore {
    /// Create a store for `path` with default limits. Nothing is read yet.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::with_limits(path, Limits::default())
    }

    pub fn with_limits(path: impl Into<PathBuf>, limits: Limits) -> Self {
        Self {
            path: path.into(),
            limits,
            cache: None,
            version: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Incremented every time the cached snapshot is replaced
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Drop the cached snapshot so the next `load` reads the file
    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    /// Return the current collection.
    ///
    /// Served from the cached snapshot unless there is none or the backing
    /// file changed since it was taken. An absent file is an empty
    /// collection. A malformed row fails the whole load with `Error::Parse`.
    pub fn load(&mut self) -> Result<EntryCollection> {
        let fingerprint = Fingerprint::of(&self.path)?;

        if let Some(snapshot) = &self.cache {
            if snapshot.fingerprint == fingerprint {
                tracing::debug!("Serving {} entries from cache", snapshot.collection.len());
                return Ok(snapshot.collection.clone());
            }
            tracing::info!("{:?} changed on disk, reloading", self.path);
        }

        let collection = match fingerprint {
            Some(_) => {
                let file = File::open(&self.path)?;
                codec::read_collection(BufReader::new(file))?
            }
            None => {
                tracing::info!("No data file at {:?}, starting empty", self.path);
                EntryCollection::new()
            }
        };

        tracing::info!("Loaded {} entries from {:?}", collection.len(), self.path);
        self.replace_snapshot(collection.clone(), fingerprint);
        Ok(collection)
    }

    /// Read the file, skipping malformed rows instead of failing.
    ///
    /// A clean read becomes the cached snapshot. If any row was skipped the
    /// cache is dropped instead, so the next write goes through a strict
    /// `load` and fails rather than saving over the skipped rows.
    pub fn load_lenient(&mut self) -> Result<LoadReport> {
        let fingerprint = Fingerprint::of(&self.path)?;

        let report = match fingerprint {
            Some(_) => {
                let file = File::open(&self.path)?;
                codec::read_collection_lenient(BufReader::new(file))?
            }
            None => LoadReport {
                collection: EntryCollection::new(),
                skipped: Vec::new(),
            },
        };

        if report.skipped.is_empty() {
            self.replace_snapshot(report.collection.clone(), fingerprint);
        } else {
            tracing::warn!(
                "Skipped {} malformed rows in {:?}",
                report.skipped.len(),
                self.path
            );
            self.invalidate();
        }
        Ok(report)
    }

    /// Overwrite the backing file with `collection` and make it the snapshot
    pub fn save(&mut self, collection: &EntryCollection) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        // Temp file in the same directory so the rename stays on one filesystem
        let temp = NamedTempFile::new_in(&dir)?;
        {
            let mut writer = codec::write_collection(collection, BufWriter::new(temp.as_file()))?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        let fingerprint = Fingerprint::of(&self.path)?;
        self.replace_snapshot(collection.clone(), fingerprint);

        tracing::info!("Saved {} entries to {:?}", collection.len(), self.path);
        Ok(())
    }

    /// Validate and append `entry`, then persist. Returns the new collection.
    pub fn add(&mut self, entry: Entry) -> Result<EntryCollection> {
        let id = entry.id;
        let next = self.load()?.with_added(entry, &self.limits)?;
        self.save(&next)?;
        tracing::debug!("Added entry {}", id);
        Ok(next)
    }

    /// Apply `changes` to the first entry matching `selector`, then persist
    pub fn update(
        &mut self,
        selector: &Selector,
        changes: &EntryChanges,
    ) -> Result<EntryCollection> {
        let next = self
            .load()?
            .with_updated(selector, changes, &self.limits)?;
        self.save(&next)?;
        tracing::debug!("Updated entry matching {}", selector);
        Ok(next)
    }

    /// Remove the first entry matching `selector`, then persist
    pub fn delete(&mut self, selector: &Selector) -> Result<EntryCollection> {
        let next = self.load()?.without(selector)?;
        self.save(&next)?;
        tracing::debug!("Deleted entry matching {}", selector);
        Ok(next)
    }

    /// CSV bytes of the current collection, identical to the saved file
    pub fn export(&mut self) -> Result<Vec<u8>> {
        codec::export_csv(&self.load()?)
    }

    fn replace_snapshot(&mut self, collection: EntryCollection, fingerprint: Option<Fingerprint>) {
        self.cache = Some(Snapshot {
            collection,
            fingerprint,
        });
        self.version += 1;
    }
}
