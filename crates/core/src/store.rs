//! File-backed document store.
//!
//! Each document is a YAML file inside a sharded directory derived from its [`RecordId`]:
//!
//! ```text
//! <data_dir>/
//!   doctors/<s1>/<s2>/<id>/doctor.yaml
//!   patients/<s1>/<s2>/<id>/patient.yaml
//!   appointments/<s1>/<s2>/<id>/appointment.yaml
//! ```
//!
//! Single-document writes are atomic: content goes to a sibling temp file which is then
//! renamed over the target. Multi-document operations (reserve, cancel) are made atomic
//! with respect to each other by holding [`DocumentStore::write_lock`] across the whole
//! read-check-write sequence. The lock covers other processes too (the operator CLI next to a
//! running server) through an advisory lock on `<data_dir>/.write.lock`.

use crate::appointment::Appointment;
use crate::config::CoreConfig;
use crate::constants::{
    APPOINTMENT_FILENAME, DOCTOR_FILENAME, PATIENT_FILENAME, WRITE_LOCK_FILENAME,
};
use crate::doctor::Doctor;
use crate::error::{BookingError, BookingResult, RecordKind};
use crate::patient::Patient;
use docplus_uuid::RecordId;
use serde::de::DeserializeOwned;
use fs4::fs_std::FileExt;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// A record type persisted as one YAML document.
pub trait Document: Serialize + DeserializeOwned {
    const KIND: RecordKind;
    const FILE_NAME: &'static str;

    fn id(&self) -> &RecordId;

    fn collection_dir(cfg: &CoreConfig) -> PathBuf;
}

impl Document for Doctor {
    const KIND: RecordKind = RecordKind::Doctor;
    const FILE_NAME: &'static str = DOCTOR_FILENAME;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn collection_dir(cfg: &CoreConfig) -> PathBuf {
        cfg.doctors_dir()
    }
}

impl Document for Patient {
    const KIND: RecordKind = RecordKind::Patient;
    const FILE_NAME: &'static str = PATIENT_FILENAME;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn collection_dir(cfg: &CoreConfig) -> PathBuf {
        cfg.patients_dir()
    }
}

impl Document for Appointment {
    const KIND: RecordKind = RecordKind::Appointment;
    const FILE_NAME: &'static str = APPOINTMENT_FILENAME;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn collection_dir(cfg: &CoreConfig) -> PathBuf {
        cfg.appointments_dir()
    }
}

/// Parse a document from YAML, reporting the failing field path on schema mismatch.
pub fn parse_document<D: Document>(yaml_text: &str, origin: &Path) -> BookingResult<D> {
    let deserializer = serde_yaml::Deserializer::from_str(yaml_text);

    serde_path_to_error::deserialize::<_, D>(deserializer).map_err(|err| {
        let field = err.path().to_string();
        let field = if field.is_empty() || field == "." {
            "<root>".to_string()
        } else {
            field
        };
        BookingError::YamlDeserialization {
            path: origin.display().to_string(),
            field,
            message: err.into_inner().to_string(),
        }
    })
}

/// Render a document as YAML.
pub fn render_document<D: Document>(document: &D) -> BookingResult<String> {
    serde_yaml::to_string(document).map_err(BookingError::YamlSerialization)
}

/// Exclusive write access to the data directory, released on drop.
#[must_use]
pub struct WriteGuard<'a> {
    _local: MutexGuard<'a, ()>,
    lock_file: &'a File,
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        // Runs before the in-process guard is released.
        if let Err(e) = FileExt::unlock(self.lock_file) {
            tracing::warn!("failed to release data directory lock: {}", e);
        }
    }
}

/// Shared handle to the booking data directory.
#[derive(Clone, Debug)]
pub struct DocumentStore {
    cfg: Arc<CoreConfig>,
    write_lock: Arc<Mutex<()>>,
    lock_file: Arc<File>,
}

impl DocumentStore {
    /// Opens the store, creating the collection directories if needed.
    pub fn open(cfg: Arc<CoreConfig>) -> BookingResult<Self> {
        for dir in [cfg.doctors_dir(), cfg.patients_dir(), cfg.appointments_dir()] {
            fs::create_dir_all(&dir).map_err(BookingError::StorageDirCreation)?;
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(cfg.data_dir().join(WRITE_LOCK_FILENAME))
            .map_err(BookingError::StorageLock)?;

        Ok(Self {
            cfg,
            write_lock: Arc::new(Mutex::new(())),
            lock_file: Arc::new(lock_file),
        })
    }

    pub fn config(&self) -> &Arc<CoreConfig> {
        &self.cfg
    }

    /// Acquires the store-wide write lock.
    ///
    /// Every operation that reads a document, decides, and writes back must hold this guard
    /// for the whole sequence. Threads queue on an in-process mutex; the holder then takes an
    /// exclusive advisory lock on the data directory's lock file, which blocks until no other
    /// process holds it. A poisoned mutex is recovered: the guarded data is `()` and document
    /// files are replaced atomically, so a panicking holder cannot leave a torn write behind.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::StorageLock`] if the file lock cannot be taken.
    pub fn write_lock(&self) -> BookingResult<WriteGuard<'_>> {
        let local = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        FileExt::lock_exclusive(&*self.lock_file).map_err(BookingError::StorageLock)?;

        Ok(WriteGuard {
            _local: local,
            lock_file: &self.lock_file,
        })
    }

    pub(crate) fn document_path<D: Document>(&self, id: &RecordId) -> PathBuf {
        id.sharded_dir(&D::collection_dir(&self.cfg))
            .join(D::FILE_NAME)
    }

    /// Loads a document, returning `None` if it does not exist.
    pub fn find<D: Document>(&self, id: &RecordId) -> BookingResult<Option<D>> {
        let path = self.document_path::<D>(id);
        if !path.is_file() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path).map_err(BookingError::FileRead)?;
        parse_document(&contents, &path).map(Some)
    }

    /// Loads a document, failing with [`BookingError::NotFound`] if it does not exist.
    pub fn load<D: Document>(&self, id: &RecordId) -> BookingResult<D> {
        self.find(id)?.ok_or(BookingError::NotFound(D::KIND))
    }

    /// Writes a document atomically, replacing any previous version.
    pub fn save<D: Document>(&self, document: &D) -> BookingResult<()> {
        let path = self.document_path::<D>(document.id());
        let yaml = render_document(document)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(BookingError::StorageDirCreation)?;
        }

        let tmp_path = path.with_extension("yaml.tmp");
        fs::write(&tmp_path, yaml).map_err(BookingError::FileWrite)?;
        if let Err(e) = fs::rename(&tmp_path, &path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(BookingError::FileWrite(e));
        }

        Ok(())
    }

    /// Removes a document and its sharded directory.
    ///
    /// Only used to roll back a document created earlier in the same locked operation.
    pub(crate) fn remove<D: Document>(&self, id: &RecordId) -> BookingResult<()> {
        let dir = id.sharded_dir(&D::collection_dir(&self.cfg));
        match fs::remove_dir_all(&dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BookingError::FileRemove(e)),
        }
    }

    /// Lists every readable document in a collection.
    ///
    /// Traverses `<collection>/<s1>/<s2>/<id>/<file>`. Documents that fail to parse are
    /// logged and skipped so one corrupt file cannot take a listing down.
    pub fn list<D: Document>(&self) -> Vec<D> {
        let base = D::collection_dir(&self.cfg);
        let mut documents = Vec::new();

        let s1_iter = match fs::read_dir(&base) {
            Ok(it) => it,
            Err(_) => return documents,
        };

        for s1 in s1_iter.flatten() {
            let s1_path = s1.path();
            if !s1_path.is_dir() {
                continue;
            }

            let s2_iter = match fs::read_dir(&s1_path) {
                Ok(it) => it,
                Err(_) => continue,
            };

            for s2 in s2_iter.flatten() {
                let s2_path = s2.path();
                if !s2_path.is_dir() {
                    continue;
                }

                let id_iter = match fs::read_dir(&s2_path) {
                    Ok(it) => it,
                    Err(_) => continue,
                };

                for id_ent in id_iter.flatten() {
                    let doc_path = id_ent.path().join(D::FILE_NAME);
                    if !doc_path.is_file() {
                        continue;
                    }

                    let contents = match fs::read_to_string(&doc_path) {
                        Ok(contents) => contents,
                        Err(e) => {
                            tracing::warn!("failed to read {}: {}", doc_path.display(), e);
                            continue;
                        }
                    };

                    match parse_document::<D>(&contents, &doc_path) {
                        Ok(document) => documents.push(document),
                        Err(e) => tracing::warn!("skipping unreadable {}: {}", D::KIND, e),
                    }
                }
            }
        }

        documents
    }
}
