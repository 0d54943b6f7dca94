use std::{
    fs::{self, File, OpenOptions},
    io::{ErrorKind, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use signbook_core::{
    records::UserRecord,
    store::{RecordMutator, RecordStore, StoreError},
};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::codec::{decode_table, encode_row, encode_table, read_err, write_err};

/// CSV file-backed store implementing the shared `RecordStore` contract.
///
/// No handle is held between operations. Writers inside this process are
/// serialized by `write_lock`; other processes writing the same file are not.
pub struct CsvFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl CsvFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<UserRecord>, StoreError> {
        match File::open(&self.path) {
            Ok(file) => decode_table(file),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(read_err(err)),
        }
    }

    fn save(&self, records: &[UserRecord]) -> Result<(), StoreError> {
        let bytes = encode_table(records)?;
        write_atomic(&self.path, &bytes)
    }

    fn push(&self, record: &UserRecord) -> Result<(), StoreError> {
        fs::create_dir_all(parent_dir(&self.path)).map_err(write_err)?;
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(write_err)?;

        let len = file.metadata().map_err(write_err)?.len();
        let mut buf = if len == 0 {
            encode_table(&[])?
        } else if ends_with_newline(&mut file, len).map_err(write_err)? {
            Vec::new()
        } else {
            vec![b'\n']
        };
        buf.extend(encode_row(record)?);

        // One write so a failure cannot leave earlier rows truncated.
        file.write_all(&buf).map_err(write_err)?;
        file.sync_data().map_err(write_err)
    }
}

#[async_trait]
impl RecordStore for CsvFileStore {
    #[instrument(skip_all, fields(path = %self.path.display()))]
    async fn ensure_initialized(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        if self.path.exists() {
            return Ok(());
        }
        debug!("creating empty user table");
        self.save(&[])
    }

    #[instrument(skip_all)]
    async fn read_all(&self) -> Result<Vec<UserRecord>, StoreError> {
        let records = self.load()?;
        debug!(count = records.len(), "read user table");
        Ok(records)
    }

    #[instrument(skip_all)]
    async fn append(&self, record: &UserRecord) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.push(record)
    }

    #[instrument(skip_all, fields(count = records.len()))]
    async fn replace_all(&self, records: &[UserRecord]) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.save(records)
    }

    #[instrument(skip_all)]
    async fn append_if_absent(&self, record: &UserRecord) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().await;
        let email = record.email.trim();
        if self.load()?.iter().any(|r| r.has_email(email)) {
            return Ok(false);
        }
        self.push(record)?;
        Ok(true)
    }

    #[instrument(skip_all)]
    async fn update_if_present(
        &self,
        email: &str,
        mutator: RecordMutator<'_>,
    ) -> Result<Option<UserRecord>, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load()?;
        let Some(index) = records.iter().position(|r| r.has_email(email)) else {
            return Ok(None);
        };
        mutator(&mut records[index]);
        records[index] = records[index].trimmed();
        self.save(&records)?;
        Ok(Some(records[index].clone()))
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let parent = parent_dir(path);
    fs::create_dir_all(parent).map_err(write_err)?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

fn ends_with_newline(file: &mut File, len: u64) -> std::io::Result<bool> {
    let mut last = [0u8; 1];
    file.seek(SeekFrom::Start(len - 1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    const HEADER: &str = "name,email,phone,password,gender\n";

    fn ann() -> UserRecord {
        UserRecord::new("Ann", "a@x.com", "1234567890", "pass12", "female")
    }

    fn bob() -> UserRecord {
        UserRecord::new("Bob", "b@x.com", "5550001111", "hunter2", "male")
    }

    #[tokio::test]
    async fn ensure_initialized_writes_header_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = CsvFileStore::new(dir.path().join("nested").join("users.csv"));

        store.ensure_initialized().await.expect("init");
        assert_eq!(fs::read_to_string(store.path()).expect("read"), HEADER);

        store.append(&ann()).await.expect("append");
        store.ensure_initialized().await.expect("init again");
        assert_eq!(store.read_all().await.expect("read_all"), vec![ann()]);
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = CsvFileStore::new(dir.path().join("users.csv"));
        assert!(store.read_all().await.expect("read_all").is_empty());
    }

    #[tokio::test]
    async fn replace_all_round_trips_in_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = CsvFileStore::new(dir.path().join("users.csv"));
        let odd = UserRecord::new("Doe, \"JD\"", "jd@x.com", "42", "multi\nline", "x");
        let records = vec![bob(), odd, ann()];

        store.replace_all(&records).await.expect("replace");
        assert_eq!(store.read_all().await.expect("read_all"), records);

        store.replace_all(&[]).await.expect("replace empty");
        assert_eq!(fs::read_to_string(store.path()).expect("read"), HEADER);
    }

    #[tokio::test]
    async fn append_keeps_existing_rows_and_line_boundaries() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("users.csv");
        // Row without a trailing newline, as left behind by hand edits.
        fs::write(&path, format!("{HEADER}Ann,a@x.com,1234567890,pass12,female")).expect("seed");

        let store = CsvFileStore::new(&path);
        store.append(&bob()).await.expect("append");

        assert_eq!(
            fs::read_to_string(&path).expect("read"),
            format!("{HEADER}Ann,a@x.com,1234567890,pass12,female\nBob,b@x.com,5550001111,hunter2,male\n")
        );
        assert_eq!(store.read_all().await.expect("read_all"), vec![ann(), bob()]);
    }

    #[tokio::test]
    async fn append_to_empty_file_adds_header() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("users.csv");
        fs::write(&path, "").expect("seed");

        let store = CsvFileStore::new(&path);
        store.append(&ann()).await.expect("append");
        assert_eq!(store.read_all().await.expect("read_all"), vec![ann()]);
    }

    #[tokio::test]
    async fn malformed_file_is_a_read_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("users.csv");
        fs::write(&path, format!("{HEADER}Ann,a@x.com\n")).expect("seed");

        let store = CsvFileStore::new(&path);
        let err = store.read_all().await.expect_err("malformed");
        assert!(matches!(err, StoreError::Read { .. }));
    }

    #[tokio::test]
    async fn failed_write_leaves_previous_content() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("users.csv");
        let store = CsvFileStore::new(&path);
        store.replace_all(&[ann()]).await.expect("seed");

        // A directory where the file should be makes every write fail.
        let blocked = CsvFileStore::new(dir.path());
        let err = blocked.replace_all(&[bob()]).await.expect_err("blocked");
        assert!(matches!(err, StoreError::Write { .. }));
        assert_eq!(store.read_all().await.expect("read_all"), vec![ann()]);
    }

    #[tokio::test]
    async fn update_if_present_rewrites_one_record() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = CsvFileStore::new(dir.path().join("users.csv"));
        store.replace_all(&[ann(), bob()]).await.expect("seed");

        let updated = store
            .update_if_present("b@x.com", &|r: &mut UserRecord| r.password = " s3cret ".into())
            .await
            .expect("update");
        assert_eq!(updated.map(|r| r.password), Some("s3cret".to_string()));

        let records = store.read_all().await.expect("read_all");
        assert_eq!(records[0], ann());
        assert_eq!(records[1].password, "s3cret");

        let missing = store
            .update_if_present("c@x.com", &|r: &mut UserRecord| r.password = "x".into())
            .await
            .expect("update");
        assert!(missing.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_registrations_of_one_email_append_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Arc::new(CsvFileStore::new(dir.path().join("users.csv")));
        store.ensure_initialized().await.expect("init");

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    let mut record = ann();
                    record.name = format!("Ann {i}");
                    store.append_if_absent(&record).await
                })
            })
            .collect();

        let mut appended = 0;
        for handle in handles {
            if handle.await.expect("join").expect("append_if_absent") {
                appended += 1;
            }
        }

        assert_eq!(appended, 1);
        assert_eq!(store.read_all().await.expect("read_all").len(), 1);
    }
}
