//! Flat-file URL ledger
//!
//! One URL per line, UTF-8. Blank lines are ignored on load and dropped on
//! rewrite. Lines that are not valid UTF-8 are skipped on load but kept on
//! rewrite. The whole file is held in memory and re-read on demand.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::LedgerError;
use crate::ports::{RemoveOutcome, UrlLedger};

/// [`UrlLedger`] backed by a text file
#[derive(Debug)]
pub struct FileLedger {
    path: PathBuf,
    entries: Vec<String>,
}

impl FileLedger {
    /// Open the ledger at `path` and load it
    ///
    /// A missing file is a valid empty ledger.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let mut ledger = Self {
            path: path.into(),
            entries: Vec::new(),
        };
        ledger.reload();
        ledger
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The loaded entries, in file order
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Non-empty lines as raw bytes, trailing `\r` stripped
    fn read_raw_lines(&self) -> io::Result<Vec<Vec<u8>>> {
        let content = fs::read(&self.path)?;
        Ok(content
            .split(|b| *b == b'\n')
            .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
            .filter(|line| !line.is_empty())
            .map(<[u8]>::to_vec)
            .collect())
    }

    fn read_lines(&self) -> io::Result<Vec<String>> {
        let mut skipped = 0usize;
        let lines: Vec<String> = self
            .read_raw_lines()?
            .into_iter()
            .filter_map(|line| match String::from_utf8(line) {
                Ok(line) => Some(line),
                Err(_) => {
                    skipped += 1;
                    None
                }
            })
            .collect();
        if skipped > 0 {
            warn!(path = %self.path.display(), skipped, "Skipped ledger lines that are not valid UTF-8");
        }
        Ok(lines)
    }

    fn write_raw_lines(&self, lines: &[Vec<u8>]) -> io::Result<()> {
        let mut content = Vec::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
        for line in lines {
            content.extend_from_slice(line);
            content.push(b'\n');
        }
        fs::write(&self.path, content)
    }

    fn io_error(&self, source: io::Error) -> LedgerError {
        LedgerError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl UrlLedger for FileLedger {
    fn contains(&self, url: &str) -> bool {
        self.entries.iter().any(|entry| entry == url)
    }

    fn reload(&mut self) {
        self.entries = match self.read_lines() {
            Ok(lines) => lines,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "Ledger file not found, starting empty");
                Vec::new()
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ledger file unreadable, starting empty");
                Vec::new()
            }
        };
    }

    fn append(&mut self, url: &str) -> Result<(), LedgerError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;
        writeln!(file, "{}", url).map_err(|e| self.io_error(e))?;

        self.entries.push(url.to_string());
        Ok(())
    }

    fn remove(&mut self, url: &str) -> RemoveOutcome {
        let lines = match self.read_raw_lines() {
            Ok(lines) => lines,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ledger unavailable for removal");
                return RemoveOutcome::StorageUnavailable;
            }
        };

        let before = lines.len();
        let kept: Vec<Vec<u8>> = lines
            .into_iter()
            .filter(|line| line.as_slice() != url.as_bytes())
            .collect();
        let removed = before - kept.len();

        if removed == 0 {
            self.reload();
            return RemoveOutcome::NotFound;
        }

        if let Err(e) = self.write_raw_lines(&kept) {
            warn!(path = %self.path.display(), error = %e, "Failed to rewrite ledger");
            return RemoveOutcome::StorageUnavailable;
        }
        debug!(url = %url, removed, "Removed URL from ledger");

        self.reload();
        RemoveOutcome::Removed(removed)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_ledger(dir: &TempDir, urls: &[&str]) -> PathBuf {
        let path = dir.path().join("urls.txt");
        let mut content = String::new();
        for url in urls {
            content.push_str(url);
            content.push('\n');
        }
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_missing_file_is_empty_ledger() {
        let dir = TempDir::new().unwrap();
        let ledger = FileLedger::open(dir.path().join("absent.txt"));
        assert!(ledger.is_empty());
        assert!(!ledger.contains("www.example.com0"));
    }

    #[test]
    fn test_loads_non_empty_lines_in_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("urls.txt");
        fs::write(&path, "www.a.com\n\nwww.b.com\nwww.a.com\n\n").unwrap();

        let ledger = FileLedger::open(&path);

        assert_eq!(ledger.entries(), &["www.a.com", "www.b.com", "www.a.com"]);
        assert_eq!(ledger.len(), 3);
    }

    #[test]
    fn test_contains_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = write_ledger(&dir, &["www.example.com0", "www.test.com"]);
        let mut ledger = FileLedger::open(&path);

        assert!(ledger.contains("www.example.com0"));
        assert!(!ledger.contains("www.notadded.com"));

        write_ledger(&dir, &["www.updated.com"]);
        // contains() never touches disk
        assert!(ledger.contains("www.example.com0"));

        ledger.reload();
        assert!(ledger.contains("www.updated.com"));
        assert!(!ledger.contains("www.example.com0"));
    }

    #[test]
    fn test_exact_match_only() {
        let dir = TempDir::new().unwrap();
        let path = write_ledger(&dir, &["http://www.example.com/a"]);
        let ledger = FileLedger::open(&path);

        assert!(!ledger.contains("http://www.example.com"));
        assert!(!ledger.contains("http://www.example.com/a/"));
    }

    #[test]
    fn test_remove_then_not_found() {
        let dir = TempDir::new().unwrap();
        let path = write_ledger(&dir, &["www.to.delete", "www.keep.com"]);
        let mut ledger = FileLedger::open(&path);

        assert_eq!(ledger.remove("www.to.delete"), RemoveOutcome::Removed(1));
        assert!(!ledger.contains("www.to.delete"));
        assert!(ledger.contains("www.keep.com"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "www.keep.com\n");

        assert_eq!(ledger.remove("www.to.delete"), RemoveOutcome::NotFound);
    }

    #[test]
    fn test_remove_drops_every_duplicate() {
        let dir = TempDir::new().unwrap();
        let path = write_ledger(&dir, &["www.a.com", "www.b.com", "www.a.com", "www.c.com"]);
        let mut ledger = FileLedger::open(&path);

        assert_eq!(ledger.remove("www.a.com"), RemoveOutcome::Removed(2));
        assert_eq!(ledger.entries(), &["www.b.com", "www.c.com"]);
    }

    #[test]
    fn test_remove_missing_url_leaves_file_unchanged() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("urls.txt");
        let original = "www.a.com\n\nwww.b.com\n";
        fs::write(&path, original).unwrap();
        let mut ledger = FileLedger::open(&path);

        assert_eq!(ledger.remove("www.zzz.com"), RemoveOutcome::NotFound);
        assert_eq!(fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn test_invalid_utf8_line_does_not_hide_the_rest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("urls.txt");
        fs::write(&path, b"www.a.com\n\xff\xfe\nwww.b.com\r\n".as_slice()).unwrap();
        let mut ledger = FileLedger::open(&path);

        assert_eq!(ledger.entries(), &["www.a.com", "www.b.com"]);

        assert_eq!(ledger.remove("www.a.com"), RemoveOutcome::Removed(1));
        assert_eq!(ledger.entries(), &["www.b.com"]);
        assert_eq!(fs::read(&path).unwrap(), b"\xff\xfe\nwww.b.com\n".to_vec());
    }

    #[test]
    fn test_remove_without_file_is_storage_unavailable() {
        let dir = TempDir::new().unwrap();
        let mut ledger = FileLedger::open(dir.path().join("absent.txt"));
        assert_eq!(
            ledger.remove("www.a.com"),
            RemoveOutcome::StorageUnavailable
        );
    }

    #[test]
    fn test_append_creates_parent_and_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join("urls.txt");
        let mut ledger = FileLedger::open(&path);

        ledger.append("http://www.one.com").unwrap();
        ledger.append("http://www.two.com").unwrap();

        assert!(ledger.contains("http://www.one.com"));
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "http://www.one.com\nhttp://www.two.com\n"
        );

        let reopened = FileLedger::open(&path);
        assert_eq!(reopened.len(), 2);
    }

    #[test]
    fn test_sees_out_of_band_writes_after_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("urls.txt");
        let mut reader = FileLedger::open(&path);
        let mut writer = FileLedger::open(&path);

        writer.append("http://www.late.com").unwrap();
        assert!(!reader.contains("http://www.late.com"));

        reader.reload();
        assert!(reader.contains("http://www.late.com"));
    }
}
