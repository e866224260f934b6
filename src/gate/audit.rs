//! Append-only audit log of access decisions

use crate::access::Decision;
use chrono::Local;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

pub struct AuditLog {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl AuditLog {
    /// Open (creating if needed) in append mode
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record_decision(&mut self, uid: &str, decision: Decision) -> io::Result<()> {
        self.write_entry(&format!("{} {}", decision, uid))
    }

    pub fn record_timeout(&mut self) -> io::Result<()> {
        self.write_entry("TIMEOUT")
    }

    fn write_entry(&mut self, entry: &str) -> io::Result<()> {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        writeln!(self.writer, "[{}] {}", timestamp, entry)?;
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_entries_appended() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.log");

        {
            let mut log = AuditLog::open(&path).unwrap();
            log.record_decision("12345ABC", Decision::Granted).unwrap();
            log.record_timeout().unwrap();
        }
        {
            let mut log = AuditLog::open(&path).unwrap();
            log.record_decision("AAAAAAAA", Decision::Denied).unwrap();
        }

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with('['));
        assert!(lines[0].ends_with("] GRANTED 12345ABC"));
        assert!(lines[1].ends_with("] TIMEOUT"));
        assert!(lines[2].ends_with("] DENIED AAAAAAAA"));
    }

    #[test]
    fn test_open_in_missing_directory_fails() {
        assert!(AuditLog::open(Path::new("/nonexistent/dir/audit.log")).is_err());
    }
}
