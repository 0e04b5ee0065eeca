//! CSV persistence of competition rankings
//!
//! Layout: `<output-root>/<DDMMYYYY-HHMM>/<competition-name>.csv`, `;` delimited,
//! UTF-8, `\n` line endings. Competition names are used as file stems verbatim.

use chrono::{DateTime, Local};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::{ApplicantRecord, CSV_HEADERS};
use crate::infrastructure::config::defaults;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Failed to create {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write CSV {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Destination for one competition's records
pub trait CompetitionSink: Send + Sync + 'static {
    /// Persist `records` under `name`, returning where they went
    fn write(&self, name: &str, records: &[ApplicantRecord]) -> Result<PathBuf, SinkError>;
}

/// Create `<output_root>/<DDMMYYYY-HHMM>` for a run started at `started_at`
pub fn create_session_folder(output_root: &Path, started_at: DateTime<Local>) -> Result<PathBuf, SinkError> {
    let session_dir = output_root.join(started_at.format(defaults::SESSION_FOLDER_FORMAT).to_string());
    std::fs::create_dir_all(&session_dir).map_err(|source| SinkError::Io {
        path: session_dir.clone(),
        source,
    })?;

    info!("📁 Session folder: {:?}", session_dir);
    Ok(session_dir)
}

/// Writes each competition to its own CSV file inside a session folder
#[derive(Debug, Clone)]
pub struct CsvSink {
    session_dir: PathBuf,
}

impl CsvSink {
    pub fn new(session_dir: impl Into<PathBuf>) -> Self {
        Self {
            session_dir: session_dir.into(),
        }
    }

    pub fn file_path(&self, name: &str) -> PathBuf {
        self.session_dir.join(format!("{name}.csv"))
    }
}

impl CompetitionSink for CsvSink {
    fn write(&self, name: &str, records: &[ApplicantRecord]) -> Result<PathBuf, SinkError> {
        let path = self.file_path(name);
        let file = File::create(&path).map_err(|source| SinkError::Io {
            path: path.clone(),
            source,
        })?;

        let csv_error = |source| SinkError::Csv {
            path: path.clone(),
            source,
        };

        // Header is written explicitly so empty rankings still get one
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b';')
            .terminator(csv::Terminator::Any(b'\n'))
            .has_headers(false)
            .from_writer(file);

        writer.write_record(CSV_HEADERS).map_err(csv_error)?;
        for record in records {
            writer.serialize(record).map_err(csv_error)?;
        }
        writer.flush().map_err(|source| SinkError::Io {
            path: path.clone(),
            source,
        })?;

        debug!("Wrote {} rows to {:?}", records.len(), path);
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DocumentStatus;
    use chrono::TimeZone;

    fn record(identifier: &str, total: u32, status: DocumentStatus) -> ApplicantRecord {
        ApplicantRecord {
            identifier: identifier.to_string(),
            total_score: total,
            bonus_score: 0,
            priority: 1,
            document_status: status,
        }
    }

    #[test]
    fn test_session_folder_name() {
        let root = tempfile::tempdir().unwrap();
        let started_at = Local.with_ymd_and_hms(2026, 7, 5, 9, 3, 0).unwrap();

        let dir = create_session_folder(root.path(), started_at).unwrap();
        assert_eq!(dir, root.path().join("05072026-0903"));
        assert!(dir.is_dir());
    }

    #[test]
    fn test_writes_header_and_rows_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let sink = CsvSink::new(dir.path());
        let records = vec![
            record("123-456-789-01", 287, DocumentStatus::Original),
            record("234-567-890-12", 265, DocumentStatus::Copy),
        ];

        let path = sink.write("Агрономия (Защита растений)", &records).unwrap();
        assert_eq!(path, dir.path().join("Агрономия (Защита растений).csv"));

        let content = std::fs::read_to_string(path).unwrap();
        assert_eq!(
            content,
            "СНИЛС;Сумма баллов;Дополнительные баллы;Приоритет;Вид документов\n\
             123-456-789-01;287;0;1;Оригинал\n\
             234-567-890-12;265;0;1;Копия\n"
        );
    }

    #[test]
    fn test_empty_ranking_still_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = CsvSink::new(dir.path()).write("Пусто", &[]).unwrap();

        let content = std::fs::read_to_string(path).unwrap();
        assert_eq!(content.lines().count(), 1);
    }

    #[test]
    fn test_missing_session_dir_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let sink = CsvSink::new(dir.path().join("does-not-exist"));
        assert!(matches!(sink.write("x", &[]), Err(SinkError::Io { .. })));
    }
}
