use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::Context;
use atomic_write_file::AtomicWriteFile;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::exam::ExamRecord;

const STORE_VERSION: u32 = 1;

/// The slot holding the student's exam list.
pub trait RecordStore {
    fn load(&self) -> anyhow::Result<Vec<ExamRecord>>;
    fn save(&self, exams: &[ExamRecord]) -> anyhow::Result<()>;
}

#[derive(Serialize, Deserialize)]
struct StoreDocument {
    version: u32,
    exams: Vec<ExamRecord>,
}

/// A JSON document on disk with a single `exams` slot.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordStore for JsonFileStore {
    /// A missing file is an empty list.
    fn load(&self) -> anyhow::Result<Vec<ExamRecord>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no exam store yet");
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)
            .with_context(|| format!("failed to open exam store at {}", self.path.display()))?;
        let document: StoreDocument = serde_json::from_reader(file)
            .with_context(|| format!("failed to parse exam store at {}", self.path.display()))?;

        if document.version != STORE_VERSION {
            anyhow::bail!("unsupported exam store version: {}", document.version);
        }

        debug!(count = document.exams.len(), "loaded exams");
        Ok(document.exams)
    }

    fn save(&self, exams: &[ExamRecord]) -> anyhow::Result<()> {
        let mut file = AtomicWriteFile::open(&self.path)
            .with_context(|| format!("failed to open {} for writing", self.path.display()))?;

        let document = StoreDocument {
            version: STORE_VERSION,
            exams: exams.to_vec(),
        };
        serde_json::to_writer_pretty(&mut file, &document)
            .context("failed to serialize exam store")?;
        file.commit()
            .with_context(|| format!("failed to save exam store at {}", self.path.display()))?;

        debug!(count = exams.len(), path = %self.path.display(), "saved exams");
        Ok(())
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportOutcome {
    pub inserted: usize,
    pub skipped: usize,
}

/// Appends the exams of a CSV file (`name,grade,credits,honors,recognition`)
/// to the store. Rows that fail to decode or fail validation are skipped.
pub fn import_csv(store: &impl RecordStore, csv_path: &Path) -> anyhow::Result<ImportOutcome> {
    #[derive(Deserialize)]
    struct CsvRow {
        name: String,
        grade: Option<String>,
        credits: String,
        honors: Option<bool>,
        recognition: Option<bool>,
    }

    let mut exams = store
        .load()
        .context("refusing to import into an exam store that could not be read")?;
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut outcome = ImportOutcome::default();

    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(err) => {
                warn!(record = line + 1, %err, "skipping malformed exam");
                outcome.skipped += 1;
                continue;
            }
        };

        match ExamRecord::from_input(
            &row.name,
            row.grade.as_deref(),
            &row.credits,
            row.honors.unwrap_or(false),
            row.recognition.unwrap_or(false),
        ) {
            Ok(exam) => {
                exams.push(exam);
                outcome.inserted += 1;
            }
            Err(err) => {
                warn!(record = line + 1, name = %row.name, %err, "skipping invalid exam");
                outcome.skipped += 1;
            }
        }
    }

    if outcome.inserted > 0 {
        store.save(&exams)?;
    }
    info!(
        inserted = outcome.inserted,
        skipped = outcome.skipped,
        "imported exams from {}",
        csv_path.display()
    );
    Ok(outcome)
}
