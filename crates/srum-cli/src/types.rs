use std::path::PathBuf;

/// Everything a `convert` run produced.
#[derive(Debug, Default)]
pub struct ConvertResult {
    pub output_db: PathBuf,
    pub tables: Vec<TableSummary>,
    pub errors: Vec<String>,
    pub has_errors: bool,
}

impl ConvertResult {
    pub fn push_table(&mut self, summary: TableSummary) {
        if let Some(error) = &summary.error {
            self.errors.push(format!("{}: {error}", summary.destination));
            self.has_errors = true;
        }
        self.tables.push(summary);
    }
}

/// Outcome of one destination table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSummary {
    pub source: String,
    pub destination: String,
    /// Records read from the source.
    pub records: usize,
    pub inserted: usize,
    pub duplicates: usize,
    pub failed: usize,
    /// Fields stored as null after a decode failure.
    pub field_errors: usize,
    /// Set when the table was abandoned and rolled back.
    pub error: Option<String>,
}

impl TableSummary {
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            ..Self::default()
        }
    }

    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}
