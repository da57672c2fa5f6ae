//! Delimited table I/O.
//!
//! The input must carry a `game_title` column; every other column is
//! carried through untouched. Output is the input columns followed by the
//! three enrichment columns, one record per input row, in input order.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use gameenrich_shared::{
    ENRICHMENT_COLUMNS, EnrichmentResult, GAME_TITLE_COLUMN, GameEnrichError, Result,
};
use tracing::{debug, info};

/// Rows shown in the debug preview after loading.
const PREVIEW_ROWS: usize = 5;

/// An in-memory table of string cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    title_index: usize,
}

impl Table {
    /// Build a table, checking that the title column is present.
    /// Rows shorter than the header are padded with empty cells.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let title_index = headers
            .iter()
            .position(|h| h.trim().trim_start_matches('\u{feff}') == GAME_TITLE_COLUMN)
            .ok_or_else(|| {
                GameEnrichError::validation(format!(
                    "missing required column '{GAME_TITLE_COLUMN}' (found: {})",
                    headers.join(", ")
                ))
            })?;

        let width = headers.len();
        let mut padded = Vec::with_capacity(rows.len());
        for (i, mut row) in rows.into_iter().enumerate() {
            if row.len() > width {
                return Err(GameEnrichError::table(format!(
                    "row {} has {} fields but the header has {width}",
                    i + 1,
                    row.len()
                )));
            }
            row.resize(width, String::new());
            padded.push(row);
        }

        Ok(Self {
            headers,
            rows: padded,
            title_index,
        })
    }

    /// Read a table from a file.
    pub fn from_path(path: &Path, delimiter: u8) -> Result<Self> {
        let file = File::open(path).map_err(|e| GameEnrichError::io(path, e))?;
        let table = Self::from_reader(file, delimiter)?;
        info!(path = %path.display(), rows = table.len(), columns = table.headers.len(), "loaded table");
        Ok(table)
    }

    /// Read a table from any reader. The first record is the header.
    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| GameEnrichError::table(format!("failed to read header: {e}")))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record =
                record.map_err(|e| GameEnrichError::table(format!("failed to read row: {e}")))?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        let table = Self::new(headers, rows)?;
        for (i, row) in table.rows.iter().take(PREVIEW_ROWS).enumerate() {
            debug!(row = i + 1, values = ?row, "preview");
        }
        Ok(table)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The trimmed title of row `index`, or `None` when blank or out of range.
    pub fn title(&self, index: usize) -> Option<&str> {
        self.rows
            .get(index)
            .map(|row| row[self.title_index].trim())
            .filter(|title| !title.is_empty())
    }

    /// Write the table plus one enrichment per row to a file.
    pub fn write_enriched(
        &self,
        path: &Path,
        results: &[EnrichmentResult],
        delimiter: u8,
    ) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| GameEnrichError::io(parent, e))?;
        }
        let file = File::create(path).map_err(|e| GameEnrichError::io(path, e))?;
        self.write_enriched_to(file, results, delimiter)?;
        info!(path = %path.display(), rows = results.len(), "wrote enriched table");
        Ok(())
    }

    /// Write the table plus one enrichment per row to any writer.
    pub fn write_enriched_to<W: Write>(
        &self,
        writer: W,
        results: &[EnrichmentResult],
        delimiter: u8,
    ) -> Result<()> {
        if results.len() != self.rows.len() {
            return Err(GameEnrichError::validation(format!(
                "{} enrichment results for {} rows",
                results.len(),
                self.rows.len()
            )));
        }

        let mut writer = WriterBuilder::new().delimiter(delimiter).from_writer(writer);

        let mut header = StringRecord::from(self.headers.clone());
        for column in ENRICHMENT_COLUMNS {
            header.push_field(column);
        }
        writer.write_record(&header).map_err(write_error)?;

        for (row, result) in self.rows.iter().zip(results) {
            let record = row
                .iter()
                .map(String::as_str)
                .chain(result.columns());
            writer.write_record(record).map_err(write_error)?;
        }

        writer
            .flush()
            .map_err(|e| GameEnrichError::table(format!("failed to flush output: {e}")))
    }
}

fn write_error(e: csv::Error) -> GameEnrichError {
    GameEnrichError::table(format!("failed to write row: {e}"))
}
