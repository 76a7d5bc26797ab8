//! CSV source reader.

use std::fs::File;
use std::io;
use std::path::Path;

use csv::StringRecord;
use tracing::debug;

use crate::error::{ErrorKind, EtlResult};
use crate::etl_error;
use crate::transform::columns;
use crate::types::RawRecord;

/// Reads [`RawRecord`]s from a CSV file with a header row.
///
/// The header is checked for the required columns when the source is opened. Iteration is
/// lazy and single pass; a row that cannot be read yields one `Err` item and reading resumes
/// with the next row, except after an I/O failure which ends the iteration.
#[derive(Debug)]
pub struct CsvSource<R> {
    reader: csv::Reader<R>,
    headers: StringRecord,
    exhausted: bool,
}

impl CsvSource<File> {
    /// Opens the CSV file at `path`.
    pub fn from_path(path: impl AsRef<Path>) -> EtlResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| {
            etl_error!(
                ErrorKind::SourceIoError,
                "Source file could not be opened",
                format!("path `{}`: {err}", path.display()),
                source: err
            )
        })?;

        debug!(path = %path.display(), "opened source file");
        Self::from_reader(file)
    }
}

impl<R: io::Read> CsvSource<R> {
    /// Wraps any reader producing CSV text.
    pub fn from_reader(reader: R) -> EtlResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);
        let headers = reader.headers()?.clone();

        let missing: Vec<&str> = columns::REQUIRED
            .iter()
            .copied()
            .filter(|required| !headers.iter().any(|header| header == *required))
            .collect();
        if !missing.is_empty() {
            return Err(etl_error!(
                ErrorKind::SourceSchemaError,
                "Source header is missing required columns",
                format!("missing: {}", missing.join(", "))
            ));
        }

        Ok(Self {
            reader,
            headers,
            exhausted: false,
        })
    }
}

impl<R: io::Read> Iterator for CsvSource<R> {
    type Item = EtlResult<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }

        let mut row = StringRecord::new();
        match self.reader.read_record(&mut row) {
            Ok(true) => Some(Ok(self.headers.iter().zip(row.iter()).collect())),
            Ok(false) => {
                self.exhausted = true;
                None
            }
            Err(err) => {
                self.exhausted = err.is_io_error();
                Some(Err(err.into()))
            }
        }
    }
}
