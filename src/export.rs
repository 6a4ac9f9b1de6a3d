//! Machine-readable dumps of a [`ResultMatrix`].

use crate::matrix::ResultMatrix;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv encoding failed: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Json,
    Csv,
}

pub fn write_json<W: Write>(matrix: &ResultMatrix, writer: W) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(writer, &matrix.rows())?;
    Ok(())
}

/// One header row, then one record per cell. Missing medians are empty fields.
pub fn write_csv<W: Write>(matrix: &ResultMatrix, writer: W) -> Result<(), ExportError> {
    let mut csv = csv::Writer::from_writer(writer);
    for row in matrix.rows() {
        csv.serialize(row)?;
    }
    csv.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn export_to_path(matrix: &ResultMatrix, format: ExportFormat, path: &Path) -> Result<(), ExportError> {
    let io_err = |source| ExportError::Io {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let mut writer = BufWriter::new(File::create(path).map_err(io_err)?);
    match format {
        ExportFormat::Json => write_json(matrix, &mut writer)?,
        ExportFormat::Csv => write_csv(matrix, &mut writer)?,
    }
    writer.flush().map_err(io_err)
}
