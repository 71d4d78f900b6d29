//! JSON export of the derived tables, one array file per table.

use crate::database::ingestion::Dataset;
use crate::database::schema::{
    DIM_CONSTITUENCY_PROFILE, DIM_FPTP_CANDIDATES, DIM_PARTIES, DIM_PR_CANDIDATES,
};
use crate::derive::DerivedTables;
use log::info;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot serialize {table}: {source}")]
    Serialize {
        table: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, ExportError>;

/// One written file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub table: &'static str,
    pub path: PathBuf,
    pub rows: usize,
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ExportError + '_ {
    move |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Write `rows` to `path` via a temp file in the same directory and a rename,
/// so readers never see a half-written file.
pub fn write_json_atomic<T: Serialize>(path: &Path, table: &str, rows: &T) -> Result<()> {
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(format!(".{}.tmp", std::process::id()));
    let tmp = PathBuf::from(tmp_name);

    let written: Result<()> = (|| {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp)
            .map_err(io_error(&tmp))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, rows).map_err(|source| ExportError::Serialize {
            table: table.to_string(),
            source,
        })?;
        writer.write_all(b"\n").map_err(io_error(&tmp))?;
        let file: File = writer
            .into_inner()
            .map_err(|e| ExportError::Io {
                path: tmp.clone(),
                source: e.into_error(),
            })?;
        file.sync_all().map_err(io_error(&tmp))
    })();

    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    fs::rename(&tmp, path).map_err(|source| {
        let _ = fs::remove_file(&tmp);
        ExportError::Io {
            path: path.to_path_buf(),
            source,
        }
    })
}

fn export_one<T: Serialize>(dir: &Path, table: &'static str, rows: &[T]) -> Result<ExportedFile> {
    let path = dir.join(format!("{}.json", table));
    write_json_atomic(&path, table, &rows)?;
    info!("exported {} rows to {}", rows.len(), path.display());
    Ok(ExportedFile {
        table,
        path,
        rows: rows.len(),
    })
}

/// Export every derived table to `<dir>/<table>.json`.
pub fn export_tables(tables: &DerivedTables, dir: &Path) -> Result<Vec<ExportedFile>> {
    fs::create_dir_all(dir).map_err(io_error(dir))?;
    Ok(vec![
        export_one(dir, DIM_FPTP_CANDIDATES, &tables.fptp_candidates)?,
        export_one(dir, DIM_PR_CANDIDATES, &tables.pr_candidates)?,
        export_one(dir, DIM_CONSTITUENCY_PROFILE, &tables.constituencies)?,
        export_one(dir, DIM_PARTIES, &tables.parties)?,
        export_one(dir, Dataset::PartySymbols.table(), &tables.party_symbols)?,
    ])
}
