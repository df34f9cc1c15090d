//! Relation file access: path resolution, transparent gzip reads, and
//! atomic writes.
//!
//! Each relation lives in `<dir>/<name>` or, compressed, `<dir>/<name>.gz`.
//! When both exist the compressed file wins only if it is strictly newer.
//! Writes stage every record in a temporary file first and then rename the
//! finished file into place, after which the sibling in the other format is
//! removed so exactly one file per relation remains.

pub mod io_utils;

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::codec::{encode, make_record, Record};
use crate::config::{WriteOptions, GZIP_SUFFIX};
use crate::database::Database;
use crate::error::{DbError, Result};
use crate::schema::{write_schema, Field, Schema};
use crate::table::Relation;

use io_utils::{classify_io_error, commit_as, sibling_tempfile};

/// Candidate on-disk locations of one relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePaths {
    /// Uncompressed file path
    pub plain: PathBuf,
    /// Gzip-compressed file path
    pub gzip: PathBuf,
    /// True when the compressed file is the current one
    pub use_gzip: bool,
}

impl TablePaths {
    /// Path of the file currently holding the relation's rows.
    pub fn current(&self) -> &Path {
        if self.use_gzip {
            &self.gzip
        } else {
            &self.plain
        }
    }
}

/// Derives the plain and compressed paths of relation `name` in `dir`.
pub fn table_paths(dir: impl AsRef<Path>, name: &str) -> TablePaths {
    let dir = dir.as_ref();
    let plain = dir.join(name);
    let gzip = dir.join(format!("{name}{GZIP_SUFFIX}"));
    let use_gzip = gzip.is_file()
        && match (modified(&plain), modified(&gzip)) {
            (None, _) => true,
            (Some(plain_time), Some(gzip_time)) => gzip_time > plain_time,
            (Some(_), None) => false,
        };
    TablePaths {
        plain,
        gzip,
        use_gzip,
    }
}

fn modified(path: &Path) -> Option<std::time::SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Resolves the file holding relation `name`, failing if neither the plain
/// nor the compressed file exists.
pub fn get_path(dir: impl AsRef<Path>, name: &str) -> Result<PathBuf> {
    resolve(dir.as_ref(), name).map(|paths| paths.current().to_path_buf())
}

fn resolve(dir: &Path, name: &str) -> Result<TablePaths> {
    let paths = table_paths(dir, name);
    if !paths.current().is_file() {
        return Err(DbError::TableFileNotFound { path: paths.plain });
    }
    Ok(paths)
}

/// Opens relation `name` for line-oriented reading, decompressing if needed.
pub fn open(dir: impl AsRef<Path>, name: &str) -> Result<Box<dyn BufRead>> {
    let paths = resolve(dir.as_ref(), name)?;
    let file = File::open(paths.current())
        .map_err(|e| classify_io_error(e, "Failed to open relation file"))?;
    if !paths.use_gzip {
        return Ok(Box::new(BufReader::new(file)));
    }
    let empty = file
        .metadata()
        .map_err(|e| classify_io_error(e, "Failed to stat relation file"))?
        .len()
        == 0;
    if empty {
        return Ok(Box::new(io::empty()));
    }
    Ok(Box::new(BufReader::new(MultiGzDecoder::new(BufReader::new(
        file,
    )))))
}

/// Writes `records` to relation `name` in `dir`.
pub fn write<I>(
    dir: impl AsRef<Path>,
    name: &str,
    records: I,
    fields: &[Field],
    options: WriteOptions,
) -> Result<()>
where
    I: IntoIterator<Item = Record>,
{
    write_from(dir, name, records.into_iter().map(Ok), fields, options)
}

/// Writes records from a fallible source, such as another relation, to
/// relation `name` in `dir`.
///
/// Nothing at the destination changes if the source fails part way.
pub fn write_from<I>(
    dir: impl AsRef<Path>,
    name: &str,
    records: I,
    fields: &[Field],
    options: WriteOptions,
) -> Result<()>
where
    I: IntoIterator<Item = Result<Record>>,
{
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(DbError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }
    let paths = table_paths(dir, name);
    let write_err = |e| classify_io_error(e, "Failed to write relation data");

    let mut staged = sibling_tempfile(&paths.plain, name)?;
    let mut bytes = 0usize;
    let mut count = 0usize;
    {
        let mut writer = BufWriter::new(staged.as_file_mut());
        if options.append && (paths.plain.is_file() || paths.gzip.is_file()) {
            for line in open(dir, name)?.lines() {
                let line = line.map_err(|e| classify_io_error(e, "Failed to read relation"))?;
                writeln!(writer, "{line}").map_err(write_err)?;
                bytes += line.len() + 1;
            }
        }
        for record in records {
            let line = encode(&record?, Some(fields))?;
            writeln!(writer, "{line}").map_err(write_err)?;
            bytes += line.len() + 1;
            count += 1;
        }
        writer.flush().map_err(write_err)?;
    }

    // empty relations are always written uncompressed
    let gzip = options.gzip.unwrap_or(paths.use_gzip) && bytes > 0;
    let (dest, other) = if gzip {
        (&paths.gzip, &paths.plain)
    } else {
        (&paths.plain, &paths.gzip)
    };

    if gzip {
        let mut compressed = sibling_tempfile(dest, name)?;
        {
            let mut encoder = GzEncoder::new(
                BufWriter::new(compressed.as_file_mut()),
                Compression::default(),
            );
            staged.seek(SeekFrom::Start(0)).map_err(write_err)?;
            io::copy(&mut staged, &mut encoder).map_err(write_err)?;
            encoder.finish().and_then(|mut w| w.flush()).map_err(write_err)?;
        }
        commit_as(compressed, dest, paths.current())?;
    } else {
        commit_as(staged, dest, paths.current())?;
    }
    tracing::debug!(
        "Wrote {} records ({} bytes) to {}",
        count,
        bytes,
        dest.display()
    );

    if other.is_file() {
        fs::remove_file(other)
            .map_err(|e| classify_io_error(e, "Failed to remove stale relation file"))?;
        tracing::debug!("Removed stale relation file {}", other.display());
    }
    Ok(())
}

/// Writes the relations of `db` to the database directory `path`.
///
/// `schema` is the destination schema (default: the schema of `db`); when
/// given, every record is remapped onto it by field name, dropping columns it
/// lacks and leaving new ones null. `names` restricts which relations are
/// written (default: all in the destination schema); files of destination
/// relations not written are deleted, but only after every write has been
/// committed, so `path` may be the directory of `db` itself.
pub fn write_database(
    db: &Database,
    path: impl AsRef<Path>,
    names: Option<&[&str]>,
    schema: Option<&Schema>,
    gzip: Option<bool>,
) -> Result<()> {
    let path = path.as_ref();
    if path.is_file() {
        return Err(DbError::NotADirectory {
            path: path.to_path_buf(),
        });
    }
    let remake = schema.is_some();
    let schema = schema.unwrap_or(db.schema());
    let names: Vec<&str> = match names {
        Some(names) => names.to_vec(),
        None => schema.table_names().collect(),
    };

    fs::create_dir_all(path)
        .map_err(|e| classify_io_error(e, "Failed to create database directory"))?;
    write_schema(path, schema)?;

    let options = WriteOptions {
        append: false,
        gzip,
    };
    for &name in &names {
        let fields = schema
            .get(name)
            .ok_or_else(|| DbError::RelationNotFound(name.to_string()))?;

        let source = if db.schema().contains(name) {
            db.relation(name)?
        } else if get_path(path, name).is_ok() {
            // keep rows already at the destination
            Relation::new(path, name, fields.to_vec())
        } else {
            write(path, name, Vec::new(), fields, options)?;
            continue;
        };

        let records = source.raw_records()?;
        if remake {
            let source_fields = source.fields().to_vec();
            let remapped = records.map(move |record| -> Result<Record> {
                let record = record?;
                let columns = source_fields
                    .iter()
                    .map(|f| f.name.clone())
                    .zip(record)
                    .collect();
                Ok(make_record(&columns, fields))
            });
            write_from(path, name, remapped, fields, options)?;
        } else {
            write_from(path, name, records, fields, options)?;
        }
    }

    let written: HashSet<&str> = names.iter().copied().collect();
    for name in schema.table_names().filter(|n| !written.contains(n)) {
        let paths = table_paths(path, name);
        for stale in [&paths.plain, &paths.gzip] {
            if stale.is_file() {
                fs::remove_file(stale)
                    .map_err(|e| classify_io_error(e, "Failed to remove relation file"))?;
                tracing::debug!("Removed relation file {}", stale.display());
            }
        }
    }
    Ok(())
}
