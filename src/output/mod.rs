//! Output organization: single-document or multi-document emission.
//!
//! The run's output choice is an immutable [`OutputConfig`] built once from
//! the caller's options. Multi-document output writes an overview plus one
//! file per table; each file is opened, written and closed before the next.
//! A write failure stops the run and leaves already-written files in place.

use crate::error::{Error, Result};
use crate::render::Format;
use crate::schema::{incoming_relations, Schema};
use ahash::AHashMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const WRITER_BUFFER_SIZE: usize = 64 * 1024;

/// Base name of the overview document; the leading underscore keeps it
/// apart from ordinary table names
pub const OVERVIEW_STEM: &str = "_overview";

/// Base name of the single document written into an output directory when
/// the table count is at or below the split threshold
pub const SINGLE_DOCUMENT_STEM: &str = "schema";

/// Where rendered documents go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    /// One document to a file, or to stdout when no path is given
    Single { path: Option<PathBuf> },
    /// Overview plus one document per table inside `dir`. With a non-zero
    /// `split_threshold`, schemas of at most that many tables are written as
    /// a single document in `dir` instead.
    Multi {
        dir: PathBuf,
        split_threshold: usize,
    },
}

/// Immutable output configuration for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    mode: OutputMode,
    format: Format,
}

impl OutputConfig {
    /// Build from the caller's options. Giving both a single-document path
    /// and an output directory is a configuration error.
    pub fn new(
        format: Format,
        output: Option<PathBuf>,
        output_dir: Option<PathBuf>,
        split_threshold: usize,
    ) -> Result<Self> {
        let mode = match (output, output_dir) {
            (Some(_), Some(_)) => {
                return Err(Error::config(
                    "--output and --output-dir are mutually exclusive",
                ))
            }
            (path, None) => OutputMode::Single { path },
            (None, Some(dir)) => OutputMode::Multi {
                dir,
                split_threshold,
            },
        };
        Ok(Self { mode, format })
    }

    /// Single document to stdout
    pub fn stdout(format: Format) -> Self {
        Self {
            mode: OutputMode::Single { path: None },
            format,
        }
    }

    pub fn mode(&self) -> &OutputMode {
        &self.mode
    }

    pub fn format(&self) -> Format {
        self.format
    }

    /// Whether a schema of `table_count` tables is written as one file per table
    pub fn splits(&self, table_count: usize) -> bool {
        match self.mode {
            OutputMode::Single { .. } => false,
            OutputMode::Multi {
                split_threshold, ..
            } => split_threshold == 0 || table_count > split_threshold,
        }
    }

    /// Whether documents go to the filesystem rather than stdout
    pub fn writes_files(&self) -> bool {
        !matches!(self.mode, OutputMode::Single { path: None })
    }
}

/// Files produced by one emission (empty when writing to stdout)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Written {
    pub files: Vec<PathBuf>,
}

/// Emit `schema` as configured
pub fn emit(schema: &Schema, config: &OutputConfig) -> Result<Written> {
    let format = config.format();
    match config.mode() {
        OutputMode::Single { path: None } => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            write_document(schema, format, &mut lock, "stdout")?;
            Ok(Written::default())
        }
        OutputMode::Single { path: Some(path) } => {
            write_document_file(schema, format, path)?;
            Ok(Written {
                files: vec![path.clone()],
            })
        }
        OutputMode::Multi { dir, .. } => {
            if config.splits(schema.len()) {
                write_directory(schema, format, dir)
            } else {
                create_dir(dir)?;
                let path = dir.join(format!("{}.{}", SINGLE_DOCUMENT_STEM, format.extension()));
                write_document_file(schema, format, &path)?;
                Ok(Written { files: vec![path] })
            }
        }
    }
}

/// Render the title plus every table, in schema order, to `sink`
pub fn write_document<W: Write>(
    schema: &Schema,
    format: Format,
    sink: &mut W,
    target: &str,
) -> Result<()> {
    let document = format.render_document(schema);
    sink.write_all(document.as_bytes())
        .and_then(|_| sink.flush())
        .map_err(|e| Error::write(target, e))
}

fn write_document_file(schema: &Schema, format: Format, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| Error::write(path.display(), e))?;
    let mut writer = BufWriter::with_capacity(WRITER_BUFFER_SIZE, file);
    write_document(schema, format, &mut writer, &path.display().to_string())
}

/// Write the overview and one document per table into `dir`.
///
/// File names are checked before anything is written: a table whose file
/// would collide with the overview, or with another table's file, is a
/// configuration error.
pub fn write_directory(schema: &Schema, format: Format, dir: &Path) -> Result<Written> {
    let ext = format.extension();
    let overview_name = format!("{}.{}", OVERVIEW_STEM, ext);
    let file_names = table_file_names(schema, ext, &overview_name)?;

    create_dir(dir)?;

    let mut written = Written::default();

    let overview_path = dir.join(&overview_name);
    write_file(&overview_path, &format.render_overview(schema))?;
    written.files.push(overview_path);

    for (table, file_name) in schema.iter().zip(file_names) {
        let incoming = incoming_relations(schema, &table.name);
        let path = dir.join(file_name);
        write_file(&path, &format.render_table(table, Some(&incoming)))?;
        written.files.push(path);
    }

    Ok(written)
}

/// Per-table file names in schema order, rejecting collisions
fn table_file_names(schema: &Schema, ext: &str, overview_name: &str) -> Result<Vec<String>> {
    let mut owners: AHashMap<String, &str> = AHashMap::new();
    let mut names = Vec::with_capacity(schema.len());

    for table in schema.iter() {
        let file_name = format!("{}.{}", sanitize_file_stem(&table.name), ext);
        if file_name == overview_name {
            return Err(Error::config(format!(
                "table '{}' would overwrite the overview document {}",
                table.name, overview_name
            )));
        }
        if let Some(other) = owners.insert(file_name.clone(), &table.name) {
            return Err(Error::config(format!(
                "tables '{}' and '{}' both map to file {}",
                other, table.name, file_name
            )));
        }
        names.push(file_name);
    }

    Ok(names)
}

/// Make a table name safe to use as a file stem inside the output directory
pub fn sanitize_file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();
    match stem.as_str() {
        "" | "." | ".." => stem.replace('.', "_") + "_",
        _ => stem,
    }
}

fn create_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| Error::write(dir.display(), e))
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    let file = File::create(path).map_err(|e| Error::write(path.display(), e))?;
    let mut writer = BufWriter::with_capacity(WRITER_BUFFER_SIZE, file);
    writer
        .write_all(contents.as_bytes())
        .and_then(|_| writer.flush())
        .map_err(|e| Error::write(path.display(), e))
}
