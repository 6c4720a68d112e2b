use crate::catalog::{self, parse_database_url, redact_url};
use crate::config::ExtractYamlConfig;
use crate::extract::SchemaExtractor;
use crate::output::{self, OutputConfig, OutputMode};
use crate::render::Format;
use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

/// Raw flags of the extract command
pub struct ExtractArgs {
    pub url: Option<String>,
    pub schema: Option<String>,
    pub tables: Option<String>,
    pub exclude: Option<String>,
    pub format: Option<String>,
    pub output: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub split_threshold: Option<usize>,
    pub config: Option<PathBuf>,
    pub progress: bool,
    pub json: bool,
}

/// JSON output for the extract command
#[derive(Serialize)]
struct ExtractJsonOutput {
    backend: String,
    url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    schema: Option<String>,
    format: String,
    mode: &'static str,
    statistics: ExtractStatistics,
    tables: Vec<String>,
    files: Vec<String>,
    warnings: Vec<String>,
}

#[derive(Serialize)]
struct ExtractStatistics {
    tables_extracted: usize,
    tables_excluded: usize,
    columns: usize,
    relations: usize,
    indexes: usize,
    elapsed_secs: f64,
}

/// Flags merged with the optional YAML file; flags win
struct Settings {
    url: String,
    schema: Option<String>,
    tables: Vec<String>,
    exclude: Vec<String>,
    output: OutputConfig,
}

fn split_list(list: Option<String>) -> Option<Vec<String>> {
    list.map(|l| {
        l.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
}

fn resolve(args: &mut ExtractArgs) -> anyhow::Result<Settings> {
    let file = match &args.config {
        Some(path) => ExtractYamlConfig::load(path)
            .with_context(|| format!("failed to load config: {}", path.display()))?,
        None => ExtractYamlConfig::default(),
    };

    let url = args
        .url
        .take()
        .or(file.url)
        .context("a database URL is required (--url or `url:` in the config file)")?;

    let format: Format = args
        .format
        .take()
        .or(file.format)
        .map(|f| f.parse())
        .transpose()
        .map_err(|e: String| anyhow::anyhow!(e))?
        .unwrap_or_default();

    // An output flag given on the command line replaces both file settings
    let (output, output_dir) = if args.output.is_some() || args.output_dir.is_some() {
        (args.output.take(), args.output_dir.take())
    } else {
        (file.output, file.output_dir)
    };

    let output = OutputConfig::new(
        format,
        output,
        output_dir,
        args.split_threshold.or(file.split_threshold).unwrap_or(0),
    )?;

    if args.json && !output.writes_files() {
        anyhow::bail!("--json requires --output or --output-dir (stdout carries the schema)");
    }

    Ok(Settings {
        url,
        schema: args.schema.take().or(file.schema),
        tables: split_list(args.tables.take()).unwrap_or(file.tables),
        exclude: split_list(args.exclude.take()).unwrap_or(file.exclude),
        output,
    })
}

pub fn run(mut args: ExtractArgs) -> anyhow::Result<()> {
    let settings = resolve(&mut args)?;
    let json = args.json;

    // Reject bad URLs before connecting
    let (backend, _) = parse_database_url(&settings.url)?;
    let display_url = redact_url(&settings.url);

    if !json {
        eprintln!("Extracting schema: {} [backend: {}]", display_url, backend);
        if !settings.tables.is_empty() {
            eprintln!("Tables: {}", settings.tables.join(", "));
        }
        if !settings.exclude.is_empty() {
            eprintln!("Excluding: {}", settings.exclude.join(", "));
        }
    }

    let start_time = Instant::now();

    let adapter = catalog::connect(&settings.url, settings.schema.as_deref())?;
    let mut extractor = SchemaExtractor::new(adapter).with_tables(settings.tables.clone());

    let extraction = if args.progress && !json {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} tables {msg}",
            )
            .unwrap()
            .progress_chars("█▓▒░  ")
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        let pb_clone = pb.clone();
        extractor = extractor.with_progress(move |done, total, table| {
            pb_clone.set_length(total as u64);
            pb_clone.set_position(done as u64);
            pb_clone.set_message(table.to_string());
        });

        let extraction = extractor.extract();
        pb.finish_and_clear();
        extraction?
    } else {
        extractor.extract()?
    };

    let mut schema = extraction.schema;
    let stats = extraction.stats;

    let before = schema.len();
    schema.exclude(&settings.exclude);
    let excluded = before - schema.len();

    let written = output::emit(&schema, &settings.output)?;
    let elapsed = start_time.elapsed();

    let mode = if settings.output.splits(schema.len()) {
        "multi"
    } else {
        "single"
    };

    if json {
        let output_json = ExtractJsonOutput {
            backend: backend.to_string(),
            url: display_url,
            schema: settings.schema.clone(),
            format: settings.output.format().to_string(),
            mode,
            statistics: ExtractStatistics {
                tables_extracted: schema.len(),
                tables_excluded: excluded,
                columns: stats.columns,
                relations: stats.relations,
                indexes: stats.indexes,
                elapsed_secs: elapsed.as_secs_f64(),
            },
            tables: schema.iter().map(|t| t.name.clone()).collect(),
            files: written
                .files
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
            warnings: stats.warnings,
        };
        println!("{}", serde_json::to_string_pretty(&output_json)?);
        return Ok(());
    }

    for warning in &stats.warnings {
        eprintln!("warning: {}", warning);
    }

    match settings.output.mode() {
        OutputMode::Single { path: None } => {}
        OutputMode::Single { path: Some(path) } => {
            eprintln!("Schema written to: {}", path.display());
        }
        OutputMode::Multi { dir, .. } => {
            eprintln!(
                "Schema written to: {} ({} files, {} mode)",
                dir.display(),
                written.files.len(),
                mode
            );
        }
    }
    eprintln!(
        "Extracted {} tables in {:.3?}",
        schema.len(),
        elapsed
    );

    Ok(())
}
