//! Subcommand implementations
//!
//! Every command returns its rendered output so the binary only has to
//! print it.

use super::report::{self, TextReport};
use super::{Cli, Command, OutputFormat};
use crate::config::Settings;
use crate::error::{DcmIndexError, Result};
use crate::filters::{FilterSet, ImageFilter, QueryParams, SeriesFilter};
use crate::header::{keyword_of, snapshot_to_json, Header, HeaderValue, TagOrKeyword};
use crate::import::{import_paths, ImportOptions, ImportSummary};
use crate::models::{DicomEntity, Patient};
use crate::server::serializers;
use crate::store::{default_relative_path, uid_file_name, Registry, Storage, StorageMode};
use log::{debug, info};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Runs the parsed command line and returns what should be printed
pub fn run(cli: &Cli) -> Result<String> {
    let mut settings = Settings::load(&cli.config)?;
    if let Some(root) = &cli.root {
        settings.storage.root = root.clone();
    }
    debug!("Storage root: {}", settings.storage.root.display());

    let format = cli.format;
    match &cli.command {
        Command::Init => init(&settings, format),
        Command::Import {
            paths,
            today_only,
            max_parallel,
            mode,
        } => {
            let options = ImportOptions {
                today_only: *today_only,
                max_parallel: max_parallel.unwrap_or(settings.import.max_parallel),
            };
            let mode = mode.map(StorageMode::from).unwrap_or(settings.storage.mode);
            import(&settings, paths, mode, &options, format)
        }
        Command::Patients => {
            let registry = open_registry(&settings)?;
            Ok(render_rows(
                registry.patients.iter(),
                format,
                report::patient_line,
                serializers::patient,
            ))
        }
        Command::Studies => {
            let registry = open_registry(&settings)?;
            Ok(render_rows(
                registry.studies.iter(),
                format,
                report::study_line,
                serializers::study,
            ))
        }
        Command::Series { query } => {
            let registry = open_registry(&settings)?;
            let filter = SeriesFilter::from_query(&QueryParams::parse(query)?)?;
            Ok(render_rows(
                filter.apply(&registry, registry.series.iter()),
                format,
                report::series_line,
                serializers::series,
            ))
        }
        Command::Images { series } => {
            let registry = open_registry(&settings)?;
            if let Some(id) = series {
                registry.get_series(*id)?;
            }
            let filter = ImageFilter {
                series_id: *series,
                ..Default::default()
            };
            Ok(render_rows(
                filter.apply(&registry, registry.images.iter()),
                format,
                report::image_line,
                serializers::image,
            ))
        }
        Command::Show { id } => show(&settings, *id, format),
        Command::Header { id, keyword, raw } => {
            header(&settings, *id, keyword.as_deref(), *raw, format)
        }
        Command::Export { patient, dest } => export(&settings, patient, dest, format),
    }
}

fn open_registry(settings: &Settings) -> Result<Registry> {
    let path = settings.registry_path();
    if !path.exists() {
        return Err(DcmIndexError::ConfigError(format!(
            "no registry at {}; run `dcmindex init` first",
            path.display()
        )));
    }
    Registry::load(&path)
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn render_rows<'a, T: 'a>(
    rows: impl IntoIterator<Item = &'a T>,
    format: OutputFormat,
    line: fn(&T) -> String,
    render: fn(&T) -> Value,
) -> String {
    match format {
        OutputFormat::Text => rows.into_iter().map(line).collect::<Vec<_>>().join("\n"),
        OutputFormat::Json => pretty(&Value::Array(rows.into_iter().map(render).collect())),
    }
}

fn init(settings: &Settings, format: OutputFormat) -> Result<String> {
    fs::create_dir_all(&settings.storage.root)?;
    let path = settings.registry_path();
    let registry = if path.exists() {
        info!("Registry already exists at {}", path.display());
        Registry::load(&path)?
    } else {
        let registry = Registry::new();
        registry.save(&path)?;
        info!("Created registry at {}", path.display());
        registry
    };

    let counts = registry.counts();
    Ok(match format {
        OutputFormat::Text => format!(
            "Registry {}: {} patients, {} studies, {} series, {} images",
            path.display(),
            counts.patients,
            counts.studies,
            counts.series,
            counts.images
        ),
        OutputFormat::Json => pretty(&json!({ "registry": path, "counts": counts })),
    })
}

fn import(
    settings: &Settings,
    paths: &[PathBuf],
    mode: StorageMode,
    options: &ImportOptions,
    format: OutputFormat,
) -> Result<String> {
    let registry_path = settings.registry_path();
    let mut registry = Registry::load_or_default(&registry_path)?;
    let storage = Storage::new(settings.storage.root.clone(), mode);

    let summary = import_paths(&mut registry, &storage, paths, options)?;
    registry.save(&registry_path)?;

    Ok(match format {
        OutputFormat::Text => import_text(&summary),
        OutputFormat::Json => pretty(&serde_json::to_value(&summary)?),
    })
}

fn import_text(summary: &ImportSummary) -> String {
    let mut lines = vec![format!(
        "{} created, {} existing, {} failed",
        summary.created,
        summary.existing,
        summary.failed.len()
    )];
    lines.extend(
        summary
            .failed
            .iter()
            .map(|f| format!("  {}: {}", f.path.display(), f.reason)),
    );
    lines.join("\n")
}

fn show(settings: &Settings, id: u64, format: OutputFormat) -> Result<String> {
    let registry = open_registry(settings)?;
    let series = registry.get_series(id)?;
    let images = registry.images_of_series(id).len();

    Ok(match format {
        OutputFormat::Text => TextReport::new(
            series,
            registry.studies.get(series.study_id),
            registry.patients.get(series.patient_id),
            images,
        )
        .to_string(),
        OutputFormat::Json => {
            let mut value = serializers::series(series);
            value["images"] = json!(images);
            pretty(&value)
        }
    })
}

fn header(
    settings: &Settings,
    id: u64,
    keyword: Option<&str>,
    raw: bool,
    format: OutputFormat,
) -> Result<String> {
    let registry = open_registry(settings)?;
    let image = registry.get_image(id)?;

    let values: Vec<(String, HeaderValue)> = if raw {
        let header = Header::open(settings.storage().resolve(&image.path))?;
        match keyword {
            Some(k) => vec![(k.to_string(), header.require(k)?)],
            None => header.snapshot().into_iter().collect(),
        }
    } else {
        match keyword {
            Some(k) => {
                let name = TagOrKeyword::from(k)
                    .resolve()
                    .and_then(keyword_of)
                    .unwrap_or_else(|| k.to_string());
                let value = image
                    .header
                    .get(&name)
                    .cloned()
                    .ok_or_else(|| DcmIndexError::TagNotFound(k.to_string()))?;
                vec![(name, value)]
            }
            None => image.header.clone().into_iter().collect(),
        }
    };

    Ok(match format {
        OutputFormat::Text => values
            .iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect::<Vec<_>>()
            .join("\n"),
        OutputFormat::Json => pretty(&snapshot_to_json(&values.into_iter().collect())),
    })
}

/// Copies a patient's files under `dest` in the storage layout
fn export(settings: &Settings, uid: &str, dest: &Path, format: OutputFormat) -> Result<String> {
    let registry = open_registry(settings)?;
    let storage = settings.storage();
    let patient = registry
        .patient_by_uid(uid)
        .ok_or_else(|| DcmIndexError::not_found(Patient::NAME, uid))?;

    let mut exported = Vec::new();
    let mut taken: HashSet<PathBuf> = HashSet::new();
    for series in registry.series_of_patient(patient.id) {
        for image in registry.images_of_series(series.id) {
            // images sharing an instance number are named after their uid
            let mut target = dest.join(default_relative_path(&patient.uid, &series.uid, image));
            if taken.contains(&target) {
                target.set_file_name(uid_file_name(image));
            }
            if !taken.insert(target.clone()) {
                return Err(DcmIndexError::InvalidValue(format!(
                    "two images export to {}",
                    target.display()
                )));
            }
            exported.push(storage.create_backup(image, &target)?);
        }
    }
    info!("Exported {} files of {} to {}", exported.len(), uid, dest.display());

    Ok(match format {
        OutputFormat::Text => format!("Exported {} files to {}", exported.len(), dest.display()),
        OutputFormat::Json => pretty(&json!({ "patient": uid, "files": exported })),
    })
}
