//! Bulk import of DICOM files into the registry
//!
//! Headers are read on a rayon pool; placement and registration then run
//! on the calling thread so the registry is never shared across threads.
//! A root ending in `.zip` is unpacked to a scratch directory first and
//! its `.dcm` entries are imported like any other file.

use crate::error::{DcmIndexError, Result};
use crate::models::ParsedImage;
use crate::store::{RegisterOutcome, Registry, Storage, StorageMode};
use chrono::{Datelike, Local, NaiveDate};
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;
use zip::ZipArchive;

/// Offset of the `DICM` magic in a Part 10 file
const PREAMBLE_LENGTH: usize = 128;

#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Only import the `<year>/<month>/<day>` sub-directory for today
    pub today_only: bool,

    /// Header reader threads; 0 lets rayon decide
    pub max_parallel: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of an import run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportSummary {
    pub created: usize,
    pub existing: usize,
    pub failed: Vec<ImportFailure>,
}

impl ImportSummary {
    pub fn total(&self) -> usize {
        self.created + self.existing + self.failed.len()
    }
}

/// Appends `<year>/<month>/<day>` (no zero padding) to `root`
pub fn dated_root(root: &Path, date: NaiveDate) -> PathBuf {
    root.join(date.year().to_string())
        .join(date.month().to_string())
        .join(date.day().to_string())
}

/// Checks for the `DICM` magic after the 128-byte preamble
pub fn is_dicom_file(path: &Path) -> bool {
    let mut file = match File::open(path) {
        Ok(f) => f,
        Err(_) => return false,
    };
    let mut buffer = [0u8; PREAMBLE_LENGTH + 4];
    match file.read_exact(&mut buffer) {
        Ok(()) => &buffer[PREAMBLE_LENGTH..] == b"DICM",
        Err(_) => false,
    }
}

fn is_candidate(path: &Path) -> bool {
    match path.extension() {
        Some(ext) => ext.eq_ignore_ascii_case("dcm") || ext.eq_ignore_ascii_case("dicom"),
        None => is_dicom_file(path),
    }
}

/// Recursively collects DICOM files under `path`, sorted
///
/// Accepts `.dcm` / `.dicom` files and extension-less files carrying the
/// `DICM` magic. A file path is returned as-is when it qualifies. Symbolic
/// links are not followed.
pub fn collect_dicom_files(path: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(path).follow_links(false) {
        let entry = entry.map_err(io::Error::from)?;
        if entry.file_type().is_file() && is_candidate(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

fn is_archive(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
}

/// Unpacks the `.dcm` entries of a zip archive below `dest`, sorted
///
/// Entries whose names would escape `dest` are skipped.
pub fn extract_zip(archive: &Path, dest: &Path) -> Result<Vec<PathBuf>> {
    let mut zip = ZipArchive::new(File::open(archive)?)?;
    let mut files = Vec::new();
    for index in 0..zip.len() {
        let mut entry = zip.by_index(index)?;
        let name = match entry.enclosed_name() {
            Some(name) => name,
            None => {
                warn!("Skipping unsafe entry {} in {}", entry.name(), archive.display());
                continue;
            }
        };
        let is_dcm = name
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("dcm"));
        if !entry.is_file() || !is_dcm {
            continue;
        }

        let target = dest.join(name);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        io::copy(&mut entry, &mut File::create(&target)?)?;
        files.push(target);
    }
    files.sort();
    debug!("Extracted {} files from {}", files.len(), archive.display());
    Ok(files)
}

/// Reads every header on a pool of `max_parallel` threads
fn parse_all(files: &[PathBuf], max_parallel: usize) -> Result<Vec<(PathBuf, Result<ParsedImage>)>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(max_parallel)
        .build()
        .map_err(|e| DcmIndexError::ConfigError(format!("import thread pool: {}", e)))?;
    Ok(pool.install(|| {
        files
            .par_iter()
            .map(|path| (path.clone(), ParsedImage::from_file(path)))
            .collect()
    }))
}

/// Places and registers one parsed file
fn import_one(
    registry: &mut Registry,
    storage: &Storage,
    source: &Path,
    parsed: ParsedImage,
) -> Result<RegisterOutcome> {
    if let Some(existing) = registry.image_by_uid(&parsed.image.uid) {
        return Ok(RegisterOutcome::Existing(existing.id));
    }
    registry.check_hierarchy(&parsed)?;
    let stored = storage.place(source, &parsed)?;
    registry.register(parsed, stored)
}

/// Imports every DICOM file found under `roots`
///
/// Per-file failures are logged and collected; they do not stop the run.
///
/// # Errors
///
/// Fails only when a root cannot be read, a scratch directory cannot be
/// created or the thread pool cannot be built. A corrupt archive is
/// recorded as a failure.
pub fn import_paths(
    registry: &mut Registry,
    storage: &Storage,
    roots: &[PathBuf],
    options: &ImportOptions,
) -> Result<ImportSummary> {
    let today = Local::now().date_naive();
    let mut summary = ImportSummary::default();
    let mut files = Vec::new();
    // Extracted archives live until every file has been placed
    let mut scratch: Vec<TempDir> = Vec::new();
    for root in roots {
        if is_archive(root) {
            if storage.mode() == StorageMode::InPlace {
                warn!("Skipping {}: archives cannot be imported in place", root.display());
                summary.failed.push(ImportFailure {
                    path: root.clone(),
                    reason: "archives cannot be imported in place".to_string(),
                });
                continue;
            }
            let dir = tempfile::tempdir()?;
            match extract_zip(root, dir.path()) {
                Ok(extracted) => files.extend(extracted),
                Err(e) => {
                    warn!("Skipping {}: {}", root.display(), e);
                    summary.failed.push(ImportFailure {
                        path: root.clone(),
                        reason: e.to_string(),
                    });
                }
            }
            scratch.push(dir);
            continue;
        }

        let root = if options.today_only {
            dated_root(root, today)
        } else {
            root.clone()
        };
        if !root.exists() {
            warn!("Skipping missing path {}", root.display());
            continue;
        }
        files.extend(collect_dicom_files(&root)?);
    }
    info!("Found {} DICOM files", files.len());

    for (path, parsed) in parse_all(&files, options.max_parallel)? {
        let outcome = parsed.and_then(|parsed| import_one(registry, storage, &path, parsed));
        match outcome {
            Ok(RegisterOutcome::Created(id)) => {
                debug!("Imported {} as image #{}", path.display(), id);
                summary.created += 1;
            }
            Ok(RegisterOutcome::Existing(id)) => {
                debug!("{} is already registered as image #{}", path.display(), id);
                summary.existing += 1;
            }
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                summary.failed.push(ImportFailure {
                    path,
                    reason: e.to_string(),
                });
            }
        }
    }

    drop(scratch);
    info!(
        "Import finished: {} created, {} existing, {} failed",
        summary.created,
        summary.existing,
        summary.failed.len()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::tests::{mr_object, write_dicom};
    use tempfile::tempdir;

    fn write_series(dir: &Path) {
        fs::create_dir_all(dir.join("nested")).unwrap();
        let mut second = mr_object("P1", "1.1", "1.1.1", "1.1.1.2");
        second.put(dicom_core::DataElement::new(
            crate::extraction::INSTANCE_NUMBER,
            dicom_core::VR::IS,
            dicom_core::PrimitiveValue::from("2"),
        ));
        write_dicom(mr_object("P1", "1.1", "1.1.1", "1.1.1.1"), &dir.join("a.dcm"));
        write_dicom(second, &dir.join("nested").join("IM0002"));
    }

    #[test]
    fn test_dated_root() {
        let date = NaiveDate::from_ymd_opt(2021, 3, 7).unwrap();
        assert_eq!(
            dated_root(Path::new("/incoming"), date),
            PathBuf::from("/incoming/2021/3/7")
        );
    }

    #[test]
    fn test_collect_dicom_files() {
        let dir = tempdir().unwrap();
        write_series(dir.path());
        fs::write(dir.path().join("notes.txt"), b"text").unwrap();
        fs::write(dir.path().join("short"), b"DICM").unwrap();
        fs::write(dir.path().join("UPPER.DCM"), b"").unwrap();

        let files = collect_dicom_files(dir.path()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["UPPER.DCM", "a.dcm", "IM0002"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_collect_ignores_symlink_loops() {
        let dir = tempdir().unwrap();
        let incoming = dir.path().join("incoming");
        write_series(&incoming);
        std::os::unix::fs::symlink(&incoming, incoming.join("nested").join("loop")).unwrap();
        std::os::unix::fs::symlink(incoming.join("a.dcm"), incoming.join("link.dcm")).unwrap();

        let files = collect_dicom_files(&incoming).unwrap();
        assert_eq!(files, vec![incoming.join("a.dcm"), incoming.join("nested/IM0002")]);
    }

    fn write_zip(path: &Path, entries: &[(&str, PathBuf)]) {
        let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        for (name, source) in entries {
            writer.start_file(*name, options).unwrap();
            std::io::Write::write_all(&mut writer, &fs::read(source).unwrap()).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_import_zip_archive() {
        let dir = tempdir().unwrap();
        let incoming = dir.path().join("incoming");
        write_series(&incoming);
        fs::write(incoming.join("notes.txt"), b"text").unwrap();
        let archive = dir.path().join("upload.zip");
        write_zip(
            &archive,
            &[
                ("study/a.dcm", incoming.join("a.dcm")),
                ("study/b.DCM", incoming.join("nested/IM0002")),
                ("study/IM0002", incoming.join("nested/IM0002")),
                ("notes.txt", incoming.join("notes.txt")),
            ],
        );

        let storage = Storage::new(dir.path().join("root"), StorageMode::Move);
        let mut registry = Registry::new();
        let summary =
            import_paths(&mut registry, &storage, &[archive.clone()], &ImportOptions::default())
                .unwrap();
        assert_eq!(summary.created, 2);
        assert!(summary.failed.is_empty());
        assert!(archive.exists());
        assert!(dir.path().join("root/MRI/P1/1.1.1/DICOM/1.dcm").exists());
        assert!(dir.path().join("root/MRI/P1/1.1.1/DICOM/2.dcm").exists());
    }

    #[test]
    fn test_zip_failures_are_recorded() {
        let dir = tempdir().unwrap();
        let corrupt = dir.path().join("corrupt.zip");
        fs::write(&corrupt, b"not a zip").unwrap();
        let copy = Storage::new(dir.path().join("root"), StorageMode::Copy);
        let mut registry = Registry::new();
        let summary =
            import_paths(&mut registry, &copy, &[corrupt.clone()], &ImportOptions::default())
                .unwrap();
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].path, corrupt);

        let incoming = dir.path().join("incoming");
        write_series(&incoming);
        let archive = dir.path().join("upload.zip");
        write_zip(&archive, &[("a.dcm", incoming.join("a.dcm"))]);
        let in_place = Storage::new(dir.path().join("root"), StorageMode::InPlace);
        let summary =
            import_paths(&mut registry, &in_place, &[archive], &ImportOptions::default()).unwrap();
        assert_eq!(summary.created, 0);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(registry.counts().images, 0);
    }

    #[test]
    fn test_import_and_reimport() {
        let dir = tempdir().unwrap();
        let incoming = dir.path().join("incoming");
        write_series(&incoming);
        fs::write(incoming.join("broken.dcm"), b"not dicom").unwrap();

        let storage = Storage::new(dir.path().join("root"), StorageMode::Copy);
        let mut registry = Registry::new();
        let options = ImportOptions {
            today_only: false,
            max_parallel: 2,
        };

        let summary = import_paths(&mut registry, &storage, &[incoming.clone()], &options).unwrap();
        assert_eq!(summary.created, 2);
        assert_eq!(summary.existing, 0);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.total(), 3);

        let counts = registry.counts();
        assert_eq!((counts.patients, counts.studies, counts.series, counts.images), (1, 1, 1, 2));
        assert!(dir.path().join("root/MRI/P1/1.1.1/DICOM/1.dcm").exists());
        assert!(dir.path().join("root/MRI/P1/1.1.1/DICOM/2.dcm").exists());

        let again = import_paths(&mut registry, &storage, &[incoming], &options).unwrap();
        assert_eq!(again.created, 0);
        assert_eq!(again.existing, 2);
        assert_eq!(registry.counts().images, 2);
    }

    #[test]
    fn test_today_only_skips_missing_directory() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("root"), StorageMode::Copy);
        let mut registry = Registry::new();
        let options = ImportOptions {
            today_only: true,
            max_parallel: 0,
        };
        let summary =
            import_paths(&mut registry, &storage, &[dir.path().to_path_buf()], &options).unwrap();
        assert_eq!(summary, ImportSummary::default());
    }

    #[test]
    fn test_today_only_reads_dated_directory() {
        let dir = tempdir().unwrap();
        let today = dated_root(dir.path(), Local::now().date_naive());
        write_series(&today);

        let storage = Storage::new(dir.path().join("root"), StorageMode::InPlace);
        let mut registry = Registry::new();
        let options = ImportOptions {
            today_only: true,
            max_parallel: 1,
        };
        let summary =
            import_paths(&mut registry, &storage, &[dir.path().to_path_buf()], &options).unwrap();
        assert_eq!(summary.created, 2);
    }
}
