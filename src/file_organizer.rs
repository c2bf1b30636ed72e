//! Organization engine: walks a directory tree, classifies every file and
//! moves it into `<root>/<Category>/`, or only reports the move in dry-run
//! mode.

use crate::config::CompiledFilters;
use crate::file_category::ExtensionTable;
use crate::logging::ActivityLog;
use crate::output::OutputFormatter;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;
use walkdir::WalkDir;

/// Errors raised by the organizer.
///
/// Only the root errors abort a run; the others are collected per file
/// into [`RunReport::failures`].
#[derive(Debug, Error)]
pub enum OrganizeError {
    #[error("invalid root directory {}: {source}", path.display())]
    InvalidRoot { path: PathBuf, source: io::Error },
    #[error("{} is not a directory", path.display())]
    NotADirectory { path: PathBuf },
    #[error("failed to create directory {}: {source}", path.display())]
    DirectoryCreationFailed { path: PathBuf, source: io::Error },
    #[error("failed to move {} to {}: {source}", from.display(), to.display())]
    FileMoveFailure {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
}

pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// A file selected for organization.
#[derive(Debug, Clone)]
struct FileEntry {
    path: PathBuf,
    name: OsString,
}

/// Destination paths already claimed during one run.
///
/// Owned by a single [`Organizer::organize`] call and dropped with it.
#[derive(Debug, Default)]
pub struct PlannedPaths {
    claimed: HashSet<PathBuf>,
}

impl PlannedPaths {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.claimed.contains(path)
    }

    pub fn claim(&mut self, path: PathBuf) {
        self.claimed.insert(path);
    }
}

/// Returns the first of `stem.ext`, `stem_1.ext`, `stem_2.ext`, ... that
/// neither exists on disk nor was already claimed in `planned`.
///
/// Dangling symlinks count as existing.
pub fn resolve_duplicate(candidate: &Path, planned: &PlannedPaths) -> PathBuf {
    let is_free = |path: &Path| !planned.contains(path) && fs::symlink_metadata(path).is_err();

    if is_free(candidate) {
        return candidate.to_path_buf();
    }

    let parent = candidate.parent().unwrap_or_else(|| Path::new(""));
    let stem = candidate.file_stem().unwrap_or_default();

    let mut counter: u64 = 1;
    loop {
        let mut name = stem.to_os_string();
        name.push(format!("_{counter}"));
        if let Some(ext) = candidate.extension() {
            name.push(".");
            name.push(ext);
        }
        let path = parent.join(name);
        if is_free(path.as_path()) {
            return path;
        }
        counter += 1;
    }
}

/// A resolved move: where a file goes and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveDecision {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub category: String,
}

impl MoveDecision {
    /// Final file name at the destination.
    pub fn final_name(&self) -> String {
        self.destination
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Human-readable report line, with the source shown relative to `root`.
    pub fn describe(&self, root: &Path) -> String {
        let relative = self.source.strip_prefix(root).unwrap_or(self.source.as_path());
        format!(
            "Would move '{}' to '{}/{}'",
            relative.display(),
            self.category,
            self.final_name()
        )
    }
}

/// A file that could not be organized.
#[derive(Debug, Clone, Serialize)]
pub struct FailedMove {
    pub source: PathBuf,
    pub destination: Option<PathBuf>,
    pub reason: String,
}

/// Outcome of one organize run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub root: PathBuf,
    pub dry_run: bool,
    pub started_at: DateTime<Local>,
    /// Regular files seen during traversal.
    pub scanned: usize,
    /// Files left alone: already in a category folder, or filtered out.
    pub skipped: usize,
    /// Moves performed, or planned in dry-run mode.
    pub moved: Vec<MoveDecision>,
    pub failures: Vec<FailedMove>,
    /// Entries the traversal could not read.
    pub warnings: Vec<String>,
    /// Moves per category, in table order.
    pub category_counts: Vec<(String, usize)>,
}

impl RunReport {
    fn new(root: &Path, dry_run: bool, table: &ExtensionTable) -> Self {
        Self {
            root: root.to_path_buf(),
            dry_run,
            started_at: Local::now(),
            scanned: 0,
            skipped: 0,
            moved: Vec::new(),
            failures: Vec::new(),
            warnings: Vec::new(),
            category_counts: table
                .category_names()
                .into_iter()
                .map(|name| (name.to_string(), 0))
                .collect(),
        }
    }

    fn record_move(&mut self, decision: MoveDecision) {
        if let Some((_, count)) = self
            .category_counts
            .iter_mut()
            .find(|(name, _)| *name == decision.category)
        {
            *count += 1;
        }
        self.moved.push(decision);
    }

    /// Files that were eligible for organization.
    pub fn eligible(&self) -> usize {
        self.moved.len() + self.failures.len()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// "organized N of M files", or "would organize ..." in dry-run mode.
    pub fn summary_line(&self) -> String {
        let verb = if self.dry_run { "would organize" } else { "organized" };
        format!("{} {} of {} files", verb, self.moved.len(), self.eligible())
    }
}

/// Moves `from` to `to`, copying and deleting when they sit on different
/// devices.
///
/// A failed cross-device move leaves only the source behind: the copy is
/// deleted again when either the copy or the removal of the source fails.
pub fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => copy_then_remove(from, to),
        Err(e) => Err(e),
    }
}

/// `to` must not exist beforehand; it is removed on any failure.
fn copy_then_remove(from: &Path, to: &Path) -> io::Result<()> {
    if let Err(copy_error) = fs::copy(from, to) {
        let _ = fs::remove_file(to);
        return Err(copy_error);
    }
    if let Err(remove_error) = fs::remove_file(from) {
        let _ = fs::remove_file(to);
        return Err(remove_error);
    }
    Ok(())
}

/// Sorts files under a root into category folders.
///
/// # Examples
///
/// ```no_run
/// use sortbox::file_category::ExtensionTable;
/// use sortbox::file_organizer::Organizer;
/// use sortbox::logging::TracingLog;
/// use std::path::Path;
///
/// let log = TracingLog;
/// let organizer = Organizer::new(ExtensionTable::default(), &log);
/// let report = organizer.organize(Path::new("/home/me/Downloads"), true)?;
/// println!("{}", report.summary_line());
/// # Ok::<(), sortbox::file_organizer::OrganizeError>(())
/// ```
pub struct Organizer<'a> {
    table: ExtensionTable,
    filters: CompiledFilters,
    log: &'a dyn ActivityLog,
    console: bool,
    progress: bool,
}

impl<'a> Organizer<'a> {
    /// Creates an organizer with no filters, no console output and no
    /// progress bar.
    pub fn new(table: ExtensionTable, log: &'a dyn ActivityLog) -> Self {
        Self {
            table,
            filters: CompiledFilters::accept_all(),
            log,
            console: false,
            progress: false,
        }
    }

    pub fn with_filters(mut self, filters: CompiledFilters) -> Self {
        self.filters = filters;
        self
    }

    /// Print one line per planned move in dry-run mode.
    pub fn with_console(mut self, console: bool) -> Self {
        self.console = console;
        self
    }

    /// Show a progress bar while moving files.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Organizes every eligible file under `root`.
    ///
    /// In dry-run mode nothing on disk changes: no folders are created and
    /// no files move, but every decision is logged and reported. In live mode
    /// a failing file is recorded in the report and the run continues.
    ///
    /// Fails only when `root` is missing or is not a directory.
    pub fn organize(&self, root: &Path, dry_run: bool) -> OrganizeResult<RunReport> {
        let metadata = fs::metadata(root).map_err(|source| OrganizeError::InvalidRoot {
            path: root.to_path_buf(),
            source,
        })?;
        if !metadata.is_dir() {
            return Err(OrganizeError::NotADirectory {
                path: root.to_path_buf(),
            });
        }

        let mut report = RunReport::new(root, dry_run, &self.table);
        let mut planned = PlannedPaths::new();

        self.log.info(&format!(
            "Organizing '{}'{}",
            root.display(),
            if dry_run { " (dry-run)" } else { "" }
        ));

        let files = self.collect_files(root, &mut report);

        let progress = (self.progress && !dry_run && !files.is_empty())
            .then(|| OutputFormatter::create_progress_bar(files.len() as u64));

        for file in files {
            if let Some(pb) = &progress {
                pb.set_message(file.name.to_string_lossy().into_owned());
            }

            match self.organize_file(root, &file, dry_run, &mut planned) {
                Ok(decision) => {
                    if dry_run {
                        if self.console {
                            OutputFormatter::dry_run_notice(&decision.describe(root));
                        }
                        self.log.info(&format!(
                            "[DRY-RUN] '{}' -> '{}/{}'",
                            decision.source.display(),
                            decision.category,
                            decision.final_name()
                        ));
                    } else {
                        self.log.info(&format!(
                            "Moved '{}' to '{}/{}'",
                            decision.source.display(),
                            decision.category,
                            decision.final_name()
                        ));
                    }
                    report.record_move(decision);
                }
                Err(failure) => {
                    self.log.error(&format!(
                        "Failed to organize '{}': {}",
                        failure.source.display(),
                        failure.reason
                    ));
                    report.failures.push(failure);
                }
            }

            if let Some(pb) = &progress {
                pb.inc(1);
            }
        }

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        self.log.info(&format!("Finished: {}", report.summary_line()));
        Ok(report)
    }

    /// Snapshots the eligible files under `root` before anything moves.
    fn collect_files(&self, root: &Path, report: &mut RunReport) -> Vec<FileEntry> {
        let mut files = Vec::new();

        let walker = WalkDir::new(root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let message = format!("Skipping unreadable entry: {}", e);
                    self.log.warn(&message);
                    report.warnings.push(message);
                    continue;
                }
            };

            // Directories are only descended into; symlinks are never
            // followed or moved.
            if !entry.file_type().is_file() {
                continue;
            }
            report.scanned += 1;

            let path = entry.into_path();

            let in_category_folder = path
                .parent()
                .and_then(Path::file_name)
                .map(|parent| self.table.is_category_name(&parent.to_string_lossy()))
                .unwrap_or(false);
            if in_category_folder {
                report.skipped += 1;
                continue;
            }

            let relative = path.strip_prefix(root).unwrap_or(path.as_path());
            if !self.filters.should_include(&path, relative) {
                self.log
                    .record(Level::DEBUG, &format!("Filtered out '{}'", path.display()));
                report.skipped += 1;
                continue;
            }

            let Some(name) = path.file_name().map(|name| name.to_os_string()) else {
                continue;
            };
            files.push(FileEntry { path, name });
        }

        files
    }

    /// Classifies one file, resolves its destination and, in live mode,
    /// moves it.
    fn organize_file(
        &self,
        root: &Path,
        file: &FileEntry,
        dry_run: bool,
        planned: &mut PlannedPaths,
    ) -> Result<MoveDecision, FailedMove> {
        let category = self.table.classify(&file.path).to_string();
        let target_dir = root.join(&category);

        prepare_folder(&target_dir, dry_run).map_err(|e| FailedMove {
            source: file.path.clone(),
            destination: None,
            reason: e.to_string(),
        })?;

        let destination = resolve_duplicate(&target_dir.join(&file.name), planned);
        planned.claim(destination.clone());

        let decision = MoveDecision {
            source: file.path.clone(),
            destination,
            category,
        };

        if !dry_run {
            move_file(&decision.source, &decision.destination).map_err(|source| {
                let error = OrganizeError::FileMoveFailure {
                    from: decision.source.clone(),
                    to: decision.destination.clone(),
                    source,
                };
                FailedMove {
                    source: decision.source.clone(),
                    destination: Some(decision.destination.clone()),
                    reason: error.to_string(),
                }
            })?;
        }

        Ok(decision)
    }
}

/// Creates `folder` if needed. Succeeds when it already exists.
///
/// In dry-run mode nothing is created, but a non-directory already sitting
/// at `folder` fails the same way the live run would.
fn prepare_folder(folder: &Path, dry_run: bool) -> OrganizeResult<()> {
    if !dry_run {
        return fs::create_dir_all(folder).map_err(|source| {
            OrganizeError::DirectoryCreationFailed {
                path: folder.to_path_buf(),
                source,
            }
        });
    }

    match fs::metadata(folder) {
        Ok(metadata) if !metadata.is_dir() => Err(OrganizeError::DirectoryCreationFailed {
            path: folder.to_path_buf(),
            source: io::Error::from(io::ErrorKind::AlreadyExists),
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::MemoryLog;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(path, path.to_string_lossy().as_bytes()).expect("Failed to write test file");
    }

    #[test]
    fn test_resolve_duplicate_returns_candidate_when_free() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let candidate = temp_dir.path().join("a.txt");

        assert_eq!(resolve_duplicate(&candidate, &PlannedPaths::new()), candidate);
    }

    #[test]
    fn test_resolve_duplicate_checks_disk() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let candidate = temp_dir.path().join("a.txt");
        touch(&candidate);
        touch(&temp_dir.path().join("a_1.txt"));

        assert_eq!(
            resolve_duplicate(&candidate, &PlannedPaths::new()),
            temp_dir.path().join("a_2.txt")
        );
    }

    #[test]
    fn test_resolve_duplicate_checks_planned_paths() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let candidate = temp_dir.path().join("a.txt");

        let mut planned = PlannedPaths::new();
        planned.claim(candidate.clone());
        assert_eq!(
            resolve_duplicate(&candidate, &planned),
            temp_dir.path().join("a_1.txt")
        );

        // Disk and planned set are combined on every step.
        touch(&temp_dir.path().join("a_1.txt"));
        planned.claim(temp_dir.path().join("a_2.txt"));
        assert_eq!(
            resolve_duplicate(&candidate, &planned),
            temp_dir.path().join("a_3.txt")
        );
    }

    #[test]
    fn test_resolve_duplicate_name_shapes() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();

        for name in ["archive.tar.gz", "Makefile", ".bashrc"] {
            touch(&dir.join(name));
        }

        let planned = PlannedPaths::new();
        assert_eq!(
            resolve_duplicate(&dir.join("archive.tar.gz"), &planned),
            dir.join("archive.tar_1.gz")
        );
        assert_eq!(
            resolve_duplicate(&dir.join("Makefile"), &planned),
            dir.join("Makefile_1")
        );
        assert_eq!(
            resolve_duplicate(&dir.join(".bashrc"), &planned),
            dir.join(".bashrc_1")
        );
    }

    #[test]
    fn test_resolve_duplicate_handles_many_collisions() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let candidate = temp_dir.path().join("x.bin");

        let mut planned = PlannedPaths::new();
        for _ in 0..250 {
            let next = resolve_duplicate(&candidate, &planned);
            assert!(!planned.contains(&next));
            planned.claim(next);
        }

        assert_eq!(
            resolve_duplicate(&candidate, &planned),
            temp_dir.path().join("x_250.bin")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_duplicate_keeps_non_utf8_name_bytes() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = Path::new("/data/Documents");
        let candidate = dir.join(OsStr::from_bytes(b"caf\xe9.txt"));

        let mut planned = PlannedPaths::new();
        planned.claim(candidate.clone());

        let resolved = resolve_duplicate(&candidate, &planned);
        assert_eq!(resolved, dir.join(OsStr::from_bytes(b"caf\xe9_1.txt")));
    }

    #[test]
    fn test_move_decision_describe() {
        let decision = MoveDecision {
            source: PathBuf::from("/data/inbox/report.pdf"),
            destination: PathBuf::from("/data/Documents/report_1.pdf"),
            category: "Documents".to_string(),
        };

        assert_eq!(decision.final_name(), "report_1.pdf");
        assert_eq!(
            decision.describe(Path::new("/data")),
            "Would move 'inbox/report.pdf' to 'Documents/report_1.pdf'"
        );
    }

    #[test]
    fn test_organize_rejects_missing_root() {
        let log = MemoryLog::new();
        let organizer = Organizer::new(ExtensionTable::default(), &log);

        let result = organizer.organize(Path::new("/non/existent/path"), false);
        assert!(matches!(result, Err(OrganizeError::InvalidRoot { .. })));
    }

    #[test]
    fn test_organize_rejects_file_root() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let file = temp_dir.path().join("file.txt");
        touch(&file);

        let log = MemoryLog::new();
        let organizer = Organizer::new(ExtensionTable::default(), &log);

        let result = organizer.organize(&file, true);
        assert!(matches!(result, Err(OrganizeError::NotADirectory { .. })));
        assert!(log.records().is_empty());
    }

    #[test]
    fn test_live_run_moves_and_logs() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        touch(&root.join("photo.jpg"));
        touch(&root.join("notes.md"));

        let log = MemoryLog::new();
        let report = Organizer::new(ExtensionTable::default(), &log)
            .organize(root, false)
            .expect("organize should succeed");

        assert!(root.join("Images/photo.jpg").is_file());
        assert!(root.join("Documents/notes.md").is_file());
        assert_eq!(report.summary_line(), "organized 2 of 2 files");

        let infos = log.messages_at(Level::INFO);
        assert!(
            infos
                .iter()
                .any(|m| m.starts_with("Moved '") && m.ends_with("' to 'Images/photo.jpg'"))
        );
        assert!(log.messages_at(Level::ERROR).is_empty());
    }

    #[test]
    fn test_dry_run_logs_planned_moves_without_touching_disk() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        touch(&root.join("song.mp3"));
        touch(&root.join("inbox/song.mp3"));

        let log = MemoryLog::new();
        let report = Organizer::new(ExtensionTable::default(), &log)
            .organize(root, true)
            .expect("organize should succeed");

        assert!(!root.join("Audio").exists());
        assert_eq!(report.summary_line(), "would organize 2 of 2 files");

        // "inbox" sorts before "song.mp3", so the nested file claims the name first.
        let names: Vec<_> = report.moved.iter().map(MoveDecision::final_name).collect();
        assert_eq!(names, vec!["song.mp3", "song_1.mp3"]);

        let dry_lines: Vec<_> = log
            .messages_at(Level::INFO)
            .into_iter()
            .filter(|m| m.starts_with("[DRY-RUN]"))
            .collect();
        assert_eq!(dry_lines.len(), 2);
        assert!(dry_lines[0].ends_with("-> 'Audio/song.mp3'"));
        assert!(dry_lines[1].ends_with("-> 'Audio/song_1.mp3'"));
    }

    #[test]
    fn test_category_counts_follow_table_order() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        touch(&root.join("a.zip"));
        touch(&root.join("b.pdf"));
        touch(&root.join("c.pdf"));
        touch(&root.join("d.unknown"));

        let log = MemoryLog::new();
        let report = Organizer::new(ExtensionTable::default(), &log)
            .organize(root, true)
            .expect("organize should succeed");

        let non_zero: Vec<_> = report
            .category_counts
            .iter()
            .filter(|(_, count)| *count > 0)
            .map(|(name, count)| (name.as_str(), *count))
            .collect();
        assert_eq!(
            non_zero,
            vec![("Documents", 2), ("Archives", 1), ("Others", 1)]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_not_followed_or_moved() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        touch(&root.join("real/file.txt"));
        std::os::unix::fs::symlink(root, root.join("real/loop")).expect("Failed to create symlink");
        std::os::unix::fs::symlink(root.join("real/file.txt"), root.join("link.txt"))
            .expect("Failed to create symlink");

        let log = MemoryLog::new();
        let report = Organizer::new(ExtensionTable::default(), &log)
            .organize(root, false)
            .expect("organize should succeed");

        assert_eq!(report.scanned, 1);
        assert!(root.join("Documents/file.txt").is_file());
        assert!(fs::symlink_metadata(root.join("link.txt")).is_ok());
        assert!(fs::symlink_metadata(root.join("real/loop")).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_move_does_not_stop_the_run() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        touch(&root.join("locked/a.txt"));
        touch(&root.join("b.jpg"));

        // Removing write permission on the parent makes renaming out of it fail.
        let locked = root.join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o555))
            .expect("Failed to set permissions");

        // Root ignores permission bits; nothing to assert in that case.
        let probe = locked.join("probe");
        if fs::write(&probe, b"x").is_ok() {
            let _ = fs::remove_file(&probe);
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).ok();
            return;
        }

        let log = MemoryLog::new();
        let report = Organizer::new(ExtensionTable::default(), &log)
            .organize(root, false)
            .expect("organize should succeed");

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755))
            .expect("Failed to restore permissions");

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].source, root.join("locked/a.txt"));
        assert!(root.join("locked/a.txt").is_file());
        assert!(root.join("Images/b.jpg").is_file());
        assert_eq!(report.summary_line(), "organized 1 of 2 files");
        assert_eq!(log.messages_at(Level::ERROR).len(), 1);
        assert!(!report.is_complete_success());
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_is_a_warning() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        touch(&root.join("sealed/hidden.txt"));
        touch(&root.join("photo.jpg"));
        touch(&root.join("open/notes.md"));

        let sealed = root.join("sealed");
        fs::set_permissions(&sealed, fs::Permissions::from_mode(0o000))
            .expect("Failed to set permissions");

        // Root ignores permission bits; nothing to assert in that case.
        if fs::read_dir(&sealed).is_ok() {
            fs::set_permissions(&sealed, fs::Permissions::from_mode(0o755)).ok();
            return;
        }

        let log = MemoryLog::new();
        let report = Organizer::new(ExtensionTable::default(), &log)
            .organize(root, false)
            .expect("organize should succeed");

        fs::set_permissions(&sealed, fs::Permissions::from_mode(0o755))
            .expect("Failed to restore permissions");

        assert_eq!(report.warnings.len(), 1);
        assert_eq!(log.messages_at(Level::WARN).len(), 1);
        assert!(report.is_complete_success());
        assert!(root.join("Images/photo.jpg").is_file());
        assert!(root.join("Documents/notes.md").is_file());
        assert!(root.join("sealed/hidden.txt").is_file());
        assert_eq!(report.summary_line(), "organized 2 of 2 files");
    }

    #[test]
    fn test_dry_run_reports_folder_blocked_by_a_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        touch(&root.join("Images"));
        touch(&root.join("inbox/photo.jpg"));

        let log = MemoryLog::new();
        let report = Organizer::new(ExtensionTable::default(), &log)
            .organize(root, true)
            .expect("organize should succeed");

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].source, root.join("inbox/photo.jpg"));
        assert!(report.failures[0].destination.is_none());
        assert_eq!(log.messages_at(Level::ERROR).len(), 1);
        assert!(root.join("Images").is_file());
    }

    #[test]
    fn test_filtered_files_are_logged_through_the_activity_log() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        touch(&root.join("keep.txt"));
        touch(&root.join("skip.tmp"));

        let filters = crate::config::Config::from_toml("[filters.exclude]\nextensions = [\"tmp\"]\n")
            .and_then(|config| config.compile_filters())
            .expect("Failed to build filters");

        let log = MemoryLog::new();
        let report = Organizer::new(ExtensionTable::default(), &log)
            .with_filters(filters)
            .organize(root, true)
            .expect("organize should succeed");

        assert_eq!(report.skipped, 1);
        let debug = log.messages_at(Level::DEBUG);
        assert_eq!(debug.len(), 1);
        assert!(debug[0].starts_with("Filtered out '") && debug[0].ends_with("skip.tmp'"));
    }

    #[test]
    fn test_failed_copy_leaves_no_partial_destination() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let from = temp_dir.path().join("from.txt");
        let to = temp_dir.path().join("missing/to.txt");
        fs::write(&from, "payload").expect("Failed to write test file");

        assert!(copy_then_remove(&from, &to).is_err());

        assert_eq!(fs::read_to_string(&from).unwrap(), "payload");
        assert!(fs::symlink_metadata(&to).is_err());
    }

    #[test]
    fn test_copy_then_remove_moves_content() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let from = temp_dir.path().join("from.txt");
        let to = temp_dir.path().join("to.txt");
        fs::write(&from, "payload").expect("Failed to write test file");

        copy_then_remove(&from, &to).expect("copy should succeed");

        assert!(!from.exists());
        assert_eq!(fs::read_to_string(&to).unwrap(), "payload");
    }

    #[test]
    fn test_move_file_within_device() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let from = temp_dir.path().join("from.txt");
        let to = temp_dir.path().join("to.txt");
        fs::write(&from, "payload").expect("Failed to write test file");

        move_file(&from, &to).expect("move should succeed");

        assert!(!from.exists());
        assert_eq!(fs::read_to_string(&to).unwrap(), "payload");
    }

    #[test]
    fn test_move_file_missing_source_errors() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let result = move_file(
            &temp_dir.path().join("missing"),
            &temp_dir.path().join("dest"),
        );
        assert!(result.is_err());
    }
}
