use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::LibrarySettings;
use crate::error::ScanError;
use crate::events::{Event, EventBus, ScanProgress};

use super::extract::extract_track;
use super::model::TrackRecord;

pub(super) fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    let exts: Vec<String> = settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Walks a directory tree and extracts every supported audio file, one at a time.
///
/// Cloning yields a handle to the same scanner, so a worker thread can run a
/// scan while the owner keeps the ability to shut it down.
#[derive(Clone)]
pub struct Scanner {
    settings: LibrarySettings,
    events: EventBus,
    shut_down: Arc<AtomicBool>,
}

impl Scanner {
    pub fn new(settings: LibrarySettings, events: EventBus) -> Self {
        Self {
            settings,
            events,
            shut_down: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Stop delivering events; a scan in flight bails out at the next file.
    pub fn shutdown(&self) {
        self.shut_down.store(true, Ordering::Release);
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    fn emit(&self, event: Event) {
        if !self.is_shut_down() {
            self.events.emit(event);
        }
    }

    /// Scan `root` recursively.
    ///
    /// Per-file failures are reported as status events and skipped. Only a bad
    /// root or a permission error while listing directories fails the scan.
    /// Results keep the filesystem enumeration order.
    pub fn scan(&self, root: &Path) -> Result<Vec<TrackRecord>, ScanError> {
        if self.is_shut_down() {
            return Err(ScanError::ShutDown);
        }

        self.emit(Event::ScanStatus(format!("Scanning {}...", root.display())));
        info!(root = %root.display(), "scan started");

        let files = self.collect_candidates(root)?;
        let total = files.len();
        let mut tracks = Vec::with_capacity(total);

        for (i, path) in files.iter().enumerate() {
            if self.is_shut_down() {
                info!(root = %root.display(), processed = i, "scan abandoned on shutdown");
                return Err(ScanError::ShutDown);
            }

            let file_name = display_name(path);
            match extract_track(path) {
                Ok(track) => tracks.push(track),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable file");
                    self.emit(Event::ScanStatus(format!("Error processing {file_name}: {e}")));
                }
            }

            self.emit(Event::ScanProgress(ScanProgress::new(i + 1, total, file_name)));

            // Let observers catch up between files.
            thread::yield_now();
        }

        let done = format!("Scan complete: {} tracks found", tracks.len());
        info!(root = %root.display(), tracks = tracks.len(), files = total, "scan finished");
        self.emit(Event::ScanStatus(done));
        Ok(tracks)
    }

    /// List supported files under `root` in enumeration order.
    fn collect_candidates(&self, root: &Path) -> Result<Vec<PathBuf>, ScanError> {
        let meta = match root.metadata() {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                return Err(ScanError::PermissionDenied(root.to_path_buf()));
            }
            Err(_) => return Err(ScanError::NotFound(root.to_path_buf())),
        };
        if !meta.is_dir() {
            return Err(ScanError::NotADirectory(root.to_path_buf()));
        }

        let settings = &self.settings;
        let walker = WalkDir::new(root).follow_links(settings.follow_links);

        let mut files = Vec::new();
        for entry in walker
            .into_iter()
            .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let at = err
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| root.to_path_buf());
                    if err
                        .io_error()
                        .is_some_and(|io| io.kind() == io::ErrorKind::PermissionDenied)
                    {
                        return Err(ScanError::PermissionDenied(at));
                    }
                    warn!(path = %at.display(), error = %err, "skipping unreadable entry");
                    continue;
                }
            };

            if entry.file_type().is_file() && is_audio_file(entry.path(), settings) {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }
}
