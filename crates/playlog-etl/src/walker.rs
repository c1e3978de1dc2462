//! Input discovery and the per-file transaction loop.

use playlog_core::Transactional;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{EtlError, EtlResult};

/// How the walker selects files and reacts to bad ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkOptions {
    /// File extension to pick up, without the dot.
    pub extension: String,
    /// Roll back and continue past malformed files instead of stopping.
    pub skip_malformed: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            extension: "json".to_string(),
            skip_malformed: false,
        }
    }
}

/// Outcome of one walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkSummary {
    pub found: usize,
    pub processed: usize,
    pub skipped: usize,
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension))
}

/// Recursively list the files under `root` with the given extension, sorted.
pub fn discover_files(root: &Path, extension: &str) -> EtlResult<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(EtlError::MissingDirectory(root.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type().is_file() && has_extension(path, extension) {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

/// Run `pipeline` over every input file under `root`, one transaction per
/// file.
///
/// A file is committed as soon as its pipeline call returns. A failing file
/// is rolled back; the error ends the walk unless it is a malformed record
/// and `skip_malformed` is set. Files committed earlier stay committed.
pub fn process_data<S, T, F>(
    store: &mut S,
    root: &Path,
    options: &WalkOptions,
    mut pipeline: F,
) -> EtlResult<WalkSummary>
where
    S: Transactional + ?Sized,
    F: FnMut(&mut S, &Path) -> EtlResult<T>,
{
    let files = discover_files(root, &options.extension)?;
    let mut summary = WalkSummary {
        found: files.len(),
        ..WalkSummary::default()
    };
    log::info!("{} files found in {}", summary.found, root.display());

    for (index, file) in files.iter().enumerate() {
        store.begin()?;
        match pipeline(store, file.as_path()) {
            Ok(_) => {
                store.commit()?;
                summary.processed += 1;
            }
            Err(e) => {
                store.rollback()?;
                if options.skip_malformed && e.is_malformed() {
                    log::warn!("Skipping {}: {}", file.display(), e);
                    summary.skipped += 1;
                } else {
                    return Err(e);
                }
            }
        }
        log::info!("{}/{} files processed.", index + 1, summary.found);
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::song::process_song_file;
    use playlog_core::MemoryStore;
    use std::fs;
    use tempfile::TempDir;

    fn song_line(song_id: &str, artist_id: &str) -> String {
        format!(
            r#"{{"artist_id": "{artist_id}", "artist_name": "Artist {artist_id}", "song_id": "{song_id}", "title": "Title {song_id}", "duration": 200.5, "year": 1999}}"#
        )
    }

    #[test]
    fn test_discover_files_is_recursive_and_sorted() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("A").join("B");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("b.json"), "").unwrap();
        fs::write(dir.path().join("a.json"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        fs::write(nested.join("c.JSON"), "").unwrap();

        let files = discover_files(dir.path(), "json").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("A/B/b.json"),
                PathBuf::from("A/B/c.JSON"),
                PathBuf::from("a.json"),
            ]
        );
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let err = discover_files(Path::new("/nonexistent/song_data"), "json").unwrap_err();
        assert!(matches!(err, EtlError::MissingDirectory(_)));
    }

    #[test]
    fn test_process_data_commits_each_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("1.json"), song_line("SO1", "AR1")).unwrap();
        fs::write(dir.path().join("2.json"), song_line("SO2", "AR2")).unwrap();

        let mut store = MemoryStore::new();
        let summary = process_data(&mut store, dir.path(), &WalkOptions::default(), |s, p| {
            process_song_file(s, p)
        })
        .unwrap();

        assert_eq!(
            summary,
            WalkSummary {
                found: 2,
                processed: 2,
                skipped: 0
            }
        );
        assert_eq!(store.counts().songs, 2);
    }

    #[test]
    fn test_malformed_file_stops_walk_and_keeps_earlier_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("1.json"), song_line("SO1", "AR1")).unwrap();
        fs::write(dir.path().join("2.json"), "{not json").unwrap();
        fs::write(dir.path().join("3.json"), song_line("SO3", "AR3")).unwrap();

        let mut store = MemoryStore::new();
        let err = process_data(&mut store, dir.path(), &WalkOptions::default(), |s, p| {
            process_song_file(s, p)
        })
        .unwrap_err();

        assert!(err.is_malformed());
        assert!(store.song("SO1").is_some());
        assert!(store.song("SO3").is_none());
    }

    #[test]
    fn test_skip_malformed_continues() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("1.json"), song_line("SO1", "AR1")).unwrap();
        fs::write(dir.path().join("2.json"), "{not json").unwrap();
        fs::write(dir.path().join("3.json"), song_line("SO3", "AR3")).unwrap();

        let options = WalkOptions {
            skip_malformed: true,
            ..WalkOptions::default()
        };
        let mut store = MemoryStore::new();
        let summary =
            process_data(&mut store, dir.path(), &options, |s, p| process_song_file(s, p)).unwrap();

        assert_eq!(summary.processed, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(store.counts().songs, 2);
    }
}
