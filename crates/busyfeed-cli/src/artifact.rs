//! Output artifact writing.
//!
//! Writing the artifact is the one step whose failure aborts the run: a
//! feed that cannot be published is a failed run, unlike a skipped
//! resource.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

/// Errors raised while writing the artifact.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// The output directory could not be created.
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The artifact file could not be written.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Writes the serialized feed, creating the output directory if needed.
///
/// Returns the full path of the written artifact.
pub fn write_artifact(
    directory: &Path,
    filename: &str,
    contents: &[u8],
) -> Result<PathBuf, ArtifactError> {
    std::fs::create_dir_all(directory).map_err(|e| ArtifactError::CreateDir {
        path: directory.to_path_buf(),
        source: e,
    })?;

    let path = directory.join(filename);
    std::fs::write(&path, contents).map_err(|e| ArtifactError::Write {
        path: path.clone(),
        source: e,
    })?;

    info!(path = %path.display(), bytes = contents.len(), "Wrote artifact");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_into_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_artifact(dir.path(), "busy.ics", b"BEGIN:VCALENDAR\r\n").unwrap();

        assert_eq!(path, dir.path().join("busy.ics"));
        assert_eq!(
            std::fs::read(&path).unwrap(),
            b"BEGIN:VCALENDAR\r\n".to_vec()
        );
    }

    #[test]
    fn creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("feeds").join("public");

        let path = write_artifact(&nested, "busy.ics", b"data").unwrap();

        assert!(path.exists());
        assert_eq!(path, nested.join("busy.ics"));
    }

    #[test]
    fn overwrites_previous_artifact() {
        let dir = tempfile::tempdir().unwrap();
        write_artifact(dir.path(), "busy.ics", b"old").unwrap();
        let path = write_artifact(dir.path(), "busy.ics", b"new").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"new".to_vec());
    }

    #[test]
    fn directory_path_through_a_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let result = write_artifact(&blocker.join("nested"), "busy.ics", b"data");
        assert!(matches!(result, Err(ArtifactError::CreateDir { .. })));
    }
}
