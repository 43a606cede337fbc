//! Writes downloaded chart artifacts to durable storage.
//!
//! Files land under a configured output directory (created on first use)
//! under the artifact's display filename. The final name is claimed with an
//! atomic `create_new` open and the bytes go through a temporary name and a
//! rename, so a failed write never leaves a truncated file at the final path.
//! Name collisions are disambiguated with a numeric suffix, never overwritten,
//! including between concurrent saves.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::ArtifactError;

pub struct ArtifactStore {
    out_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    /// Persists `bytes` under `filename` (or the first free `name (n).ext`
    /// variant) and returns the final path.
    pub async fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, ArtifactError> {
        let filename = sanitize(filename);
        let write_err = |source| ArtifactError::Write {
            filename: filename.clone(),
            source,
        };

        tokio::fs::create_dir_all(&self.out_dir)
            .await
            .map_err(write_err)?;

        let target = reserve(&self.out_dir, &filename).await.map_err(write_err)?;
        let tmp = self
            .out_dir
            .join(format!(".{}.{}.partial", filename, Uuid::new_v4()));

        if let Err(source) = tokio::fs::write(&tmp, bytes).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            let _ = tokio::fs::remove_file(&target).await;
            return Err(write_err(source));
        }
        if let Err(source) = tokio::fs::rename(&tmp, &target).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            let _ = tokio::fs::remove_file(&target).await;
            return Err(write_err(source));
        }

        Ok(target)
    }
}

// Strips any path components the runner may have put in the display name.
fn sanitize(filename: &str) -> String {
    Path::new(filename)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "artifact".to_string())
}

// Claims the first free path for `filename` in `dir`: the name itself, then
// "stem (1).ext", "stem (2).ext", ... The claim is a `create_new` open, which
// is atomic at the filesystem level, so concurrent saves of the same display
// name always land on distinct paths. The claimed (empty) file is replaced by
// the rename in `save`, or removed if the write fails.
async fn reserve(dir: &Path, filename: &str) -> Result<PathBuf, std::io::Error> {
    let path = Path::new(filename);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.to_string());
    let extension = path.extension().map(|e| e.to_string_lossy().into_owned());

    for n in 0u32.. {
        let name = if n == 0 {
            filename.to_string()
        } else {
            match &extension {
                Some(ext) => format!("{stem} ({n}).{ext}"),
                None => format!("{stem} ({n})"),
            }
        };
        let candidate = dir.join(&name);
        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
            .await
        {
            Ok(_) => return Ok(candidate),
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(err) => return Err(err),
        }
    }
    unreachable!("ran out of disambiguation suffixes");
}
