use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("failed to create model cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine model cache directory")]
    NoCacheDir,
}

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

/// Resolves a model file by name, searching local locations before
/// downloading: the user cache directory first, then an optional bundled
/// directory (pre-packaged installs), then a download into the cache.
pub fn resolve(
    name: &str,
    url: &str,
    bundled_dir: Option<&Path>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    let cache_dir = model_cache_dir()?;

    let mut candidates = vec![cache_dir.join(name)];
    if let Some(dir) = bundled_dir {
        candidates.push(dir.join(name));
    }
    if let Some(found) = candidates.into_iter().find(|p| p.exists()) {
        return Ok(found);
    }

    fs::create_dir_all(&cache_dir).map_err(ModelResolveError::CacheDir)?;
    let dest = cache_dir.join(name);
    log::info!("downloading model {name} from {url}");
    download(url, &dest, progress)?;
    Ok(dest)
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/VidScribe/models/`
/// - Linux: `$XDG_CACHE_HOME/VidScribe/models/` or `~/.cache/VidScribe/models/`
/// - Windows: `%LOCALAPPDATA%/VidScribe/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    let base = if cfg!(target_os = "macos") {
        dirs::data_dir()
    } else {
        dirs::cache_dir()
    };
    base.map(|d| d.join("VidScribe").join("models"))
        .ok_or(ModelResolveError::NoCacheDir)
}

fn download(url: &str, dest: &Path, progress: Option<ProgressFn>) -> Result<(), ModelResolveError> {
    let map_download = |e: reqwest::Error| ModelResolveError::Download {
        url: url.to_string(),
        source: e,
    };

    let response = reqwest::blocking::get(url).map_err(map_download)?;
    let total = response.content_length().unwrap_or(0);
    let bytes = response.bytes().map_err(map_download)?;

    // Write to a temp file first, then rename, so an interrupted download
    // never leaves a truncated model in the cache.
    let temp_path = dest.with_extension("part");
    let map_write = |path: &Path| {
        let path = path.to_path_buf();
        move |e: std::io::Error| ModelResolveError::Write { path, source: e }
    };

    let mut file = fs::File::create(&temp_path).map_err(map_write(&temp_path))?;
    let mut written: u64 = 0;
    for chunk in bytes.chunks(1024 * 1024) {
        file.write_all(chunk).map_err(map_write(&temp_path))?;
        written += chunk.len() as u64;
        if let Some(ref cb) = progress {
            cb(written, total);
        }
    }
    file.flush().map_err(map_write(&temp_path))?;
    drop(file);

    fs::rename(&temp_path, dest).map_err(map_write(dest))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_model_cache_dir_under_app_dir() {
        let dir = model_cache_dir().unwrap();
        assert!(dir.to_string_lossy().contains("VidScribe"));
        assert!(dir.ends_with("models"));
    }

    #[test]
    fn test_resolve_prefers_bundled_file_over_download() {
        let tmp = TempDir::new().unwrap();
        let bundled = tmp.path().join("bundled");
        fs::create_dir_all(&bundled).unwrap();
        fs::write(bundled.join("fake-model.onnx"), b"weights").unwrap();

        // The URL is unreachable, so success proves the bundled path won.
        let resolved = resolve(
            "fake-model.onnx",
            "http://invalid.nonexistent.example.com/model",
            Some(&bundled),
            None,
        );
        // The user cache may legitimately contain the name on a dev machine;
        // either local source is acceptable, a download attempt is not.
        assert!(resolved.is_ok());
        assert!(resolved.unwrap().exists());
    }

    #[test]
    fn test_download_invalid_url_returns_error() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("model.onnx");
        let result = download("http://invalid.nonexistent.example.com/model", &dest, None);
        assert!(matches!(result, Err(ModelResolveError::Download { .. })));
    }

    #[test]
    fn test_download_failure_leaves_no_partial_file() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("model.onnx");
        let _ = download("http://invalid.nonexistent.example.com/model", &dest, None);
        assert!(!dest.exists());
        assert!(!dest.with_extension("part").exists());
    }
}
