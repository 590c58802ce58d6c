//! Utility functions
//!
use std::{
    fs::File,
    io::Cursor,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use reqwest::Client;

/// Download a file from a URL to a given filepath.
pub async fn download_file(
    client: &Client,
    url: &str,
    filepath: impl AsRef<std::path::Path>,
) -> Result<()> {
    let resp = client.get(url).send().await?.error_for_status()?;

    let mut file = File::create(filepath)?;
    let mut content = Cursor::new(resp.bytes().await?);
    std::io::copy(&mut content, &mut file)?;

    Ok(())
}

/// Directory where downloaded models are cached.
pub fn model_cache_dir() -> Result<PathBuf> {
    let dir = dirs::cache_dir()
        .context("no cache directory on this platform")?
        .join("asl_server");
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;

    Ok(dir)
}

/// Resolve a model file, downloading it into the cache directory if it is missing locally.
pub async fn ensure_model(path: &Path, url: Option<&str>) -> Result<PathBuf> {
    if path.exists() {
        return Ok(path.to_owned());
    }

    let Some(url) = url else {
        bail!("model {} not found and no download URL given", path.display());
    };

    let file_name = path
        .file_name()
        .with_context(|| format!("invalid model path {}", path.display()))?;
    let cached = model_cache_dir()?.join(file_name);
    if cached.exists() {
        log::info!("Using cached model {}", cached.display());
        return Ok(cached);
    }

    log::info!("Downloading model from {} to {}", url, cached.display());
    download_file(&Client::new(), url, &cached).await?;

    Ok(cached)
}
