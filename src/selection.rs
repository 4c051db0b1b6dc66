use crate::{analyzer::SelectedFile, config::Config};
use anyhow::{Context, Result};
use std::path::Path;

pub fn load_selection(cfg: &Config, path: &Path) -> Result<SelectedFile> {
    let bytes = std::fs::read(path).with_context(|| format!("reading input: {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default();

    if cfg.selection.validate {
        if !cfg
            .selection
            .allowed_extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(&ext))
        {
            anyhow::bail!("input is not an allowed image type: {}", path.display());
        }
        if bytes.is_empty() {
            anyhow::bail!("input is empty: {}", path.display());
        }
        let max = cfg.selection.max_file_bytes;
        if max > 0 && bytes.len() as u64 > max {
            anyhow::bail!("input exceeds max_file_bytes ({max}): {}", bytes.len());
        }
    }

    Ok(SelectedFile {
        name,
        media_type: media_type_for(&ext).to_string(),
        bytes,
    })
}

pub fn media_type_for(ext: &str) -> &'static str {
    match ext {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "tif" | "tiff" => "image/tiff",
        _ => "application/octet-stream",
    }
}
