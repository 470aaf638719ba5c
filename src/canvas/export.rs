use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

/// File name offered when the player downloads a drawing, e.g.
/// `artdraw-level-3-madhubani.png`.
pub fn download_filename(level: u32, predicted_style: Option<&str>) -> String {
    match predicted_style.map(slugify).filter(|slug| !slug.is_empty()) {
        Some(style) => format!("artdraw-level-{level}-{style}.png"),
        None => format!("artdraw-level-{level}.png"),
    }
}

pub fn save_png(dir: &Path, file_name: &str, png: &[u8]) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create download dir {}", dir.display()))?;
    let path = dir.join(file_name);
    fs::write(&path, png).with_context(|| format!("Failed to write drawing to {}", path.display()))?;
    Ok(path)
}

fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    for ch in value.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}
