use anyhow::{anyhow, Context};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

pub const CLASS_NAME_FILE: &str = "class_info.txt";
pub const LOGO_FILE: &str = "school_logo.png";
pub const DEFAULT_CLASS_NAME: &str = "我的班級";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoFormat {
    Png,
    Jpeg,
}

impl LogoFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
        }
    }
}

/// Stored class label, or `default_name` when the file is absent, unreadable
/// or blank.
pub fn load_class_name(workspace: &Path, default_name: &str) -> String {
    let path = workspace.join(CLASS_NAME_FILE);
    match std::fs::read_to_string(&path) {
        Ok(text) => {
            let t = crate::csv::strip_bom(&text).trim();
            if t.is_empty() {
                default_name.to_string()
            } else {
                t.to_string()
            }
        }
        Err(e) => {
            if path.exists() {
                tracing::warn!(path = %path.display(), error = %e, "class label unreadable; using default");
            }
            default_name.to_string()
        }
    }
}

pub fn save_class_name(workspace: &Path, name: &str) -> anyhow::Result<String> {
    let t = name.trim();
    if t.is_empty() {
        return Err(anyhow!("class name must not be empty"));
    }
    std::fs::create_dir_all(workspace)
        .with_context(|| format!("failed to create directory {}", workspace.to_string_lossy()))?;
    let path = workspace.join(CLASS_NAME_FILE);
    std::fs::write(&path, t).with_context(|| format!("failed to write {}", path.to_string_lossy()))?;
    Ok(t.to_string())
}

pub fn logo_path(workspace: &Path) -> PathBuf {
    workspace.join(LOGO_FILE)
}

pub fn has_logo(workspace: &Path) -> bool {
    logo_path(workspace).is_file()
}

pub fn sniff_image(sig: &[u8]) -> Option<LogoFormat> {
    if sig.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        Some(LogoFormat::Png)
    } else if sig.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some(LogoFormat::Jpeg)
    } else {
        None
    }
}

fn read_signature(path: &Path) -> anyhow::Result<Vec<u8>> {
    let mut f = File::open(path)
        .with_context(|| format!("failed to open image {}", path.to_string_lossy()))?;
    let mut sig = [0u8; 4];
    let read = f.read(&mut sig).context("failed to read image signature")?;
    Ok(sig[..read].to_vec())
}

/// Copy a PNG or JPEG into the workspace as the class logo.
pub fn install_logo(workspace: &Path, source: &Path) -> anyhow::Result<LogoFormat> {
    let sig = read_signature(source)?;
    let Some(format) = sniff_image(&sig) else {
        return Err(anyhow!(
            "{} is not a PNG or JPEG image",
            source.to_string_lossy()
        ));
    };
    std::fs::create_dir_all(workspace)
        .with_context(|| format!("failed to create directory {}", workspace.to_string_lossy()))?;
    let dst = logo_path(workspace);
    std::fs::copy(source, &dst).with_context(|| {
        format!(
            "failed to copy logo from {} to {}",
            source.to_string_lossy(),
            dst.to_string_lossy()
        )
    })?;
    tracing::info!(path = %dst.display(), format = format.as_str(), "installed class logo");
    Ok(format)
}

/// Returns whether a logo was present.
pub fn clear_logo(workspace: &Path) -> anyhow::Result<bool> {
    let path = logo_path(workspace);
    if !path.exists() {
        return Ok(false);
    }
    std::fs::remove_file(&path)
        .with_context(|| format!("failed to remove {}", path.to_string_lossy()))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniff_known_signatures() {
        assert_eq!(sniff_image(&[0x89, b'P', b'N', b'G']), Some(LogoFormat::Png));
        assert_eq!(sniff_image(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(LogoFormat::Jpeg));
        assert_eq!(sniff_image(b"GIF8"), None);
        assert_eq!(sniff_image(&[0xFF]), None);
    }
}
