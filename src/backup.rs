use crate::classinfo::{CLASS_NAME_FILE, LOGO_FILE};
use crate::records::RECORDS_FILE;
use crate::roster::ROSTER_FILE;
use anyhow::{anyhow, Context};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use uuid::Uuid;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const MANIFEST_ENTRY: &str = "manifest.json";
const WORKSPACE_PREFIX: &str = "workspace/";
pub const BUNDLE_FORMAT_V1: &str = "attendance-workspace-v1";

/// Files carried by a bundle, in manifest order.
pub const WORKSPACE_FILES: [&str; 4] = [RECORDS_FILE, ROSTER_FILE, CLASS_NAME_FILE, LOGO_FILE];

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub bundle_format: String,
    pub bundle_id: String,
    pub files: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub bundle_format_detected: String,
    pub bundle_id: String,
    pub restored: Vec<String>,
    /// Workspace files the bundle did not carry, deleted so the workspace
    /// matches the bundle.
    pub removed: Vec<String>,
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

pub fn export_workspace_bundle(
    workspace_path: &Path,
    out_path: &Path,
) -> anyhow::Result<ExportSummary> {
    let mut present: Vec<(&str, Vec<u8>)> = Vec::new();
    for name in WORKSPACE_FILES {
        let p = workspace_path.join(name);
        if !p.is_file() {
            continue;
        }
        let bytes =
            std::fs::read(&p).with_context(|| format!("failed to read {}", p.to_string_lossy()))?;
        present.push((name, bytes));
    }

    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }
    let out_file = File::create(out_path).with_context(|| {
        format!(
            "failed to create output file {}",
            out_path.to_string_lossy()
        )
    })?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let bundle_id = Uuid::new_v4().to_string();
    let files_json: Vec<serde_json::Value> = present
        .iter()
        .map(|(name, bytes)| {
            json!({
                "name": name,
                "sha256": sha256_hex(bytes),
                "size": bytes.len(),
            })
        })
        .collect();
    let manifest = json!({
        "format": BUNDLE_FORMAT_V1,
        "bundleId": bundle_id,
        "appVersion": env!("CARGO_PKG_VERSION"),
        "exportedAt": chrono::Utc::now().to_rfc3339(),
        "sourceWorkspace": workspace_path.to_string_lossy(),
        "files": files_json,
    });
    zip.start_file(MANIFEST_ENTRY, opts)
        .context("failed to start manifest entry")?;
    zip.write_all(
        serde_json::to_string_pretty(&manifest)
            .context("failed to serialize manifest")?
            .as_bytes(),
    )
    .context("failed to write manifest entry")?;

    for (name, bytes) in &present {
        zip.start_file(format!("{WORKSPACE_PREFIX}{name}"), opts)
            .with_context(|| format!("failed to start entry {}", name))?;
        zip.write_all(bytes)
            .with_context(|| format!("failed to write entry {}", name))?;
    }

    zip.finish().context("failed to finalize zip bundle")?;
    tracing::info!(
        out = %out_path.display(),
        bundle_id = %bundle_id,
        files = present.len(),
        "exported workspace bundle"
    );

    Ok(ExportSummary {
        bundle_format: BUNDLE_FORMAT_V1.to_string(),
        bundle_id,
        files: present.iter().map(|(n, _)| n.to_string()).collect(),
    })
}

/// Restore a bundle into `workspace_path`. Every checksum is verified before
/// any workspace file is replaced. Workspace files the bundle does not carry
/// are removed afterwards.
pub fn import_workspace_bundle(
    in_path: &Path,
    workspace_path: &Path,
) -> anyhow::Result<ImportSummary> {
    if !is_zip_file(in_path)? {
        return Err(anyhow!(
            "{} is not a workspace bundle",
            in_path.to_string_lossy()
        ));
    }
    let in_file = File::open(in_path)
        .with_context(|| format!("failed to open bundle {}", in_path.to_string_lossy()))?;
    let mut archive = ZipArchive::new(in_file).context("invalid zip archive")?;

    let mut manifest_text = String::new();
    archive
        .by_name(MANIFEST_ENTRY)
        .context("bundle missing manifest.json")?
        .read_to_string(&mut manifest_text)
        .context("failed to read manifest.json")?;
    let manifest: serde_json::Value =
        serde_json::from_str(&manifest_text).context("manifest.json is invalid JSON")?;
    let format = manifest
        .get("format")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    if format != BUNDLE_FORMAT_V1 {
        return Err(anyhow!("unsupported bundle format: {}", format));
    }
    let bundle_id = manifest
        .get("bundleId")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();
    let Some(files) = manifest.get("files").and_then(|v| v.as_array()) else {
        return Err(anyhow!("manifest.json has no files list"));
    };

    let mut staged: Vec<(String, Vec<u8>)> = Vec::new();
    for f in files {
        let name = f.get("name").and_then(|v| v.as_str()).unwrap_or("");
        if !WORKSPACE_FILES.contains(&name) {
            return Err(anyhow!("bundle lists unexpected file: {:?}", name));
        }
        let expected = f.get("sha256").and_then(|v| v.as_str()).unwrap_or("");
        let mut bytes = Vec::new();
        archive
            .by_name(&format!("{WORKSPACE_PREFIX}{name}"))
            .with_context(|| format!("bundle missing {}", name))?
            .read_to_end(&mut bytes)
            .with_context(|| format!("failed to read {}", name))?;
        let actual = sha256_hex(&bytes);
        if actual != expected {
            return Err(anyhow!(
                "checksum mismatch for {}: expected={} actual={}",
                name,
                expected,
                actual
            ));
        }
        staged.push((name.to_string(), bytes));
    }

    std::fs::create_dir_all(workspace_path).with_context(|| {
        format!(
            "failed to create workspace {}",
            workspace_path.to_string_lossy()
        )
    })?;
    for (name, bytes) in &staged {
        let dst = workspace_path.join(name);
        let tmp_dst = workspace_path.join(format!("{name}.importing"));
        let mut out = File::create(&tmp_dst).with_context(|| {
            format!("failed to create temp file {}", tmp_dst.to_string_lossy())
        })?;
        out.write_all(bytes)
            .and_then(|_| out.flush())
            .with_context(|| format!("failed to write {}", tmp_dst.to_string_lossy()))?;
        drop(out);
        std::fs::rename(&tmp_dst, &dst).with_context(|| {
            format!("failed to move restored file to {}", dst.to_string_lossy())
        })?;
    }

    let mut removed: Vec<String> = Vec::new();
    for name in WORKSPACE_FILES {
        if staged.iter().any(|(n, _)| n == name) {
            continue;
        }
        let stale = workspace_path.join(name);
        if !stale.is_file() {
            continue;
        }
        std::fs::remove_file(&stale)
            .with_context(|| format!("failed to remove {}", stale.to_string_lossy()))?;
        removed.push(name.to_string());
    }
    tracing::info!(
        workspace = %workspace_path.display(),
        bundle_id = %bundle_id,
        files = staged.len(),
        removed = removed.len(),
        "imported workspace bundle"
    );

    Ok(ImportSummary {
        bundle_format_detected: BUNDLE_FORMAT_V1.to_string(),
        bundle_id,
        restored: staged.into_iter().map(|(n, _)| n).collect(),
        removed,
    })
}

fn is_zip_file(path: &Path) -> anyhow::Result<bool> {
    let mut f = File::open(path)
        .with_context(|| format!("failed to open input file {}", path.to_string_lossy()))?;
    let mut sig = [0u8; 4];
    let read = f.read(&mut sig).context("failed to read file signature")?;
    if read < 4 {
        return Ok(false);
    }
    Ok(sig == [0x50, 0x4B, 0x03, 0x04])
}
