use anyhow::{anyhow, Context};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const MANIFEST_ENTRY: &str = "manifest.json";
const RECORDS_ENTRY: &str = "records.json";
const REPORTS_ENTRY: &str = "reports.json";
pub const BUNDLE_FORMAT_V1: &str = "pkas-report-v1";

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub bundle_format: String,
    pub entry_count: usize,
    pub record_count: usize,
}

#[derive(Debug, Clone)]
pub struct VerifySummary {
    pub bundle_format: String,
    pub scope: String,
    pub record_count: usize,
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Writes the "Unduh laporan" bundle: the scoped health records, the monthly
/// rollups and a manifest carrying a checksum per entry.
pub fn export_report_bundle(
    out_path: &Path,
    scope: &str,
    records: &[Value],
    reports: &[Value],
) -> anyhow::Result<ExportSummary> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }

    let records_bytes =
        serde_json::to_vec_pretty(records).context("failed to serialize records")?;
    let reports_bytes =
        serde_json::to_vec_pretty(reports).context("failed to serialize reports")?;

    let manifest = json!({
        "format": BUNDLE_FORMAT_V1,
        "version": 1,
        "appVersion": env!("CARGO_PKG_VERSION"),
        "exportedAt": chrono::Utc::now().to_rfc3339(),
        "scope": scope,
        "recordCount": records.len(),
        "entries": {
            RECORDS_ENTRY: sha256_hex(&records_bytes),
            REPORTS_ENTRY: sha256_hex(&reports_bytes),
        },
    });

    let out_file = File::create(out_path).with_context(|| {
        format!(
            "failed to create output file {}",
            out_path.to_string_lossy()
        )
    })?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file(MANIFEST_ENTRY, opts)
        .context("failed to start manifest entry")?;
    zip.write_all(
        serde_json::to_string_pretty(&manifest)
            .context("failed to serialize manifest")?
            .as_bytes(),
    )
    .context("failed to write manifest entry")?;

    zip.start_file(RECORDS_ENTRY, opts)
        .context("failed to start records entry")?;
    zip.write_all(&records_bytes)
        .context("failed to write records entry")?;

    zip.start_file(REPORTS_ENTRY, opts)
        .context("failed to start reports entry")?;
    zip.write_all(&reports_bytes)
        .context("failed to write reports entry")?;

    zip.finish().context("failed to finalize zip bundle")?;

    Ok(ExportSummary {
        bundle_format: BUNDLE_FORMAT_V1.to_string(),
        entry_count: 3,
        record_count: records.len(),
    })
}

/// Re-hashes every entry named in the manifest. records.json and reports.json
/// must both be listed, and `recordCount` must match the records array.
pub fn verify_report_bundle(in_path: &Path) -> anyhow::Result<VerifySummary> {
    let in_file = File::open(in_path)
        .with_context(|| format!("failed to open bundle {}", in_path.to_string_lossy()))?;
    let mut archive = ZipArchive::new(in_file).context("invalid zip archive")?;

    let mut manifest_text = String::new();
    archive
        .by_name(MANIFEST_ENTRY)
        .context("bundle missing manifest.json")?
        .read_to_string(&mut manifest_text)
        .context("failed to read manifest.json")?;
    let manifest: Value =
        serde_json::from_str(&manifest_text).context("manifest.json is invalid JSON")?;
    let format = manifest
        .get("format")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    if format != BUNDLE_FORMAT_V1 {
        return Err(anyhow!("unsupported bundle format: {}", format));
    }

    let entries = manifest
        .get("entries")
        .and_then(|v| v.as_object())
        .context("manifest.json has no entries")?;
    for required in [RECORDS_ENTRY, REPORTS_ENTRY] {
        if !entries.contains_key(required) {
            return Err(anyhow!("manifest.json does not list {}", required));
        }
    }

    let mut records_len = None;
    for (name, expected) in entries {
        let expected = expected
            .as_str()
            .with_context(|| format!("checksum for {} is not a string", name))?;
        let mut bytes = Vec::new();
        archive
            .by_name(name)
            .with_context(|| format!("bundle missing {}", name))?
            .read_to_end(&mut bytes)
            .with_context(|| format!("failed to read {}", name))?;
        let actual = sha256_hex(&bytes);
        if actual != expected {
            return Err(anyhow!("checksum mismatch for {}", name));
        }
        if name == RECORDS_ENTRY {
            let rows: Vec<Value> =
                serde_json::from_slice(&bytes).context("records.json is not a JSON array")?;
            records_len = Some(rows.len());
        }
    }

    let record_count = manifest
        .get("recordCount")
        .and_then(|v| v.as_u64())
        .context("manifest.json has no recordCount")? as usize;
    if records_len != Some(record_count) {
        return Err(anyhow!(
            "recordCount {} does not match records.json ({} rows)",
            record_count,
            records_len.unwrap_or(0)
        ));
    }

    Ok(VerifySummary {
        bundle_format: format.to_string(),
        scope: manifest
            .get("scope")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string(),
        record_count,
    })
}
