use anyhow::Result;
use std::path::Path;

pub fn validate_tsv_or_csv_file<P: AsRef<Path>>(path: P) -> Result<()> {
    let pb = path.as_ref();

    let ext = pb
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());
    match ext.as_deref() {
        Some("tsv") | Some("csv") => {}
        _ => anyhow::bail!("File must have a .tsv or .csv extension: {}", pb.display()),
    }

    if !pb.exists() {
        anyhow::bail!("File does not exist: {}", pb.display());
    }

    Ok(())
}

pub fn validate_artifact_dir<P: AsRef<Path>>(path: P) -> Result<()> {
    let pb = path.as_ref();
    if !pb.is_dir() {
        anyhow::bail!("Artifact directory does not exist: {}", pb.display());
    }
    if !pb.join("manifest.json").is_file() {
        anyhow::bail!("No manifest.json in artifact directory: {}", pb.display());
    }
    Ok(())
}
