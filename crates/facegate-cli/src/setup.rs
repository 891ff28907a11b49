//! `facegate setup`: downloads the face-mesh model the landmark backend
//! loads at startup.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use facegate_models::{model_path, sha256_file_hex, ModelFile, MODELS};

/// Default model directory: `$XDG_DATA_HOME/facegate/models`.
pub fn default_model_dir() -> PathBuf {
    let data_home = std::env::var("XDG_DATA_HOME").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
        format!("{home}/.local/share")
    });
    PathBuf::from(data_home).join("facegate/models")
}

/// Download a single model file with progress output, verify its digest,
/// and move it into place atomically.
fn download_model(model: &ModelFile, dest: &Path) -> Result<()> {
    let tmp_path = dest.with_extension("onnx.part");

    println!("  downloading {} ({})...", model.name, model.size_display);

    let resp = ureq::get(model.url)
        .call()
        .with_context(|| format!("failed to download {}", model.url))?;

    let content_length = resp
        .headers()
        .get("Content-Length")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    let mut reader = resp.into_body().into_reader();
    let mut file = fs::File::create(&tmp_path)
        .with_context(|| format!("failed to create {}", tmp_path.display()))?;

    let mut buf = [0u8; 65536];
    let mut total: u64 = 0;
    let mut last_pct: u64 = 0;

    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n])?;
        total += n as u64;

        if let Some(len) = content_length {
            let pct = (total * 100) / len;
            if pct / 10 > last_pct / 10 {
                print!("  {pct}%\r");
                io::stdout().flush().ok();
                last_pct = pct;
            }
        }
    }

    file.flush()?;
    drop(file);

    print!("  verifying digest... ");
    io::stdout().flush().ok();
    let digest = sha256_file_hex(&tmp_path)?;
    if digest != model.sha256 {
        fs::remove_file(&tmp_path).ok();
        bail!(
            "digest mismatch for {}:\n  expected: {}\n  got:      {}",
            model.name,
            model.sha256,
            digest
        );
    }
    println!("ok");

    fs::rename(&tmp_path, dest).with_context(|| {
        format!(
            "failed to rename {} -> {}",
            tmp_path.display(),
            dest.display()
        )
    })?;

    Ok(())
}

/// Run the setup command: download and verify the model manifest.
pub fn run(model_dir: Option<PathBuf>) -> Result<()> {
    let dir = model_dir.unwrap_or_else(default_model_dir);

    println!("Model directory: {}", dir.display());

    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create directory {}", dir.display()))?;

    let mut downloaded = 0;
    let mut skipped = 0;

    for model in MODELS {
        let dest = model_path(&dir, model);
        if dest.exists() {
            match sha256_file_hex(&dest) {
                Ok(digest) if digest == model.sha256 => {
                    println!("  {} already present (digest ok)", model.name);
                    skipped += 1;
                    continue;
                }
                Ok(_) => {
                    println!("  {} exists but digest differs — re-downloading", model.name);
                }
                Err(_) => {
                    println!("  {} exists but unreadable — re-downloading", model.name);
                }
            }
        }

        download_model(model, &dest)?;
        downloaded += 1;
    }

    println!();
    if downloaded > 0 {
        println!("Setup complete: {downloaded} model(s) downloaded, {skipped} already present.");
    } else {
        println!("All models already present. Nothing to download.");
    }

    Ok(())
}
