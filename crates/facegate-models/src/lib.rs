//! Landmark-model manifest and integrity verification.
//!
//! The engine consumes facial landmarks from an injected provider; the
//! provider in turn loads an ONNX face-mesh model from disk. This crate
//! pins exactly which model files a deployment runs: name, source URL, and
//! SHA-256 digest. Verification happens once at startup, before the
//! provider is constructed, so a missing or tampered model fails fast rather
//! than surfacing mid-authentication.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;

/// Points emitted by the pinned face-mesh topology. Downstream consumers
/// validate landmark sets against this count.
pub const MESH_POINTS: usize = 468;

/// Model file descriptor: filename, source URL, SHA-256 digest,
/// human-readable size.
pub struct ModelFile {
    pub name: &'static str,
    pub url: &'static str,
    pub sha256: &'static str,
    pub size_display: &'static str,
}

/// Model files required by the default face-mesh landmark backend.
pub const MODELS: &[ModelFile] = &[ModelFile {
    name: "face_mesh_468.onnx",
    url: "https://huggingface.co/public-data/mediapipe-onnx/resolve/main/face_mesh/face_mesh_468.onnx",
    sha256: "9c3fd7bbf4b4f2f19b964ef3d6a8c0e26fd42c83909f2c0c3bd2e43a7d81b650",
    size_display: "2.4 MB",
}];

/// Path of a manifest entry inside `model_dir`.
pub fn model_path(model_dir: &Path, model: &ModelFile) -> PathBuf {
    model_dir.join(model.name)
}

#[derive(Error, Debug)]
pub enum ModelIntegrityError {
    #[error("model file not found: {name} ({path})")]
    Missing { name: &'static str, path: PathBuf },

    #[error("failed to read model file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("model digest mismatch for {name} ({path})\n  expected: {expected}\n  got:      {got}")]
    DigestMismatch {
        name: &'static str,
        path: PathBuf,
        expected: String,
        got: String,
    },
}

/// Streaming SHA-256 hex digest of a file.
pub fn sha256_file_hex(path: &Path) -> Result<String, ModelIntegrityError> {
    let mut file = fs::File::open(path).map_err(|source| ModelIntegrityError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf).map_err(|source| ModelIntegrityError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Verify one file against its expected digest.
pub fn verify_file(
    name: &'static str,
    path: &Path,
    expected_sha256: &str,
) -> Result<(), ModelIntegrityError> {
    if !path.exists() {
        return Err(ModelIntegrityError::Missing {
            name,
            path: path.to_path_buf(),
        });
    }

    let digest = sha256_file_hex(path)?;
    if digest != expected_sha256 {
        return Err(ModelIntegrityError::DigestMismatch {
            name,
            path: path.to_path_buf(),
            expected: expected_sha256.to_string(),
            got: digest,
        });
    }

    Ok(())
}

/// Verify every manifest entry under `model_dir`. Intended as a startup
/// gate before the landmark provider is constructed.
pub fn verify_models_dir(model_dir: &Path) -> Result<(), ModelIntegrityError> {
    for model in MODELS {
        verify_file(model.name, &model_path(model_dir, model), model.sha256)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "facegate-models-{tag}-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ))
    }

    #[test]
    fn test_missing_file_reported() {
        let dir = scratch_dir("missing");
        let err = verify_file("nope.onnx", &dir.join("nope.onnx"), "00").unwrap_err();
        assert!(matches!(err, ModelIntegrityError::Missing { .. }));
    }

    #[test]
    fn test_digest_mismatch_reported() {
        let dir = scratch_dir("mismatch");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("model.onnx");
        fs::write(&path, b"not a real model").unwrap();

        let err = verify_file("model.onnx", &path, "00").unwrap_err();
        assert!(matches!(err, ModelIntegrityError::DigestMismatch { .. }));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_matching_digest_accepted() {
        let dir = scratch_dir("match");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("model.onnx");
        fs::write(&path, b"payload").unwrap();

        let digest = sha256_file_hex(&path).unwrap();
        verify_file("model.onnx", &path, &digest).unwrap();

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_digest_is_stable_across_reads() {
        let dir = scratch_dir("stable");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("model.onnx");
        fs::write(&path, vec![7u8; 20_000]).unwrap();

        assert_eq!(
            sha256_file_hex(&path).unwrap(),
            sha256_file_hex(&path).unwrap()
        );

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_manifest_dir_verification_reports_missing() {
        let dir = scratch_dir("dir-missing");
        let err = verify_models_dir(&dir).unwrap_err();
        assert!(matches!(err, ModelIntegrityError::Missing { .. }));
    }
}
