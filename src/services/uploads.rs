use std::path::Path;

use anyhow::Context;

/// Persist an uploaded file under a generated name and return that name.
/// Documents reference uploads by filename only.
pub async fn store(dir: &str, original_name: &str, bytes: &[u8]) -> anyhow::Result<String> {
    tokio::fs::create_dir_all(dir)
        .await
        .context("failed to create upload directory")?;

    let filename = generated_name(original_name);
    tokio::fs::write(Path::new(dir).join(&filename), bytes)
        .await
        .with_context(|| format!("failed to write upload {filename}"))?;

    Ok(filename)
}

/// Best-effort removal: failures are logged, never propagated. Used both
/// for cleanup after failed requests and for orphaned images.
pub async fn remove(dir: &str, filename: &str) {
    if filename.is_empty() || filename.contains('/') || filename.contains("..") {
        tracing::warn!(filename, "refusing to remove suspicious upload name");
        return;
    }

    match tokio::fs::remove_file(Path::new(dir).join(filename)).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(error = %e, filename, "failed to remove upload");
        }
    }
}

pub async fn remove_all(dir: &str, filenames: &[String]) {
    for filename in filenames {
        remove(dir, filename).await;
    }
}

fn generated_name(original: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string();
    let ext = Path::new(original)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .filter(|e| e.len() <= 8 && e.chars().all(|c| c.is_ascii_alphanumeric()));

    match ext {
        Some(ext) => format!("{id}.{ext}"),
        None => id,
    }
}
