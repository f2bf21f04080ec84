use log::info;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CACHE_DIR_NAME: &str = "dfw_weather_cache";

pub fn get_cache_dir() -> io::Result<PathBuf> {
    dirs::cache_dir()
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                "Could not determine system cache directory",
            )
        })
        .map(|p| p.join(CACHE_DIR_NAME))
}

pub async fn ensure_cache_dir_exists(path: &Path) -> io::Result<()> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => {
            if !metadata.is_dir() {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("Cache path exists but is not a directory: {}", path.display()),
                ));
            }
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("Creating cache directory: {}", path.display());
            tokio::fs::create_dir_all(path).await
        }
        Err(e) => Err(e),
    }
}

/// Returns `Ok(true)` when `path` exists and was modified less than `max_age` ago.
///
/// A zero `max_age` disables the cache. A modification time in the future counts as fresh.
pub async fn is_cache_fresh(path: &Path, max_age: Duration) -> io::Result<bool> {
    if max_age.is_zero() {
        return Ok(false);
    }
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };
    let modified = metadata.modified()?;
    Ok(match modified.elapsed() {
        Ok(age) => age < max_age,
        Err(_) => true,
    })
}
