//! Utility functions for filenames, destination paths and file moves

use std::path::{Path, PathBuf};

/// Characters replaced when a listing field is handed downstream
const LISTING_HOSTILE: [char; 2] = ['/', '\\'];

/// Characters replaced when building a destination filename
const FILENAME_HOSTILE: [char; 10] = [' ', '/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Replace path separators in a title or display name from the lister
pub fn sanitize_listing_field(value: &str) -> String {
    value.replace(LISTING_HOSTILE, "_")
}

/// Make a string safe to use as one filename component on any platform
///
/// # Examples
///
/// ```
/// use channel_dl::utils::sanitize_filename;
///
/// assert_eq!(sanitize_filename("a/b: c?"), "a_b__c_");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    name.replace(FILENAME_HOSTILE, "_")
}

/// File stem `<channel>_<date>_<title>` used for every download
pub fn media_file_stem(channel_name: &str, upload_date: &str, title: &str) -> String {
    format!(
        "{}_{}_{}",
        sanitize_filename(channel_name),
        upload_date,
        sanitize_filename(title)
    )
}

/// True for UNC-style network share paths (`\\server\share`)
///
/// Such directories are never created locally; the tool writing into them is
/// responsible for that.
pub fn is_remote_share(path: &Path) -> bool {
    path.to_string_lossy().starts_with(r"\\")
}

/// First `*.cookie` file in `dir`, in name order
pub fn discover_cookie_file(dir: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    let mut cookies: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "cookie"))
        .collect();
    cookies.sort();
    cookies.into_iter().next()
}

/// Move a file, falling back to copy + remove when rename crosses filesystems
pub async fn move_file(source: &Path, destination: &Path) -> std::io::Result<()> {
    match tokio::fs::rename(source, destination).await {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            tracing::debug!(
                error = %rename_err,
                ?source,
                ?destination,
                "rename failed, falling back to copy"
            );
            tokio::fs::copy(source, destination).await?;
            tokio::fs::remove_file(source).await
        }
    }
}
