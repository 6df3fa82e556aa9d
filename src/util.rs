use anyhow::{anyhow, Result};
use std::fs::File;
use std::path::Path;
use walkdir::WalkDir;

pub fn open(path: &Path, kind: &str) -> Result<File> {
    match File::open(path) {
        Err(e) => Err(anyhow!("Opening {} file `{}`: {}", kind, path.display(), e)),
        Ok(file) => Ok(file),
    }
}

/// Lists the files with the given extension (without the leading dot) that
/// sit directly inside `dir`, sorted by file name. Subdirectories (including
/// the archive directory) are never descended into.
pub fn files_with_extension(
    dir: &Path,
    extension: &str,
) -> walkdir::Result<Vec<std::path::PathBuf>> {
    let mut files = Vec::new();
    for result in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by(|a, b| a.file_name().cmp(b.file_name()))
    {
        let entry = result?;
        if entry.file_type().is_file()
            && entry.path().extension().map_or(false, |ext| ext == extension)
        {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}
