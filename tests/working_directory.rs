//! Runs in its own test binary: it changes the process working directory,
//! which would race with tests that build paths from it.

use pretty_assertions::assert_eq;
use std::error::Error;
use std::fs;
use std::path::Path;
use tildepost::config::{Config, PROJECT_FILE};

type Result<T> = std::result::Result<T, Box<dyn Error>>;

#[test]
fn test_default_site_finds_project_file_above_working_directory() -> Result<()> {
    let site = tempfile::tempdir()?;
    let site_root = site.path().canonicalize()?;
    fs::write(site_root.join(PROJECT_FILE), "posts_directory: blog\n")?;
    fs::create_dir(site_root.join("txt"))?;

    let previous = std::env::current_dir()?;
    std::env::set_current_dir(site_root.join("txt"))?;
    let config = Config::from_directory(Path::new("."));
    std::env::set_current_dir(previous)?;

    let config = config?;
    assert_eq!(site_root, config.site_root.canonicalize()?);
    assert!(config.posts_directory.ends_with("blog"));
    assert_eq!(config.site_root.join("txt"), config.txt_directory);
    Ok(())
}
