//! Exports the [`publish_posts`] function which stitches together the steps
//! of publishing the text posts waiting in the input directory: assembling
//! each post ([`crate::post`]), writing its page, adding it to the index
//! ([`crate::index`]) and moving the source into the archive.
//!
//! Posts are handled one at a time, in file-name order. A post that can't be
//! converted aborts the run; posts archived before it stay archived.

use crate::config::Config;
use crate::index::{self, Entry};
use crate::post::{Error as TemplateError, Post, Template};
use crate::util::files_with_extension;
use chrono::NaiveDate;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// What a publish run did.
#[derive(Debug, Default, PartialEq)]
pub struct Summary {
    /// Rendered post pages.
    pub published: Vec<PathBuf>,

    /// Posts whose index entry could not be added. They are published and
    /// archived all the same.
    pub unindexed: Vec<PathBuf>,
}

/// Publishes every `.txt` file sitting directly in the input directory.
/// `today` stands in for posts without a readable date.
pub fn publish_posts(config: &Config, today: NaiveDate) -> Result<Summary> {
    let mut summary = Summary::default();
    if !config.txt_directory.is_dir() {
        warn!(
            "TXT directory '{}' not found!",
            config.txt_directory.display()
        );
        return Ok(summary);
    }

    let sources = files_with_extension(&config.txt_directory, "txt")?;
    if sources.is_empty() {
        info!("no .txt files found in {}", config.txt_directory.display());
        return Ok(summary);
    }
    info!("found {} posts to process", sources.len());

    let template = Template::load(&config.post_template)?;
    mkdir(&config.posts_directory)?;
    mkdir(&config.done_directory)?;

    for source in sources {
        info!("processing {}", source.display());
        let (page, entry) = publish_post(config, &template, &source, today)?;
        info!("created {}", page.display());

        // The post is archived even when the index can't be updated; the
        // page exists and the entry can be added by hand.
        match index::update_index_file(&config.index_file, &config.index, &entry) {
            Ok(()) => info!("updated {} with new entry", config.index_file.display()),
            Err(e) => {
                warn!("failed to update index: {}", e);
                summary.unindexed.push(page.clone());
            }
        }

        let archived = archive(&source, &config.done_directory)?;
        info!("moved {} to {}", source.display(), archived.display());
        summary.published.push(page);
    }

    info!("all posts processed");
    Ok(summary)
}

/// Reads, converts and writes one post. Returns the page path and the entry
/// to add to the index.
fn publish_post(
    config: &Config,
    template: &Template,
    source: &Path,
    today: NaiveDate,
) -> Result<(PathBuf, Entry)> {
    let contents = std::fs::read_to_string(source).map_err(|err| Error::Read {
        path: source.to_owned(),
        err,
    })?;
    let post = Post::from_str(&contents, today);

    let stem = source
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| Error::InvalidFileName(source.to_owned()))?;
    let file_name = format!("{}.html", stem);
    let page = config.posts_directory.join(&file_name);
    std::fs::write(&page, template.render(&post)).map_err(|err| Error::Write {
        path: page.clone(),
        err,
    })?;

    Ok((
        page,
        Entry {
            date: post.date_string(),
            title: post.title,
            file_name,
        },
    ))
}

/// Moves `source` into `done_directory`, keeping its file name. An archived
/// file with the same name is replaced.
fn archive(source: &Path, done_directory: &Path) -> Result<PathBuf> {
    let file_name = source
        .file_name()
        .ok_or_else(|| Error::InvalidFileName(source.to_owned()))?;
    let target = done_directory.join(file_name);
    if target.exists() {
        warn!("replacing previously archived {}", target.display());
    }

    let moved = std::fs::rename(source, &target).or_else(|_| {
        // `rename` can't cross filesystems; fall back to copy and delete.
        std::fs::copy(source, &target).and_then(|_| std::fs::remove_file(source))
    });
    moved.map_err(|err| Error::Archive {
        path: source.to_owned(),
        err,
    })?;
    Ok(target)
}

fn mkdir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|err| Error::CreateDirectory {
        path: dir.to_owned(),
        err,
    })
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for publishing posts. Index failures are not errors; see
/// [`Summary::unindexed`].
#[derive(Debug)]
pub enum Error {
    /// Returned when the post template can't be read.
    Template(TemplateError),

    /// Returned for I/O problems while reading a post source.
    Read { path: PathBuf, err: std::io::Error },

    /// Returned for I/O problems while writing a post page.
    Write { path: PathBuf, err: std::io::Error },

    /// Returned for I/O problems while moving a source into the archive.
    Archive { path: PathBuf, err: std::io::Error },

    /// Returned for I/O problems while creating output directories.
    CreateDirectory { path: PathBuf, err: std::io::Error },

    /// Returned for errors listing the input directory.
    WalkDir(walkdir::Error),

    /// Returned when a source path has no usable file name.
    InvalidFileName(PathBuf),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Template(err) => err.fmt(f),
            Error::Read { path, err } => {
                write!(f, "Reading post '{}': {}", path.display(), err)
            }
            Error::Write { path, err } => {
                write!(f, "Writing page '{}': {}", path.display(), err)
            }
            Error::Archive { path, err } => {
                write!(f, "Archiving '{}': {}", path.display(), err)
            }
            Error::CreateDirectory { path, err } => {
                write!(f, "Creating directory '{}': {}", path.display(), err)
            }
            Error::WalkDir(err) => err.fmt(f),
            Error::InvalidFileName(path) => {
                write!(f, "invalid file name: {:?}", path)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Template(err) => Some(err),
            Error::Read { path: _, err } => Some(err),
            Error::Write { path: _, err } => Some(err),
            Error::Archive { path: _, err } => Some(err),
            Error::CreateDirectory { path: _, err } => Some(err),
            Error::WalkDir(err) => Some(err),
            Error::InvalidFileName(_) => None,
        }
    }
}

impl From<TemplateError> for Error {
    /// Converts [`TemplateError`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: TemplateError) -> Error {
        Error::Template(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts [`walkdir::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_archive_replaces_existing() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let done = dir.path().join("done");
        std::fs::create_dir(&done)?;
        std::fs::write(done.join("post.txt"), "old")?;
        let source = dir.path().join("post.txt");
        std::fs::write(&source, "new")?;

        let target = archive(&source, &done)?;
        assert_eq!(done.join("post.txt"), target);
        assert_eq!("new", std::fs::read_to_string(&target)?);
        assert!(!source.exists());
        Ok(())
    }

    #[test]
    fn test_missing_input_directory_is_not_an_error() -> Result<()> {
        let config = Config::with_defaults(Path::new("./no/such/site"));
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(Summary::default(), publish_posts(&config, today)?);
        Ok(())
    }
}
