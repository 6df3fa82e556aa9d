//! Inserts entries into the site's index page. The page is parsed, the new
//! entry is placed first in the list container, and the whole document is
//! written back in the pretty layout of [`crate::prettify`], except that each
//! entry is kept on a single line so the list stays readable in a text
//! editor.

use crate::config::IndexConfig;
use crate::prettify::prettify_with_first_child;
use pulldown_cmark::escape::escape_html;
use scraper::{ElementRef, Html, Selector};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// A single line of the index: when, what and where.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    /// `YYYY-MM-DD`.
    pub date: String,
    pub title: String,

    /// The file name of the rendered post, e.g. `hello.html`.
    pub file_name: String,
}

impl Entry {
    /// Renders the entry as markup: a date label, the separator and a link
    /// to the post, in that order.
    pub fn to_html(&self, config: &IndexConfig) -> io::Result<String> {
        let mut html = String::new();
        html.push_str(r#"<div class=""#);
        escape_html(&mut html, &config.entry_class)?;
        html.push_str(r#""><span class="date">"#);
        escape_html(&mut html, &self.date)?;
        html.push_str(r#"</span><span class="separator">"#);
        escape_html(&mut html, &config.separator)?;
        html.push_str(r#"</span><a href=""#);
        escape_html(&mut html, &format!("{}{}", config.posts_url, self.file_name))?;
        html.push_str(r#"">"#);
        escape_html(&mut html, &self.title)?;
        html.push_str("</a></div>");
        Ok(html)
    }
}

/// Returns `document` with `entry` inserted as the first child of the list
/// container. Fails with [`Error::ContainerNotFound`] when no element matches
/// [`IndexConfig::list_selector`].
pub fn insert_entry(document: &str, config: &IndexConfig, entry: &Entry) -> Result<String> {
    let selector = Selector::parse(&config.list_selector)
        .map_err(|e| Error::Selector(config.list_selector.clone(), format!("{:?}", e)))?;

    let html = Html::parse_document(document);
    let container = html
        .select(&selector)
        .next()
        .ok_or_else(|| Error::ContainerNotFound(config.list_selector.clone()))?;

    let fragment = Html::parse_fragment(&entry.to_html(config)?);
    let new_entry = fragment
        .root_element()
        .children()
        .find_map(ElementRef::wrap)
        .ok_or(Error::MalformedEntry)?;

    let pretty = prettify_with_first_child(&html, container, new_entry)?;
    Ok(collapse_entries(&pretty, &config.entry_class))
}

/// Reads the index at `path`, inserts `entry` and writes it back. The file is
/// only written once the new document has been built in full, so a failure
/// leaves the index untouched.
pub fn update_index_file(path: &Path, config: &IndexConfig, entry: &Entry) -> Result<()> {
    let document = std::fs::read_to_string(path).map_err(|err| Error::Io {
        path: path.to_owned(),
        err,
    })?;
    let updated = insert_entry(&document, config, entry)?;
    std::fs::write(path, updated).map_err(|err| Error::Io {
        path: path.to_owned(),
        err,
    })
}

/// Joins the lines of every entry `div` into one line: each line is trimmed
/// and they are separated by single spaces. The entry's opening line keeps
/// its indentation; everything else in `pretty` is left as is.
pub fn collapse_entries(pretty: &str, entry_class: &str) -> String {
    let opening = format!(r#"<div class="{}">"#, entry_class);
    let mut out: Vec<String> = Vec::new();

    // (indentation, collected parts, open `div` count)
    let mut entry: Option<(&str, Vec<&str>, usize)> = None;
    for line in pretty.lines() {
        let trimmed = line.trim();
        match &mut entry {
            None if trimmed == opening => {
                let indent = &line[..line.len() - line.trim_start().len()];
                entry = Some((indent, vec![trimmed], 1));
            }
            None => out.push(line.to_owned()),
            Some((indent, parts, depth)) => {
                parts.push(trimmed);
                if trimmed.starts_with("<div") {
                    *depth += 1;
                } else if trimmed == "</div>" {
                    *depth -= 1;
                }
                if *depth == 0 {
                    out.push(format!("{}{}", indent, parts.join(" ")));
                    entry = None;
                }
            }
        }
    }
    // An unterminated entry can only come from a truncated document; keep
    // its lines rather than lose them.
    if let Some((indent, parts, _)) = entry {
        out.push(format!("{}{}", indent, parts.join(" ")));
    }

    let mut collapsed = out.join("\n");
    collapsed.push('\n');
    collapsed
}

/// Represents the result of an index update.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error updating the index page.
#[derive(Debug)]
pub enum Error {
    /// Returned when no element matches the list selector.
    ContainerNotFound(String),

    /// Returned when the configured list selector isn't valid CSS.
    Selector(String, String),

    /// Returned when the rendered entry doesn't parse back into an element.
    MalformedEntry,

    /// Returned for I/O problems reading or writing the index file.
    Io { path: PathBuf, err: io::Error },

    /// Returned for errors while serializing the document.
    Serialize(io::Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ContainerNotFound(selector) => {
                write!(f, "Could not find `{}` in the index", selector)
            }
            Error::Selector(selector, err) => {
                write!(f, "Invalid list selector `{}`: {}", selector, err)
            }
            Error::MalformedEntry => write!(f, "Index entry is not valid markup"),
            Error::Io { path, err } => {
                write!(f, "Updating index file '{}': {}", path.display(), err)
            }
            Error::Serialize(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ContainerNotFound(_) => None,
            Error::Selector(_, _) => None,
            Error::MalformedEntry => None,
            Error::Io { path: _, err } => Some(err),
            Error::Serialize(err) => Some(err),
        }
    }
}

impl From<io::Error> for Error {
    /// Converts an [`io::Error`] raised while rendering into an [`Error`].
    /// This allows us to use the `?` operator for the printer.
    fn from(err: io::Error) -> Error {
        Error::Serialize(err)
    }
}
