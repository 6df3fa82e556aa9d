//! Defines the [`Post`] and [`Template`] types: pulling the title and date
//! out of a text post, converting its body, and stitching the result into
//! the post template.

use crate::markdown;
use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};

lazy_static! {
    static ref TITLE_HEADING: Regex = Regex::new(r"<h1>.*?</h1>").unwrap();
    static ref DATE_SPAN: Regex = Regex::new(r"<em>.*?</em>").unwrap();
    static ref EMPTY_PARAGRAPH: Regex = Regex::new(r"<p>\s*</p>\n?").unwrap();
    static ref STARRED: Regex = Regex::new(r"\*([^*]+)\*").unwrap();
}

/// The title used when a post has no `# ` line.
pub const DEFAULT_TITLE: &str = "Untitled Post";

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// A post ready to be templated.
#[derive(Clone, Debug, PartialEq)]
pub struct Post {
    pub title: String,
    pub date: NaiveDate,

    /// The converted body, without the title heading and the date line.
    pub body: String,
}

impl Post {
    /// Parses a post from the contents of its text file. `today` is used
    /// when the post carries no readable date.
    pub fn from_str(input: &str, today: NaiveDate) -> Post {
        let title = extract_title(input);
        let date = extract_date(input, today);

        // The template already shows the title and date, so drop their
        // converted copies from the body.
        let body = markdown::to_html(input);
        let body = TITLE_HEADING.replacen(&body, 1, "");
        let body = DATE_SPAN.replacen(&body, 1, "");
        let body = EMPTY_PARAGRAPH
            .replace_all(&body, "")
            .trim_start_matches('\n')
            .to_owned();

        Post { title, date, body }
    }

    /// The date as rendered in pages and the index: `YYYY-MM-DD`.
    pub fn date_string(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

/// Returns the text of the first line starting with `# `, trimmed.
pub fn extract_title(content: &str) -> String {
    content
        .lines()
        .find_map(|line| line.strip_prefix("# "))
        .map(|title| title.trim().to_owned())
        .unwrap_or_else(|| DEFAULT_TITLE.to_owned())
}

/// Finds the date line (the first line with an asterisk and an English month
/// name) and parses its first `*...*` span as `Month DD, YYYY`. Only that
/// first candidate line is considered; if it doesn't parse, `today` is
/// returned.
pub fn extract_date(content: &str, today: NaiveDate) -> NaiveDate {
    let candidate = content.lines().find(|line| {
        line.contains('*') && MONTHS.iter().any(|month| line.contains(month))
    });

    candidate
        .and_then(|line| STARRED.captures(line))
        .and_then(|c| c.get(1))
        .and_then(|m| NaiveDate::parse_from_str(m.as_str().trim(), "%B %d, %Y").ok())
        .unwrap_or(today)
}

/// The post page template. The three placeholders are replaced verbatim.
pub struct Template {
    contents: String,
}

impl Template {
    pub const TITLE: &'static str = "POST_TITLE";
    pub const DATE: &'static str = "POST_DATE";
    pub const CONTENT: &'static str = "POST_CONTENT";

    /// Reads the template file. Failing to read it is fatal for a publish
    /// run.
    pub fn load(path: &Path) -> Result<Template> {
        std::fs::read_to_string(path)
            .map(Template::new)
            .map_err(|err| Error::OpenTemplateFile {
                path: path.to_owned(),
                err,
            })
    }

    pub fn new(contents: String) -> Template {
        Template { contents }
    }

    /// Renders `post`, substituting the title, then the date, then the body.
    pub fn render(&self, post: &Post) -> String {
        self.contents
            .replace(Self::TITLE, &post.title)
            .replace(Self::DATE, &post.date_string())
            .replace(Self::CONTENT, &post.body)
    }
}

/// Represents the result of a [`Template`] operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading a [`Template`].
#[derive(Debug)]
pub enum Error {
    /// Returned for I/O problems while reading the template file.
    OpenTemplateFile { path: PathBuf, err: std::io::Error },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::OpenTemplateFile { path, err } => {
                write!(f, "Opening template file '{}': {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::OpenTemplateFile { path: _, err } => Some(err),
        }
    }
}
