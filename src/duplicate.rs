//! Duplicates the marked block of a text file and translates the copy. Posts
//! are written in Italian; the block between the two marker lines is the part
//! that should also appear in English, so the output carries the original
//! block followed by its translation.

use crate::config::{Config, Markers};
use crate::translate::{self, Translate};
use crate::util::files_with_extension;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// A file cut at its marker lines. Every line keeps its terminator; the
/// marker lines themselves belong to no section.
#[derive(Debug, PartialEq)]
pub struct Sections<'a> {
    pub head: Vec<&'a str>,
    pub block: Vec<&'a str>,
    pub tail: Vec<&'a str>,
}

/// Splits `input` at the first start marker and the first end marker after
/// it. A missing start marker leaves the whole input in `head`; a start
/// marker without an end leaves the block empty and everything after the
/// start marker in `tail`.
pub fn split_sections<'a>(input: &'a str, markers: &Markers) -> Sections<'a> {
    let lines: Vec<&str> = input.split_inclusive('\n').collect();

    let start = match lines.iter().position(|line| line.contains(&markers.start)) {
        Some(start) => start,
        None => {
            return Sections {
                head: lines,
                block: Vec::new(),
                tail: Vec::new(),
            }
        }
    };
    let end = lines[start + 1..]
        .iter()
        .position(|line| line.contains(&markers.end))
        .map(|offset| start + 1 + offset);

    match end {
        Some(end) => Sections {
            head: lines[..start].to_vec(),
            block: lines[start + 1..end].to_vec(),
            tail: lines[end + 1..].to_vec(),
        },
        None => Sections {
            head: lines[..start].to_vec(),
            block: Vec::new(),
            tail: lines[start + 1..].to_vec(),
        },
    }
}

/// Translates `lines` one at a time. Blank lines stay blank (and are never
/// sent to the translator); each line keeps its original terminator.
pub fn translate_lines(lines: &[&str], translator: &dyn Translate) -> translate::Result<Vec<String>> {
    lines
        .iter()
        .map(|line| {
            let content = line.trim_end_matches(|c: char| c == '\n' || c == '\r');
            let terminator = &line[content.len()..];
            if content.trim().is_empty() {
                Ok(terminator.to_owned())
            } else {
                Ok(format!("{}{}", translator.translate(content)?, terminator))
            }
        })
        .collect()
}

/// Returns `input` with its block followed by a translated copy of the
/// block, and without the marker lines. When the translation service can't
/// be reached the copy is left untranslated and a warning is logged.
pub fn duplicate_block(
    input: &str,
    markers: &Markers,
    translator: &dyn Translate,
) -> translate::Result<String> {
    let sections = split_sections(input, markers);
    let translated = match translate_lines(&sections.block, translator) {
        Ok(translated) => translated,
        Err(translate::Error::Http(err)) => {
            warn!("{}: the second copy will not be translated", err);
            sections.block.iter().map(|line| (*line).to_owned()).collect()
        }
        Err(err) => return Err(err),
    };

    let mut out = String::with_capacity(input.len() * 2);
    out.extend(sections.head.iter().copied());
    out.extend(sections.block.iter().copied());
    out.extend(translated.iter().map(String::as_str));
    out.extend(sections.tail.iter().copied());
    Ok(out)
}

/// Duplicates the block of the file at `path` and writes the result to
/// `<output_directory>/<file name>`, returning the written path.
pub fn duplicate_file(
    path: &Path,
    output_directory: &Path,
    markers: &Markers,
    translator: &dyn Translate,
) -> Result<PathBuf> {
    let file_name = path
        .file_name()
        .ok_or_else(|| Error::InvalidFileName(path.to_owned()))?;
    let input = std::fs::read_to_string(path).map_err(|err| Error::Io {
        path: path.to_owned(),
        err,
    })?;
    let output = duplicate_block(&input, markers, translator)?;

    let output_path = output_directory.join(file_name);
    std::fs::write(&output_path, output).map_err(|err| Error::Io {
        path: output_path.clone(),
        err,
    })?;
    Ok(output_path)
}

/// What a duplication run did.
#[derive(Debug, Default, PartialEq)]
pub struct Summary {
    pub written: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

/// Runs [`duplicate_file`] over every `.txt` file in the translation inbox,
/// writing into the text directory. A failing file is logged and recorded in
/// the [`Summary`]; the remaining files are still processed.
pub fn duplicate_all(config: &Config, translator: &dyn Translate) -> Result<Summary> {
    let mut summary = Summary::default();
    if !config.translate_directory.is_dir() {
        warn!(
            "directory `{}` does not exist",
            config.translate_directory.display()
        );
        return Ok(summary);
    }

    for path in files_with_extension(&config.translate_directory, "txt")? {
        match duplicate_file(&path, &config.txt_directory, &config.markers, translator) {
            Ok(output_path) => {
                info!("created {}", output_path.display());
                summary.written.push(output_path);
            }
            Err(e) => {
                error!("duplicating {}: {}", path.display(), e);
                summary.failed.push(path);
            }
        }
    }
    Ok(summary)
}

/// Represents the result of a duplication.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error duplicating a file.
#[derive(Debug)]
pub enum Error {
    /// Returned for I/O problems reading a source or writing its output.
    Io { path: PathBuf, err: std::io::Error },

    /// Returned for errors listing the input directory.
    WalkDir(walkdir::Error),

    /// Returned when translating a line fails.
    Translate(translate::Error),

    /// Returned when a path has no file name.
    InvalidFileName(PathBuf),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io { path, err } => write!(f, "'{}': {}", path.display(), err),
            Error::WalkDir(err) => err.fmt(f),
            Error::Translate(err) => err.fmt(f),
            Error::InvalidFileName(path) => write!(f, "invalid file name: {:?}", path),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { path: _, err } => Some(err),
            Error::WalkDir(err) => Some(err),
            Error::Translate(err) => Some(err),
            Error::InvalidFileName(_) => None,
        }
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator when listing directories.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

impl From<translate::Error> for Error {
    /// Converts a [`translate::Error`] into an [`Error`].
    fn from(err: translate::Error) -> Error {
        Error::Translate(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::translate::{ChatTranslator, Passthrough};
    use pretty_assertions::assert_eq;

    /// Stands in for a real model: shouts the line back.
    struct Shout;

    impl Translate for Shout {
        fn translate(&self, line: &str) -> translate::Result<String> {
            Ok(line.to_uppercase())
        }
    }

    /// Fails on any line containing "rotto".
    struct Flaky;

    impl Translate for Flaky {
        fn translate(&self, line: &str) -> translate::Result<String> {
            match line.contains("rotto") {
                true => Err(translate::Error::EmptyResponse),
                false => Ok(line.to_owned()),
            }
        }
    }

    const INPUT: &str = "titolo\n\
                         ++DOPPIACOPIA++\n\
                         ciao\n\
                         \n\
                         mondo\n\
                         ++DOPPIACOPIAFINE++\n\
                         fine";

    #[test]
    fn test_split_sections() {
        let sections = split_sections(INPUT, &Markers::default());
        assert_eq!(
            Sections {
                head: vec!["titolo\n"],
                block: vec!["ciao\n", "\n", "mondo\n"],
                tail: vec!["fine"],
            },
            sections
        );
    }

    #[test]
    fn test_duplicate_block() -> translate::Result<()> {
        assert_eq!(
            "titolo\nciao\n\nmondo\nCIAO\n\nMONDO\nfine",
            duplicate_block(INPUT, &Markers::default(), &Shout)?
        );
        Ok(())
    }

    #[test]
    fn test_translated_block_keeps_line_count_and_blanks() -> translate::Result<()> {
        let block = ["uno\r\n", "  \n", "due\n"];
        let translated = translate_lines(&block, &Shout)?;
        assert_eq!(vec!["UNO\r\n", "\n", "DUE\n"], translated);
        Ok(())
    }

    #[test]
    fn test_missing_start_marker_passes_input_through() -> translate::Result<()> {
        let input = "nessun\nmarcatore\n";
        let sections = split_sections(input, &Markers::default());
        assert_eq!(vec!["nessun\n", "marcatore\n"], sections.head);
        assert!(sections.block.is_empty() && sections.tail.is_empty());
        assert_eq!(input, duplicate_block(input, &Markers::default(), &Shout)?);
        Ok(())
    }

    #[test]
    fn test_missing_end_marker_empties_block() -> translate::Result<()> {
        let input = "prima\n++DOPPIACOPIA++\ndopo\n";
        assert_eq!(
            "prima\ndopo\n",
            duplicate_block(input, &Markers::default(), &Shout)?
        );
        Ok(())
    }

    #[test]
    fn test_end_marker_before_start_is_ignored() {
        let input = "++DOPPIACOPIAFINE++\n++DOPPIACOPIA++\nx\n++DOPPIACOPIAFINE++\n";
        let sections = split_sections(input, &Markers::default());
        assert_eq!(vec!["++DOPPIACOPIAFINE++\n"], sections.head);
        assert_eq!(vec!["x\n"], sections.block);
    }

    #[test]
    fn test_duplicate_all_isolates_failures() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let config = Config::with_defaults(dir.path());
        std::fs::create_dir_all(&config.translate_directory)?;
        std::fs::write(
            config.translate_directory.join("a.txt"),
            "++DOPPIACOPIA++\nrotto\n++DOPPIACOPIAFINE++\n",
        )?;
        std::fs::write(
            config.translate_directory.join("b.txt"),
            "++DOPPIACOPIA++\nbene\n++DOPPIACOPIAFINE++\n",
        )?;
        std::fs::write(config.translate_directory.join("c.md"), "ignorato")?;

        let summary = duplicate_all(&config, &Flaky)?;
        assert_eq!(vec![config.translate_directory.join("a.txt")], summary.failed);
        assert_eq!(vec![config.txt_directory.join("b.txt")], summary.written);
        assert_eq!(
            "bene\nbene\n",
            std::fs::read_to_string(config.txt_directory.join("b.txt"))?
        );
        assert!(!config.txt_directory.join("a.txt").exists());
        Ok(())
    }

    #[test]
    fn test_unreachable_translator_leaves_copy_untranslated(
    ) -> std::result::Result<(), Box<dyn std::error::Error>> {
        // Nothing listens on a port that was bound and released.
        let port = std::net::TcpListener::bind("127.0.0.1:0")?.local_addr()?.port();
        let endpoint = url::Url::parse(&format!("http://127.0.0.1:{}/v1/", port))?;
        let translator = ChatTranslator::new(
            endpoint,
            String::from("key"),
            &crate::config::TranslationConfig::default(),
        );

        assert_eq!(
            "titolo\nciao\n\nmondo\nciao\n\nmondo\nfine",
            duplicate_block(INPUT, &Markers::default(), &translator)?
        );
        Ok(())
    }

    #[test]
    fn test_other_translation_errors_still_fail() {
        let input = "++DOPPIACOPIA++\nrotto\n++DOPPIACOPIAFINE++\n";
        assert!(duplicate_block(input, &Markers::default(), &Flaky).is_err());
    }

    #[test]
    fn test_duplicate_all_without_inbox() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let config = Config::with_defaults(dir.path());
        assert_eq!(Summary::default(), duplicate_all(&config, &Passthrough)?);
        Ok(())
    }
}
