//! Site configuration. A site is a directory holding the text sources, the
//! rendered posts, the index page and the post template. Every location and
//! marker can be overridden from an optional `tildepost.yaml` project file;
//! anything left out falls back to the layout the blog has always used.

use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

/// The name of the project file searched for by [`Config::from_directory`].
pub const PROJECT_FILE: &str = "tildepost.yaml";

#[derive(Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Project {
    txt_directory: PathBuf,
    done_directory: PathBuf,
    translate_directory: PathBuf,
    posts_directory: PathBuf,
    index_file: PathBuf,
    post_template: PathBuf,
    index: IndexConfig,
    markers: Markers,
    translation: TranslationConfig,
}

impl Default for Project {
    fn default() -> Self {
        Project {
            txt_directory: PathBuf::from("txt"),
            done_directory: PathBuf::from("done"),
            translate_directory: PathBuf::from("totranslate"),
            posts_directory: PathBuf::from("posts"),
            index_file: PathBuf::from("index.html"),
            post_template: PathBuf::from("post-template.html"),
            index: IndexConfig::default(),
            markers: Markers::default(),
            translation: TranslationConfig::default(),
        }
    }
}

/// Describes where new entries go in the index page and what they look like.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct IndexConfig {
    /// CSS selector for the list container; the first match wins.
    pub list_selector: String,

    /// The class of each entry `div`.
    pub entry_class: String,

    /// The glyph placed between the date and the link.
    pub separator: String,

    /// Prefix for entry links, relative to the index page.
    pub posts_url: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        IndexConfig {
            list_selector: String::from("div.blog-list"),
            entry_class: String::from("blog-entry"),
            separator: String::from("~"),
            posts_url: String::from("posts/"),
        }
    }
}

/// The sentinel lines bracketing the block to duplicate.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Markers {
    pub start: String,
    pub end: String,
}

impl Default for Markers {
    fn default() -> Self {
        Markers {
            start: String::from("++DOPPIACOPIA++"),
            end: String::from("++DOPPIACOPIAFINE++"),
        }
    }
}

/// Settings for the machine translation of duplicated blocks. Without an
/// `endpoint` the duplicate is left untranslated.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TranslationConfig {
    /// Base URL of an OpenAI-compatible API, e.g. `https://api.openai.com/v1/`.
    pub endpoint: Option<Url>,
    pub model: String,

    /// The environment variable holding the API key.
    pub api_key_env: String,
    pub source_language: String,
    pub target_language: String,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        TranslationConfig {
            endpoint: None,
            model: String::from("gpt-4o-mini"),
            api_key_env: String::from("TILDEPOST_API_KEY"),
            source_language: String::from("Italian"),
            target_language: String::from("English"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub site_root: PathBuf,
    pub txt_directory: PathBuf,
    pub done_directory: PathBuf,
    pub translate_directory: PathBuf,
    pub posts_directory: PathBuf,
    pub index_file: PathBuf,
    pub post_template: PathBuf,
    pub index: IndexConfig,
    pub markers: Markers,
    pub translation: TranslationConfig,
}

impl Config {
    /// Looks for [`PROJECT_FILE`] in `dir` and then in each of its parents.
    /// When no project file exists anywhere up the tree, `dir` becomes the
    /// site root and the defaults apply. A relative `dir` is resolved against
    /// the working directory first, otherwise `.` would have no parents.
    pub fn from_directory(dir: &Path) -> Result<Config> {
        let dir = absolute(dir)?;
        let dir = dir.as_path();
        let mut current = Some(dir);
        while let Some(candidate) = current {
            let path = candidate.join(PROJECT_FILE);
            if path.is_file() {
                return Config::from_project_file(&path)
                    .map_err(|e| anyhow!("Loading configuration: {:?}", e));
            }
            current = candidate.parent();
        }

        tracing::debug!(
            "no `{}` found above `{}`; using the default layout",
            PROJECT_FILE,
            dir.display()
        );
        Ok(Config::from_project(dir, Project::default()))
    }

    pub fn from_project_file(path: &Path) -> Result<Config> {
        use crate::util::open;
        let project: Project = serde_yaml::from_reader(open(path, "project")?)?;
        match path.parent() {
            None => Err(anyhow!(
                "Can't get parent directory for provided project file path '{:?}'",
                path
            )),
            Some(project_root) => Ok(Config::from_project(project_root, project)),
        }
    }

    /// Builds a configuration with the default layout rooted at `site_root`.
    pub fn with_defaults(site_root: &Path) -> Config {
        Config::from_project(site_root, Project::default())
    }

    fn from_project(site_root: &Path, project: Project) -> Config {
        let txt_directory = site_root.join(&project.txt_directory);
        Config {
            site_root: site_root.to_owned(),
            done_directory: txt_directory.join(&project.done_directory),
            translate_directory: txt_directory.join(&project.translate_directory),
            txt_directory,
            posts_directory: site_root.join(&project.posts_directory),
            index_file: site_root.join(&project.index_file),
            post_template: site_root.join(&project.post_template),
            index: project.index,
            markers: project.markers,
            translation: project.translation,
        }
    }
}

/// Joins a relative `path` onto the working directory. `.` components are
/// dropped so that `parent()` walks the real ancestors.
fn absolute(path: &Path) -> Result<PathBuf> {
    let path = match path.is_absolute() {
        true => path.to_owned(),
        false => std::env::current_dir()
            .map_err(|e| anyhow!("Reading the working directory: {}", e))?
            .join(path),
    };
    Ok(path.components().collect())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults_without_project_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let config = Config::from_directory(dir.path())?;
        assert_eq!(dir.path().join("txt"), config.txt_directory);
        assert_eq!(dir.path().join("txt/done"), config.done_directory);
        assert_eq!(dir.path().join("txt/totranslate"), config.translate_directory);
        assert_eq!(dir.path().join("posts"), config.posts_directory);
        assert_eq!(dir.path().join("index.html"), config.index_file);
        assert_eq!(dir.path().join("post-template.html"), config.post_template);
        assert_eq!(IndexConfig::default(), config.index);
        assert_eq!(None, config.translation.endpoint);
        Ok(())
    }

    #[test]
    fn test_project_file_in_parent_directory() -> Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(
            dir.path().join(PROJECT_FILE),
            "posts_directory: blog\n\
             index:\n  separator: \"|\"\n\
             markers:\n  start: \"<<\"\n  end: \">>\"\n\
             translation:\n  endpoint: \"https://api.example.org/v1/\"\n",
        )?;
        let nested = dir.path().join("txt");
        std::fs::create_dir(&nested)?;

        let config = Config::from_directory(&nested)?;
        assert_eq!(dir.path(), config.site_root);
        assert_eq!(dir.path().join("blog"), config.posts_directory);
        assert_eq!("|", config.index.separator);
        assert_eq!("div.blog-list", config.index.list_selector);
        assert_eq!("<<", config.markers.start);
        assert_eq!(
            Some("https://api.example.org/v1/"),
            config.translation.endpoint.as_ref().map(Url::as_str)
        );
        Ok(())
    }

    #[test]
    fn test_relative_directory_is_resolved() -> Result<()> {
        let cwd = std::env::current_dir()?;
        assert_eq!(cwd, absolute(Path::new("."))?);
        assert_eq!(cwd.join("site/txt"), absolute(Path::new("./site/./txt/."))?);
        assert_eq!(Some(cwd.as_path()), absolute(Path::new("./site"))?.parent());
        Ok(())
    }

    #[test]
    fn test_unknown_key_is_rejected() -> Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join(PROJECT_FILE), "post_dir: blog\n")?;
        assert!(Config::from_directory(dir.path()).is_err());
        Ok(())
    }
}
