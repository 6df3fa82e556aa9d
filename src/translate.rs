//! Line-by-line machine translation. The duplicator only needs "text in,
//! text out", so translation sits behind the [`Translate`] trait. The real
//! implementation talks to an OpenAI-compatible chat-completions endpoint;
//! when none is configured, [`Passthrough`] hands lines back untouched.

use crate::config::TranslationConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};
use url::Url;

/// Translates one line of text.
pub trait Translate {
    fn translate(&self, line: &str) -> Result<String>;
}

/// The degraded mode: the "translation" is the input itself.
pub struct Passthrough;

impl Translate for Passthrough {
    fn translate(&self, line: &str) -> Result<String> {
        Ok(line.to_owned())
    }
}

/// Builds the translator described by `config`. Without an endpoint, or
/// without the API key in the environment, this warns and returns
/// [`Passthrough`].
pub fn from_config(config: &TranslationConfig) -> Box<dyn Translate> {
    let endpoint = match &config.endpoint {
        Some(endpoint) => endpoint,
        None => {
            warn!("no translation endpoint configured: the second copy will not be translated");
            return Box::new(Passthrough);
        }
    };
    match std::env::var(&config.api_key_env) {
        Ok(api_key) => Box::new(ChatTranslator::new(endpoint.clone(), api_key, config)),
        Err(_) => {
            warn!(
                "`{}` is not set: the second copy will not be translated",
                config.api_key_env
            );
            Box::new(Passthrough)
        }
    }
}

/// A translator backed by a chat-completions API.
pub struct ChatTranslator {
    client: reqwest::blocking::Client,
    endpoint: Url,
    api_key: String,
    model: String,
    system_prompt: String,
}

impl ChatTranslator {
    /// `endpoint` is the API base, such as `https://api.openai.com/v1`; the
    /// `chat/completions` path is appended to it.
    pub fn new(endpoint: Url, api_key: String, config: &TranslationConfig) -> Self {
        ChatTranslator {
            client: reqwest::blocking::Client::new(),
            endpoint: with_trailing_slash(endpoint),
            api_key,
            model: config.model.clone(),
            system_prompt: format!(
                "Translate the user's text from {} to {}. \
                 Reply with the translation only, on a single line, \
                 keeping any markdown markers as they are.",
                config.source_language, config.target_language
            ),
        }
    }

    fn completions_url(&self) -> Result<Url> {
        Ok(self.endpoint.join("chat/completions")?)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

/// `Url::join` replaces the last path segment unless the base ends in `/`.
fn with_trailing_slash(mut endpoint: Url) -> Url {
    if !endpoint.path().ends_with('/') {
        let path = format!("{}/", endpoint.path());
        endpoint.set_path(&path);
    }
    endpoint
}

/// Turns a chat reply into exactly one line of text.
fn reply_line(response: ChatResponse) -> Result<String> {
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or(Error::EmptyResponse)?;

    // The block is rebuilt line by line, so a reply must not add lines.
    let line = content
        .lines()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    match line.is_empty() {
        true => Err(Error::EmptyResponse),
        false => Ok(line),
    }
}

impl Translate for ChatTranslator {
    fn translate(&self, line: &str) -> Result<String> {
        debug!("translating with {}: {}", self.model, line);
        let url = self.completions_url()?;
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &self.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: line,
                },
            ],
            temperature: 0.0,
        };

        let response: ChatResponse = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()?
            .error_for_status()?
            .json()?;
        reply_line(response)
    }
}

/// Represents the result of a translation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error while translating.
#[derive(Debug)]
pub enum Error {
    /// Returned for transport errors and non-success HTTP statuses.
    Http(reqwest::Error),

    /// Returned when the endpoint can't be joined with the API path.
    UrlParse(url::ParseError),

    /// Returned when the reply carries no text.
    EmptyResponse,
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Http(err) => write!(f, "Translation request failed: {}", err),
            Error::UrlParse(err) => err.fmt(f),
            Error::EmptyResponse => write!(f, "Translation reply was empty"),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Http(err) => Some(err),
            Error::UrlParse(err) => Some(err),
            Error::EmptyResponse => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    /// Converts a [`reqwest::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for HTTP calls.
    fn from(err: reqwest::Error) -> Error {
        Error::Http(err)
    }
}

impl From<url::ParseError> for Error {
    /// Converts a [`url::ParseError`] into an [`Error`]. It allows us to use
    /// the `?` operator for URL joining.
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_passthrough_returns_input() -> Result<()> {
        assert_eq!("Ciao mondo", Passthrough.translate("Ciao mondo")?);
        Ok(())
    }

    #[test]
    fn test_request_shape() -> serde_json::Result<()> {
        let request = ChatRequest {
            model: "m",
            messages: [
                ChatMessage {
                    role: "system",
                    content: "s",
                },
                ChatMessage {
                    role: "user",
                    content: "Ciao",
                },
            ],
            temperature: 0.0,
        };
        assert_eq!(
            r#"{"model":"m","messages":[{"role":"system","content":"s"},{"role":"user","content":"Ciao"}],"temperature":0.0}"#,
            serde_json::to_string(&request)?
        );
        Ok(())
    }

    #[test]
    fn test_parse_reply() -> serde_json::Result<()> {
        let response: ChatResponse = serde_json::from_str(
            r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":" Hello world \n"}}]}"#,
        )?;
        assert_eq!(
            Some(" Hello world \n"),
            response.choices[0].message.content.as_deref()
        );
        Ok(())
    }

    fn reply(json: &str) -> Result<String> {
        reply_line(serde_json::from_str(json).expect("reply fixture is valid JSON"))
    }

    #[test]
    fn test_reply_is_folded_onto_one_line() -> Result<()> {
        assert_eq!(
            "Hello world, and goodbye.",
            reply(r#"{"choices":[{"message":{"content":" Hello world,\r\n\n and goodbye. \n"}}]}"#)?
        );
        Ok(())
    }

    #[test]
    fn test_reply_without_text_is_an_error() {
        for json in &[
            r#"{"choices":[]}"#,
            r#"{"choices":[{"message":{"content":null}}]}"#,
            r#"{"choices":[{"message":{"content":" \n "}}]}"#,
        ] {
            match reply(json) {
                Err(Error::EmptyResponse) => {}
                other => panic!("{}: expected EmptyResponse, got {:?}", json, other),
            }
        }
    }

    #[test]
    fn test_endpoint_keeps_its_api_prefix() -> Result<()> {
        for endpoint in &["https://api.example.org/v1", "https://api.example.org/v1/"] {
            let translator = ChatTranslator::new(
                Url::parse(endpoint)?,
                String::from("key"),
                &TranslationConfig::default(),
            );
            assert_eq!(
                "https://api.example.org/v1/chat/completions",
                translator.completions_url()?.as_str()
            );
        }
        Ok(())
    }

    #[test]
    fn test_without_endpoint_falls_back_to_passthrough() -> Result<()> {
        let translator = from_config(&TranslationConfig::default());
        assert_eq!("Buongiorno", translator.translate("Buongiorno")?);
        Ok(())
    }
}
