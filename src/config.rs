//! Dispatcher configuration.

use std::ffi::OsString;

use serde::Deserialize;

/// Knobs for [`App`](crate::App).
///
/// Deserializable, so it can sit inside an application's own config file:
///
/// ```rust
/// let config: kiri::Config = serde_json::from_str(r#"{"expose_error_details": false}"#).unwrap();
/// assert!(!config.expose_error_details);
/// ```
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Include the error message in built-in `500` bodies.
    ///
    /// On by default. Turn it off in production to keep internals private.
    pub expose_error_details: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self { expose_error_details: true }
    }
}

impl Config {
    /// Reads `KIRI_ENV` and `KIRI_EXPOSE_ERRORS` from the process environment.
    pub fn from_env() -> Self {
        Self::from_vars(process_vars())
    }

    /// `KIRI_ENV=production` hides error details; an explicit
    /// `KIRI_EXPOSE_ERRORS` wins over it either way.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut production = false;
        let mut explicit = None;
        for (key, value) in vars {
            match key.as_ref() {
                "KIRI_ENV" => production = value.as_ref().eq_ignore_ascii_case("production"),
                "KIRI_EXPOSE_ERRORS" => explicit = Some(truthy(value.as_ref())),
                _ => {}
            }
        }
        Self { expose_error_details: explicit.unwrap_or(!production) }
    }
}

/// The process environment. Keys and values that are not valid UTF-8 are
/// converted lossily instead of aborting, since CGI gateways forward raw
/// client header bytes in `HTTP_*` variables.
pub(crate) fn process_vars() -> Vec<(String, String)> {
    lossy_vars(std::env::vars_os())
}

fn lossy_vars(vars: impl IntoIterator<Item = (OsString, OsString)>) -> Vec<(String, String)> {
    vars.into_iter()
        .map(|(key, value)| (key.to_string_lossy().into_owned(), value.to_string_lossy().into_owned()))
        .collect()
}

fn truthy(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off" | ""
    )
}
