use thiserror::Error;
use wasm_bindgen::JsValue;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures outside the gameplay core: config loading and DOM wiring.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("config parse error: {0}")]
    ConfigParse(String),

    #[error("no window")]
    MissingWindow,

    #[error("no document")]
    MissingDocument,

    /// A JS exception thrown by a DOM call, rendered to text.
    #[error("dom error: {0}")]
    Dom(String),
}

impl Error {
    pub fn dom(value: JsValue) -> Self {
        Error::Dom(value.as_string().unwrap_or_else(|| format!("{value:?}")))
    }
}

impl From<Error> for JsValue {
    fn from(err: Error) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_readable() {
        assert_eq!(Error::MissingWindow.to_string(), "no window");
        assert_eq!(
            Error::InvalidConfig("duration_ms must be positive".into()).to_string(),
            "invalid config: duration_ms must be positive"
        );
    }
}
