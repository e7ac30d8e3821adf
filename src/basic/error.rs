use std::error::Error;
use std::sync::{PoisonError, RwLockReadGuard, RwLockWriteGuard};

use derive_more::Display;

pub static GENERAL_SPLIT: &str = "##";

/// Unified error of the configuration source clients.
///
/// The display form is `<code>##<message>`, the code follows the HTTP status
/// family the failure is closest to.
#[derive(Display, Debug, Clone, PartialEq, Eq)]
pub enum ConfError {
    #[display("500##{_0}")]
    NotInitialized(String),
    #[display("400##{_0}")]
    EmptySeed(String),
    #[display("503##{_0}")]
    NoMembers(String),
    #[display("404##{_0}")]
    PluginNotFound(String),
    #[display("400##{_0}")]
    EmptyPayload(String),
    #[display("400##{_0}")]
    EmptyKeys(String),
    #[display("404##{_0}")]
    KeyNotFound(String),
    #[display("503##{_0}")]
    TransportFailure(String),
    #[display("406##{_0}")]
    DecodeFailure(String),
    #[display("{_0}##{_1}")]
    BadStatus(u16, String),
    #[display("406##{_0}")]
    FormatError(String),
    #[display("501##{_0}")]
    NotImplemented(String),
    #[display("500##{_0}")]
    InternalError(String),
}

impl ConfError {
    pub fn code(&self) -> String {
        let text = self.to_string();
        match text.find(GENERAL_SPLIT) {
            Some(idx) => text[..idx].to_string(),
            None => "-1".to_string(),
        }
    }

    pub fn message(&self) -> String {
        let text = self.to_string();
        match text.find(GENERAL_SPLIT) {
            Some(idx) => text[idx + GENERAL_SPLIT.len()..].to_string(),
            None => text,
        }
    }

    /// Failures that come from the network rather than from the payload.
    ///
    /// These are the ones counted against the host budget of a multi-host pull.
    pub fn is_host_failure(&self) -> bool {
        matches!(self, ConfError::TransportFailure(_) | ConfError::BadStatus(..))
    }
}

impl Error for ConfError {}

impl From<serde_json::Error> for ConfError {
    fn from(error: serde_json::Error) -> Self {
        ConfError::DecodeFailure(format!("[ConfSource.Basic] {error}"))
    }
}

impl From<url::ParseError> for ConfError {
    fn from(error: url::ParseError) -> Self {
        ConfError::FormatError(format!("[ConfSource.Basic] {error}"))
    }
}

impl From<config::ConfigError> for ConfError {
    fn from(error: config::ConfigError) -> Self {
        ConfError::FormatError(format!("[ConfSource.Config] {error}"))
    }
}

impl<P> From<PoisonError<RwLockReadGuard<'_, P>>> for ConfError {
    fn from(error: PoisonError<RwLockReadGuard<'_, P>>) -> Self {
        ConfError::InternalError(format!("[ConfSource.Basic] {error}"))
    }
}

impl<P> From<PoisonError<RwLockWriteGuard<'_, P>>> for ConfError {
    fn from(error: PoisonError<RwLockWriteGuard<'_, P>>) -> Self {
        ConfError::InternalError(format!("[ConfSource.Basic] {error}"))
    }
}

#[cfg(test)]
mod tests {
    use super::ConfError;

    #[test]
    fn test_code_and_message() {
        let error = ConfError::KeyNotFound("No Key found : timeout".to_string());
        assert_eq!(error.code(), "404");
        assert_eq!(error.message(), "No Key found : timeout");
        assert_eq!(error.to_string(), "404##No Key found : timeout");

        let error = ConfError::BadStatus(502, "statusCode: 502, resp body: ".to_string());
        assert_eq!(error.code(), "502");
        assert!(error.is_host_failure());
        assert!(!ConfError::DecodeFailure("bad".to_string()).is_host_failure());
    }
}
