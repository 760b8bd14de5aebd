use std::fmt;

use serde::{Deserialize, Serialize};

/// A self-describing image payload: `data:<mime>;base64,<payload>`.
/// The payload is validated for shape only and never decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DataUri {
    mime_type: String,
    raw: String,
}

impl DataUri {
    pub fn parse(input: &str) -> Result<Self, DataUriError> {
        let input = input.trim();
        let rest = input
            .strip_prefix("data:")
            .ok_or(DataUriError::MissingScheme)?;
        let (mime_type, payload) = rest
            .split_once(";base64,")
            .ok_or(DataUriError::NotBase64)?;

        if mime_type.is_empty() || !mime_type.contains('/') {
            return Err(DataUriError::InvalidMimeType(mime_type.to_string()));
        }
        if payload.is_empty() {
            return Err(DataUriError::EmptyPayload);
        }

        Ok(Self {
            mime_type: mime_type.to_string(),
            raw: input.to_string(),
        })
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl TryFrom<String> for DataUri {
    type Error = DataUriError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        DataUri::parse(&value)
    }
}

impl From<DataUri> for String {
    fn from(value: DataUri) -> Self {
        value.raw
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataUriError {
    MissingScheme,
    NotBase64,
    InvalidMimeType(String),
    EmptyPayload,
}

impl fmt::Display for DataUriError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataUriError::MissingScheme => write!(f, "data URI must start with 'data:'"),
            DataUriError::NotBase64 => write!(f, "data URI must be base64 encoded"),
            DataUriError::InvalidMimeType(m) => write!(f, "invalid MIME type '{}'", m),
            DataUriError::EmptyPayload => write!(f, "data URI has no payload"),
        }
    }
}

impl std::error::Error for DataUriError {}

/// The two images compared at onboarding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRequest {
    pub live_photo_data_uri: DataUri,
    pub id_photo_data_uri: DataUri,
}

/// Verdict returned by the face-match service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationOutcome {
    pub is_match: bool,
    /// Likelihood of a match in `[0, 1]`
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl VerificationOutcome {
    /// Outcome used when the verifier could not be reached.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            is_match: false,
            confidence: 0.0,
            reason: Some(reason.into()),
        }
    }

    pub fn has_valid_confidence(&self) -> bool {
        (0.0..=1.0).contains(&self.confidence)
    }

    /// Onboarding proceeds only on a match at or above the threshold.
    pub fn passes(&self, min_confidence: f64) -> bool {
        self.is_match && self.confidence >= min_confidence
    }
}
