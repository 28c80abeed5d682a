use std::fmt;

use reqwest::StatusCode;

/// Why a fetched payload could not be turned into a snapshot.
#[derive(Debug)]
pub enum DecodeError {
    /// Not JSON at all, or truncated.
    Malformed(serde_json::Error),
    /// Valid JSON that doesn't match the snapshot structure.
    Shape(serde_json::Error),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Malformed(e) => write!(f, "malformed JSON: {e}"),
            DecodeError::Shape(e) => write!(f, "unexpected document shape: {e}"),
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::Malformed(e) | DecodeError::Shape(e) => Some(e),
        }
    }
}

impl From<serde_json::Error> for DecodeError {
    fn from(e: serde_json::Error) -> Self {
        use serde_json::error::Category;
        match e.classify() {
            Category::Syntax | Category::Eof | Category::Io => DecodeError::Malformed(e),
            Category::Data => DecodeError::Shape(e),
        }
    }
}

/// Everything that can abort a single collection cycle.
#[derive(Debug)]
pub enum CollectError {
    Fetch(reqwest::Error),
    UpstreamStatus(StatusCode),
    Decode(DecodeError),
    Sink(reqwest::Error),
    SinkStatus { status: StatusCode, body: String },
    CycleInProgress,
}

impl CollectError {
    /// Short label used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            CollectError::Fetch(_) => "fetch",
            CollectError::UpstreamStatus(_) => "upstream_status",
            CollectError::Decode(_) => "decode",
            CollectError::Sink(_) => "sink",
            CollectError::SinkStatus { .. } => "sink_status",
            CollectError::CycleInProgress => "cycle_in_progress",
        }
    }
}

impl fmt::Display for CollectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectError::Fetch(e) => write!(f, "fetch failed: {e}"),
            CollectError::UpstreamStatus(s) => write!(f, "upstream responded with {s}"),
            CollectError::Decode(e) => write!(f, "decode failed: {e}"),
            CollectError::Sink(e) => write!(f, "sink write failed: {e}"),
            CollectError::SinkStatus { status, body } => {
                write!(f, "sink rejected write with {status}: {body}")
            }
            CollectError::CycleInProgress => write!(f, "a collection cycle is already running"),
        }
    }
}

impl std::error::Error for CollectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CollectError::Fetch(e) | CollectError::Sink(e) => Some(e),
            CollectError::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DecodeError> for CollectError {
    fn from(e: DecodeError) -> Self {
        CollectError::Decode(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_is_malformed() {
        let err = serde_json::from_str::<serde_json::Value>("{\"instances\": [").unwrap_err();
        assert!(matches!(DecodeError::from(err), DecodeError::Malformed(_)));

        let err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        assert!(matches!(DecodeError::from(err), DecodeError::Malformed(_)));
    }

    #[test]
    fn test_type_error_is_shape() {
        let err = serde_json::from_str::<Vec<u32>>("{\"a\": 1}").unwrap_err();
        assert!(matches!(DecodeError::from(err), DecodeError::Shape(_)));
    }
}
