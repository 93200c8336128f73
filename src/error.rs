use thiserror::Error;

/// Errors that can occur while scraping a recipe.
///
/// Every failure leaving the scrape endpoint is one of these variants, each
/// with a stable HTTP status and a message safe to show to the client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScrapeError {
    /// Bad or missing URL, or model output with the wrong shape
    #[error("{0}")]
    Validation(String),

    /// The server is missing required configuration
    #[error("{0}")]
    Configuration(String),

    /// The recipe site could not be reached or refused the request
    #[error("{message}")]
    Fetch { status: u16, message: String },

    /// The hosted model call failed
    #[error("{message}")]
    Extraction { status: u16, message: String },

    /// The model output could not be decoded as JSON
    #[error("{0}")]
    Parse(String),
}

/// Coarse error category, stable across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Configuration,
    Fetch,
    Extraction,
    Parse,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "ValidationError",
            ErrorKind::Configuration => "ConfigurationError",
            ErrorKind::Fetch => "FetchError",
            ErrorKind::Extraction => "ExtractionError",
            ErrorKind::Parse => "ParseError",
        }
    }
}

impl ScrapeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScrapeError::Validation(_) => ErrorKind::Validation,
            ScrapeError::Configuration(_) => ErrorKind::Configuration,
            ScrapeError::Fetch { .. } => ErrorKind::Fetch,
            ScrapeError::Extraction { .. } => ErrorKind::Extraction,
            ScrapeError::Parse(_) => ErrorKind::Parse,
        }
    }

    /// HTTP status reported to the client
    pub fn status_code(&self) -> u16 {
        match self {
            ScrapeError::Validation(_) => 400,
            ScrapeError::Configuration(_) => 500,
            ScrapeError::Fetch { status, .. } => *status,
            ScrapeError::Extraction { status, .. } => *status,
            ScrapeError::Parse(_) => 500,
        }
    }

    /// Human-readable message for the client
    pub fn status_message(&self) -> String {
        self.to_string()
    }

    /// Classify a model invocation failure by its message.
    pub fn extraction(message: impl Into<String>) -> Self {
        let message = message.into();
        let class = ExtractionFailure::classify(&message);
        ScrapeError::Extraction {
            status: class.status_code(),
            message: format!("{}: {}", class.summary(), message),
        }
    }
}

/// Sub-kinds of a model invocation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionFailure {
    ApiKey,
    Permission,
    Quota,
    InvalidArgument,
    Network,
    Unknown,
}

/// Message patterns checked in order, first match wins.
///
/// API key problems come before network problems: key errors from the model
/// service often mention the request or connection as well.
const EXTRACTION_PATTERNS: &[(ExtractionFailure, &[&str])] = &[
    (ExtractionFailure::ApiKey, &["api key", "api_key_invalid"]),
    (
        ExtractionFailure::Permission,
        &["permission_denied", "permission denied", "forbidden"],
    ),
    (
        ExtractionFailure::Quota,
        &["quota", "resource_exhausted", "rate limit", "too many requests"],
    ),
    (
        ExtractionFailure::InvalidArgument,
        &["invalid_argument", "invalid argument"],
    ),
    (
        ExtractionFailure::Network,
        &["timed out", "timeout", "connection", "network", "dns"],
    ),
];

impl ExtractionFailure {
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        EXTRACTION_PATTERNS
            .iter()
            .find(|(_, patterns)| patterns.iter().any(|p| lower.contains(p)))
            .map(|(failure, _)| *failure)
            .unwrap_or(ExtractionFailure::Unknown)
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ExtractionFailure::ApiKey => 403,
            ExtractionFailure::Permission => 403,
            ExtractionFailure::Quota => 429,
            ExtractionFailure::InvalidArgument => 400,
            ExtractionFailure::Network => 503,
            ExtractionFailure::Unknown => 500,
        }
    }

    fn summary(&self) -> &'static str {
        match self {
            ExtractionFailure::ApiKey => "AI service rejected the API key",
            ExtractionFailure::Permission => "AI service denied access",
            ExtractionFailure::Quota => "AI service quota exceeded, try again later",
            ExtractionFailure::InvalidArgument => "AI service rejected the request",
            ExtractionFailure::Network => "AI service is unreachable",
            ExtractionFailure::Unknown => "AI extraction failed",
        }
    }
}
