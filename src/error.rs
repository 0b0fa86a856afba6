//! Error handling

/// Startup configuration problems.
#[derive(Debug)]
pub enum ConfigError {
    /// A required value was absent or blank.
    Missing(&'static str),
    /// The public base URL didn't parse.
    InvalidUrl(String, url::ParseError),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(name) => write!(f, "Missing required configuration value {name}"),
            Self::InvalidUrl(value, err) => write!(f, "Invalid public base URL {value:?}: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// The selector had nothing to choose from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SelectError {
    /// The pool listed no usable images.
    EmptyPool,
}

impl std::fmt::Display for SelectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyPool => write!(f, "No jpg, jpeg or png images found in the pool"),
        }
    }
}

impl std::error::Error for SelectError {}

/// Reasons a run stops before the record is published and the cursor saved.
#[derive(Debug)]
pub enum PipelineError {
    /// Nothing to select.
    EmptyPool,
    /// Listing or reading the pool failed.
    Source(anyhow::Error),
    /// The model call failed or returned nothing usable.
    Generator(anyhow::Error),
    /// Writing or uploading the record failed.
    Publish(anyhow::Error),
    /// The record went out but the cursor couldn't be saved.
    Cursor(anyhow::Error),
}

impl From<SelectError> for PipelineError {
    fn from(err: SelectError) -> Self {
        match err {
            SelectError::EmptyPool => PipelineError::EmptyPool,
        }
    }
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyPool => write!(f, "{}", SelectError::EmptyPool),
            Self::Source(err) => write!(f, "Image pool error: {err:#}"),
            Self::Generator(err) => write!(f, "Haiku generation failed: {err:#}"),
            Self::Publish(err) => write!(f, "Publishing failed: {err:#}"),
            Self::Cursor(err) => write!(f, "Saving the cursor failed: {err:#}"),
        }
    }
}

impl std::error::Error for PipelineError {}
