use thiserror::Error;

/// Failures of a resolution round.
///
/// Everything except [`ResolveError::AllFailed`] concerns a single document
/// and is tolerated by the resolver as long as another document succeeds.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Evidence resolve request for {document_id} failed: {source}")]
    Transport {
        document_id: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Evidence resolve for {document_id} returned an unreadable body: {source}")]
    Decode {
        document_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Evidence resolve for {document_id} rejected: {message}")]
    Service { document_id: String, message: String },

    #[error("No anchor returned for {document_id}.")]
    EmptyAnchors { document_id: String },

    #[error("Evidence resolve failed for all referenced documents.")]
    AllFailed { attempted: usize },
}

impl ResolveError {
    /// Document the failure belongs to; `None` for a whole-round failure.
    pub fn document_id(&self) -> Option<&str> {
        match self {
            ResolveError::Transport { document_id, .. }
            | ResolveError::Decode { document_id, .. }
            | ResolveError::Service { document_id, .. }
            | ResolveError::EmptyAnchors { document_id } => Some(document_id),
            ResolveError::AllFailed { .. } => None,
        }
    }
}

/// Failure of one call to the tender API.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("unreadable response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0}")]
    Rejected(String),
}

impl ResolveError {
    /// Attribute an API failure to the document whose resolution it broke.
    pub fn from_api(document_id: &str, error: ApiError) -> Self {
        let document_id = document_id.to_string();
        match error {
            ApiError::Transport(source) => ResolveError::Transport { document_id, source },
            ApiError::Decode(source) => ResolveError::Decode { document_id, source },
            ApiError::Rejected(message) => ResolveError::Service { document_id, message },
        }
    }
}
