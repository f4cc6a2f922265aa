//! Errors from the similarity service client.

#[derive(Debug, thiserror::Error)]
pub enum SimilarityError {
    /// Transport failure: connect, DNS, timeout.
    #[error("Similarity service request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service answered with a non-2xx status.
    #[error("Similarity service returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The response body did not match the expected shape.
    #[error("Invalid similarity service response: {0}")]
    Decode(String),
}

impl SimilarityError {
    /// Client errors (4xx) will fail the same way on retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            SimilarityError::Request(_) => true,
            SimilarityError::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            SimilarityError::Decode(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_retryable() {
        let err = SimilarityError::HttpStatus {
            status: 503,
            body: "AI models not loaded".to_string(),
        };
        assert!(err.is_retryable());
        assert_eq!(
            err.to_string(),
            "Similarity service returned HTTP 503: AI models not loaded"
        );
    }

    #[test]
    fn client_errors_are_not() {
        let err = SimilarityError::HttpStatus {
            status: 400,
            body: "Could not generate any embeddings".to_string(),
        };
        assert!(!err.is_retryable());
        assert!(!SimilarityError::Decode("missing field".to_string()).is_retryable());
    }
}
