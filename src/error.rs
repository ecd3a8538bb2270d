use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    /// The selected place has no geometry, e.g. free text that was never
    /// matched to a suggestion.
    #[error("No address available for input: '{input}'")]
    NoAddress { input: String },
}

#[derive(Debug, Error)]
pub enum MapsError {
    #[error("{service} request failed with status {status}{}", suffix(.message))]
    Status {
        service: &'static str,
        status: String,
        message: Option<String>,
    },
    #[error("{service} returned {got} results for {expected} destinations")]
    Mismatch {
        service: &'static str,
        expected: usize,
        got: usize,
    },
}

fn suffix(message: &Option<String>) -> String {
    match message {
        Some(x) => format!(": {x}"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        let err = SearchError::NoAddress {
            input: "Zilker".to_string(),
        };
        assert_eq!(err.to_string(), "No address available for input: 'Zilker'");

        let err = MapsError::Status {
            service: "distance matrix",
            status: "REQUEST_DENIED".to_string(),
            message: Some("API key invalid".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "distance matrix request failed with status REQUEST_DENIED: API key invalid"
        );

        let err = MapsError::Status {
            service: "geocode",
            status: "OVER_QUERY_LIMIT".to_string(),
            message: None,
        };
        assert_eq!(err.to_string(), "geocode request failed with status OVER_QUERY_LIMIT");
    }
}
