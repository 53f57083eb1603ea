//! Upstream cat-fact fetch, kept off the Hyper types.

use serde::Deserialize;
use thiserror::Error;

const CATFACT_URL: &str = "https://catfact.ninja/fact";

#[derive(Debug, Error)]
pub enum CatFactError {
    #[error("Cat fact request failed: {0}")]
    Upstream(#[from] reqwest::Error),
    #[error("Cat fact response had no fact text")]
    MalformedResponse,
}

#[derive(Deserialize)]
struct CatFactBody {
    #[serde(default)]
    fact: Option<String>,
}

/// Pull the fact string out of an upstream response body.
pub fn parse_fact(bytes: &[u8]) -> Result<String, CatFactError> {
    let body: CatFactBody =
        serde_json::from_slice(bytes).map_err(|_| CatFactError::MalformedResponse)?;
    body.fact
        .filter(|f| !f.is_empty())
        .ok_or(CatFactError::MalformedResponse)
}

/// Fetch one cat fact from the public upstream API.
pub async fn api_fetch_fact() -> Result<String, CatFactError> {
    let resp = reqwest::get(CATFACT_URL).await?.error_for_status()?;
    let bytes = resp.bytes().await?;
    parse_fact(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_the_fact_field() {
        let body = br#"{"fact":"Cats sleep a lot.","length":17}"#;
        assert_eq!(parse_fact(body).unwrap(), "Cats sleep a lot.");
    }

    #[test]
    fn missing_or_empty_fact_is_malformed() {
        assert!(matches!(
            parse_fact(br#"{"length":0}"#),
            Err(CatFactError::MalformedResponse)
        ));
        assert!(matches!(
            parse_fact(br#"{"fact":""}"#),
            Err(CatFactError::MalformedResponse)
        ));
        assert!(matches!(
            parse_fact(b"not json"),
            Err(CatFactError::MalformedResponse)
        ));
    }
}
