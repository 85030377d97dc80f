//! Retrieval of raw datasets from their declared URL.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;

use crate::atomic::AtomicFile;
use crate::error::{IngestError, Result};
use crate::source::Source;

/// HTTP request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Downloads the source's raw file from its `url` into the raw directory.
///
/// The download lands in a temp file first, so an interrupted transfer never
/// leaves a truncated raw file. Returns the number of bytes written.
pub fn fetch_raw(source: &Source) -> Result<u64> {
    let metadata = source.metadata();
    let url = metadata.url.as_deref().ok_or_else(|| IngestError::MissingUrl {
        file: metadata.file.clone(),
    })?;
    let target = &source.paths().raw;

    tracing::info!(url, target = %target.display(), "Fetching raw data");

    let fetch_error = |source: reqwest::Error| IngestError::Fetch {
        url: url.to_string(),
        source,
    };
    let client = Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(fetch_error)?;
    let mut response = client
        .get(url)
        .header(USER_AGENT, concat!("obr/", env!("CARGO_PKG_VERSION")))
        .send()
        .and_then(|response| response.error_for_status())
        .map_err(fetch_error)?;

    let (output, mut file) = AtomicFile::create(target)?;
    let bytes = response.copy_to(&mut file).map_err(fetch_error)?;
    output.commit(file)?;

    tracing::info!(url, bytes, "Fetched raw data");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::PathLayout;
    use crate::source::SourceDocument;
    use serde_json::json;

    #[test]
    fn test_fetch_requires_url() {
        let source = SourceDocument::from_value(
            "registry.json",
            json!({"format": "csv", "file": "registry.csv", "info": {}}),
        )
        .validate(&PathLayout::default())
        .unwrap();

        let err = fetch_raw(&source).unwrap_err();
        assert!(matches!(err, IngestError::MissingUrl { ref file } if file == "registry.csv"));
    }
}
