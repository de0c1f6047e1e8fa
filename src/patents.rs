// Patents facade: fetch a Google Patents CSV export and extract identifiers

use crate::error::ExtractError;
use crate::extractor::{ExtractConfig, Extractor};
use crate::parser::CompositeKeyParser;
use crate::transport::FeedClient;
use tracing::info;

/// Jurisdiction code for United States patents
pub const US: &str = "US";

/// Fetch `url` and extract identifiers for `jurisdiction`.
///
/// Transport failures (including a non-success status) abort before any line
/// is parsed and come back as `ExtractError::Transport`.
pub async fn fetch_identifiers(
    client: &FeedClient,
    url: &str,
    jurisdiction: &str,
    config: ExtractConfig,
) -> Result<Vec<String>, ExtractError> {
    let reader = client.open(url).await?;

    let extractor = Extractor::new(CompositeKeyParser::new(jurisdiction)).with_config(config);
    let identifiers = extractor.extract(reader).await?;

    info!(
        url = %url,
        jurisdiction = %jurisdiction,
        count = identifiers.len(),
        "Extracted patent identifiers"
    );
    Ok(identifiers)
}

/// US patent numbers from a Google Patents CSV export.
/// If `max_results` > 0, at most that many are returned.
pub async fn us_patents(
    client: &FeedClient,
    url: &str,
    max_results: usize,
) -> Result<Vec<String>, ExtractError> {
    let config = ExtractConfig::new().with_max_results(max_results);
    fetch_identifiers(client, url, US, config).await
}
