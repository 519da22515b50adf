use std::path::Path;

use indexmap::IndexMap;

use crate::error::{IngestError, Result};

/// One entry of the JSON feed configuration: `{feed_name: archive_url}`.
/// The feed index used for identifier prefixing is the ordinal position in
/// the file, which is why this loads into an order-preserving map rather
/// than a plain `HashMap`.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub name: String,
    pub archive_url: String,
}

pub fn load_feed_config(path: impl AsRef<Path>) -> Result<Vec<FeedConfig>> {
    let text = std::fs::read_to_string(path)?;
    let map: IndexMap<String, String> = serde_json::from_str(&text).map_err(|err| {
        IngestError::MalformedFeed {
            feed: "<config>".to_string(),
            reason: err.to_string(),
        }
    })?;
    Ok(map
        .into_iter()
        .map(|(name, archive_url)| FeedConfig { name, archive_url })
        .collect())
}
