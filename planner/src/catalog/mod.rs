pub mod profile;
pub mod template;

use anyhow::bail;
use budgetcore::model::Channel;
use std::collections::BTreeSet;

pub use profile::ChannelEntry;
pub use template::default_catalog;

/// Builds every catalog entry, rejecting duplicate ids.
pub fn build_channels(entries: &[ChannelEntry]) -> anyhow::Result<Vec<Channel>> {
    let mut seen = BTreeSet::new();
    let mut channels = Vec::with_capacity(entries.len());
    for entry in entries {
        if !seen.insert(entry.id.as_str()) {
            bail!("duplicate channel id {}", entry.id);
        }
        channels.push(entry.build()?);
    }
    Ok(channels)
}
