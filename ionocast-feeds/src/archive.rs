//! ZIP payload handling for the TechTIDE adapters.
//!
//! The archive container failing to open is a source-unavailable condition;
//! a single unreadable entry is a malformed record and is skipped.

use std::io::{Cursor, Read};

use zip::ZipArchive;

use crate::feed::{FeedError, FeedSource};

/// Extract the text of every archive entry whose name starts with `prefix`.
pub(crate) fn text_entries(
    feed: FeedSource,
    bytes: &[u8],
    prefix: &str,
) -> Result<Vec<String>, FeedError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| FeedError::Payload {
        feed,
        detail: format!("unreadable archive: {e}"),
    })?;

    let mut out = Vec::new();
    for index in 0..archive.len() {
        let mut entry = match archive.by_index(index) {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("{feed}: skipping unreadable archive entry {index}: {e}");
                continue;
            }
        };
        if !entry.is_file() || !entry.name().starts_with(prefix) {
            continue;
        }
        let mut text = String::new();
        if let Err(e) = entry.read_to_string(&mut text) {
            log::warn!("{feed}: skipping undecodable archive entry {index}: {e}");
            continue;
        }
        out.push(text);
    }
    Ok(out)
}
