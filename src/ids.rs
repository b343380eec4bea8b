// src/ids.rs

use crate::error::ImportError;

/// Base and table ids taken from an Airtable URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AirtableIds {
    pub base_id: String,
    pub table_id: String,
}

/// Parse the base and table ids from an Airtable URL by position.
///
/// `https://airtable.com/appO9bi5ZHMSWDiEh/tblyVC1fMLkehAy7N/viwYtnOXAKqQ3rlWk`
/// gives base `appO9bi5ZHMSWDiEh` and table `tblyVC1fMLkehAy7N`. Segment
/// contents are not checked.
pub fn parse_ids_from_url(url: &str) -> Result<AirtableIds, ImportError> {
    let parts: Vec<&str> = url.split('/').collect();
    if parts.len() < 3 {
        return Err(ImportError::MalformedUrl(url.to_string()));
    }

    let n = parts.len();
    Ok(AirtableIds {
        base_id: parts[n - 3].to_string(),
        table_id: parts[n - 2].to_string(),
    })
}
