use crate::records::{CollectionRecord, ContentRecord, JoinedRow, StatsRecord};
use std::collections::HashMap;

/// Joins the three stage outputs into one row per content item
///
/// Every content record is kept. It gets one row per collection record with
/// the same collection key, or a single row with empty artist fields when
/// there is none. Stats are looked up by content key; a missing or degraded
/// stats record leaves the row's stats empty.
pub fn join_rows(
    collections: &[CollectionRecord],
    contents: &[ContentRecord],
    stats: &[StatsRecord],
) -> Vec<JoinedRow> {
    let mut by_collection: HashMap<&str, Vec<&CollectionRecord>> = HashMap::new();
    for record in collections {
        by_collection
            .entry(record.collection_key.as_str())
            .or_default()
            .push(record);
    }

    let by_content: HashMap<&str, &StatsRecord> = stats
        .iter()
        .map(|record| (record.content_key.as_str(), record))
        .collect();

    let mut rows = Vec::with_capacity(contents.len());
    for content in contents {
        let values = by_content
            .get(content.content_key.as_str())
            .and_then(|record| record.values.clone());

        let owners = by_collection.get(content.collection_key.as_str());
        if owners.is_none() {
            tracing::warn!(
                "Content {} refers to unknown collection {}",
                content.content_key,
                content.collection_key
            );
        }

        let lineage: Vec<(&str, &str)> = match owners {
            Some(owners) => owners
                .iter()
                .map(|c| (c.artist_key.as_str(), c.artist_name.as_str()))
                .collect(),
            None => vec![("", "")],
        };

        for (artist_key, artist_name) in lineage {
            rows.push(JoinedRow {
                artist_key: artist_key.to_string(),
                artist_name: artist_name.to_string(),
                collection_key: content.collection_key.clone(),
                collection_name: content.collection_name.clone(),
                content_key: content.content_key.clone(),
                kind: content.kind,
                stats: values.clone(),
            });
        }
    }
    rows
}
