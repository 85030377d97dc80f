//! Label map construction.
//!
//! For each standard field the locator is resolved by precedence:
//!
//! 1. a locator given directly in `info` (structured address fields excluded)
//! 2. a locator in the `info.address` group
//! 3. a literal in the `force` object
//!
//! Fields matched by none of these are left out of the map. XML locators are
//! rewritten into descendant searches from the record element.

use obr_model::{
    ADDRESS_GROUP, DataFormat, FieldSource, LabelMap, Locator, STANDARD_FIELDS, SourceMetadata,
    is_address_field, is_standard_field, xml_search_path,
};

/// Builds the label map for validated metadata.
pub fn build_label_map(metadata: &SourceMetadata) -> LabelMap {
    warn_ignored_keys(metadata);

    let mut map = LabelMap::new();
    for field in STANDARD_FIELDS {
        let direct = metadata
            .info
            .field(field)
            .filter(|_| !is_address_field(field));

        let source = if let Some(locator) = direct.or_else(|| metadata.info.address_field(field)) {
            FieldSource::Record(locate(metadata.format, locator))
        } else if metadata.forced(field).is_some() {
            FieldSource::Forced
        } else {
            continue;
        };
        map.insert(field, source);
    }

    tracing::debug!(
        file = %metadata.file,
        fields = map.len(),
        map = %describe(&map),
        "Built label map"
    );
    map
}

fn locate(format: DataFormat, locator: &Locator) -> Locator {
    match format {
        DataFormat::Csv => locator.clone(),
        DataFormat::Xml => locator.map_paths(xml_search_path),
    }
}

fn warn_ignored_keys(metadata: &SourceMetadata) {
    for key in metadata.info.fields.keys() {
        if key == ADDRESS_GROUP {
            continue;
        }
        if !is_standard_field(key) {
            tracing::warn!(file = %metadata.file, key = %key, "Ignoring unknown field in info");
        } else if is_address_field(key) {
            tracing::warn!(
                file = %metadata.file,
                key = %key,
                "Ignoring address field given directly in info; declare it in the address group"
            );
        }
    }
}

fn describe(map: &LabelMap) -> String {
    map.iter()
        .map(|entry| format!("{}={}", entry.field, entry.source))
        .collect::<Vec<_>>()
        .join(", ")
}
