//! Metadata document validation.
//!
//! Documents are checked as untyped JSON, then converted into
//! [`SourceMetadata`]. Nothing downstream looks at the raw JSON again.

use obr_model::{
    ADDRESS_GROUP, DataFormat, ElementPath, FULL_ADDR, SchemaError, SourceMetadata,
    is_address_field, is_force_field, is_standard_field, xml_search_path,
};
use serde_json::{Map, Value};

/// Validates a metadata document and converts it to its typed form.
pub fn parse_metadata(document: &Value) -> Result<SourceMetadata, SchemaError> {
    validate_document(document)?;
    let mut document = document.clone();
    if let Some(doc) = document.as_object_mut()
        && doc.get("format").and_then(Value::as_str) == Some(DataFormat::Csv.as_str())
    {
        // CSV sources have no record element; whatever is there is ignored.
        doc.remove("header");
    }
    serde_json::from_value(document).map_err(|e| SchemaError::Malformed {
        reason: e.to_string(),
    })
}

/// Checks a metadata document against the required/optional tag schema.
///
/// Rules are checked in a fixed order and the first violation is returned.
pub fn validate_document(document: &Value) -> Result<(), SchemaError> {
    let Some(doc) = document.as_object() else {
        return Err(SchemaError::Malformed {
            reason: "document must be a JSON object".to_string(),
        });
    };

    // Required tags
    for tag in ["format", "file", "info"] {
        if !doc.contains_key(tag) {
            return Err(SchemaError::missing(tag));
        }
    }

    // Required tag types
    let format = doc["format"]
        .as_str()
        .ok_or_else(|| SchemaError::wrong_type("format", "a string"))?;
    if !doc["file"].is_string() {
        return Err(SchemaError::wrong_type("file", "a string"));
    }
    let info = doc["info"]
        .as_object()
        .ok_or_else(|| SchemaError::wrong_type("info", "an object"))?;

    let format: DataFormat = format
        .parse()
        .map_err(|reason: String| SchemaError::invalid("format", reason))?;

    // Record element is required for anything that is not CSV
    if format != DataFormat::Csv {
        match doc.get("header") {
            None => return Err(SchemaError::missing("header")),
            Some(header) if !header.is_string() => {
                return Err(SchemaError::wrong_type("header", "a string"));
            }
            Some(_) => {}
        }
    }

    for tag in ["url", "encoding"] {
        if doc.get(tag).is_some_and(|value| !value.is_string()) {
            return Err(SchemaError::wrong_type(tag, "a string"));
        }
    }

    if info.contains_key(ADDRESS_GROUP) && info.contains_key(FULL_ADDR) {
        return Err(SchemaError::invalid(
            "info",
            "cannot have both 'full_addr' and 'address' tags",
        ));
    }

    check_locators(info, "info")?;

    let address = match info.get(ADDRESS_GROUP) {
        Some(value) => {
            let group = value
                .as_object()
                .ok_or_else(|| SchemaError::wrong_type("info.address", "an object"))?;
            if let Some(key) = group.keys().find(|key| !is_address_field(key)) {
                return Err(SchemaError::invalid(
                    "info.address",
                    format!("'{key}' is not a structured address field"),
                ));
            }
            check_locators(group, "info.address")?;
            Some(group)
        }
        None => None,
    };

    if format == DataFormat::Xml {
        check_element_paths(info, "info")?;
        if let Some(group) = address {
            check_element_paths(group, "info.address")?;
        }
    }

    if let Some(value) = doc.get("force") {
        let force = value
            .as_object()
            .ok_or_else(|| SchemaError::wrong_type("force", "an object"))?;
        for (key, literal) in force {
            if !is_force_field(key) {
                return Err(SchemaError::invalid(
                    "force",
                    format!("'{key}' cannot be forced"),
                ));
            }
            if address.is_some_and(|group| group.contains_key(key)) {
                return Err(SchemaError::invalid(
                    "force",
                    format!("'{key}' appears in 'force' and 'address'"),
                ));
            }
            if !literal.is_string() {
                return Err(SchemaError::wrong_type(format!("force.{key}"), "a string"));
            }
        }
    }

    Ok(())
}

/// Every locator must be a string or an array of strings.
fn check_locators(object: &Map<String, Value>, parent: &str) -> Result<(), SchemaError> {
    for (key, value) in object {
        if parent == "info" && key == ADDRESS_GROUP {
            continue;
        }
        let valid = match value {
            Value::String(_) => true,
            Value::Array(items) => items.iter().all(Value::is_string),
            _ => false,
        };
        if !valid {
            return Err(SchemaError::wrong_type(
                format!("{parent}.{key}"),
                "a string or an array of strings",
            ));
        }
    }
    Ok(())
}

/// XML locators must compile as element paths. Keys the label map ignores
/// are not checked.
fn check_element_paths(object: &Map<String, Value>, parent: &str) -> Result<(), SchemaError> {
    for (key, value) in object {
        if parent == "info" && (!is_standard_field(key) || is_address_field(key)) {
            continue;
        }
        let paths: Vec<&str> = match value {
            Value::String(path) => vec![path.as_str()],
            Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        };
        for path in paths {
            ElementPath::parse(&xml_search_path(path)).map_err(|err| {
                SchemaError::invalid(
                    format!("{parent}.{key}"),
                    format!("'{path}' is not a valid element path: {}", err.reason()),
                )
            })?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_csv() -> Value {
        json!({
            "format": "csv",
            "file": "registry.csv",
            "info": {"bus_name": "Name", "full_addr": "Address"}
        })
    }

    fn without(mut doc: Value, tag: &str) -> Value {
        doc.as_object_mut().unwrap().remove(tag);
        doc
    }

    fn with(mut doc: Value, tag: &str, value: Value) -> Value {
        doc.as_object_mut().unwrap().insert(tag.to_string(), value);
        doc
    }

    #[test]
    fn test_accepts_minimal_csv() {
        let metadata = parse_metadata(&valid_csv()).unwrap();
        assert_eq!(metadata.format, DataFormat::Csv);
        assert_eq!(metadata.file, "registry.csv");
    }

    #[test]
    fn test_not_an_object() {
        let err = validate_document(&json!(["format"])).unwrap_err();
        assert!(matches!(err, SchemaError::Malformed { .. }));
    }

    #[test]
    fn test_missing_required_tags() {
        for tag in ["format", "file", "info"] {
            let err = validate_document(&without(valid_csv(), tag)).unwrap_err();
            assert_eq!(err, SchemaError::missing(tag));
        }
    }

    #[test]
    fn test_required_tag_types() {
        let err = validate_document(&with(valid_csv(), "format", json!(1))).unwrap_err();
        assert_eq!(err, SchemaError::wrong_type("format", "a string"));

        let err = validate_document(&with(valid_csv(), "file", json!(["a"]))).unwrap_err();
        assert_eq!(err, SchemaError::wrong_type("file", "a string"));

        let err = validate_document(&with(valid_csv(), "info", json!("Name"))).unwrap_err();
        assert_eq!(err, SchemaError::wrong_type("info", "an object"));
    }

    #[test]
    fn test_unsupported_format() {
        let err = validate_document(&with(valid_csv(), "format", json!("json"))).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidValue { ref tag, .. } if tag == "format"));
    }

    #[test]
    fn test_xml_requires_string_header() {
        let xml = with(valid_csv(), "format", json!("xml"));
        let err = validate_document(&xml).unwrap_err();
        assert_eq!(err, SchemaError::missing("header"));

        let err = validate_document(&with(xml.clone(), "header", json!(3))).unwrap_err();
        assert_eq!(err, SchemaError::wrong_type("header", "a string"));

        assert!(validate_document(&with(xml, "header", json!("business"))).is_ok());
    }

    #[test]
    fn test_csv_ignores_header() {
        let metadata = parse_metadata(&with(valid_csv(), "header", json!(3))).unwrap();
        assert_eq!(metadata.header, None);
    }

    #[test]
    fn test_url_must_be_string() {
        let err = validate_document(&with(valid_csv(), "url", json!(false))).unwrap_err();
        assert_eq!(err, SchemaError::wrong_type("url", "a string"));
        assert!(validate_document(&with(valid_csv(), "url", json!("https://x/y.csv"))).is_ok());
    }

    #[test]
    fn test_full_addr_and_address_conflict() {
        let doc = with(
            valid_csv(),
            "info",
            json!({"full_addr": "Address", "address": {"road": "Street"}}),
        );
        let err = validate_document(&doc).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidValue { ref tag, .. } if tag == "info"));
    }

    #[test]
    fn test_address_group_shape() {
        let doc = with(valid_csv(), "info", json!({"address": "Street"}));
        let err = validate_document(&doc).unwrap_err();
        assert_eq!(err, SchemaError::wrong_type("info.address", "an object"));

        let doc = with(valid_csv(), "info", json!({"address": {"phone": "Tel"}}));
        let err = validate_document(&doc).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidValue { ref tag, .. } if tag == "info.address"));
    }

    #[test]
    fn test_force_rules() {
        let err = validate_document(&with(valid_csv(), "force", json!("canada"))).unwrap_err();
        assert_eq!(err, SchemaError::wrong_type("force", "an object"));

        let err =
            validate_document(&with(valid_csv(), "force", json!({"road": "main"}))).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidValue { ref tag, .. } if tag == "force"));

        let doc = json!({
            "format": "csv",
            "file": "f.csv",
            "info": {"address": {"city": "Town"}},
            "force": {"city": "ottawa"}
        });
        let err = validate_document(&doc).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidValue { ref tag, .. } if tag == "force"));

        let ok = with(valid_csv(), "force", json!({"country": "canada", "prov": "on"}));
        assert!(validate_document(&ok).is_ok());
    }

    #[test]
    fn test_locator_values_must_be_strings() {
        let doc = with(valid_csv(), "info", json!({"bus_name": 7}));
        let err = validate_document(&doc).unwrap_err();
        assert_eq!(
            err,
            SchemaError::wrong_type("info.bus_name", "a string or an array of strings")
        );

        let doc = with(valid_csv(), "info", json!({"full_addr": ["Street", "City"]}));
        assert!(validate_document(&doc).is_ok());
    }

    #[test]
    fn test_xml_locators_must_be_element_paths() {
        let doc = json!({
            "format": "xml",
            "file": "registry.xml",
            "header": "business",
            "info": {
                "bus_name": "name[@lang='en']",
                "address": {"city": ["office/city", "office[2]/city"]}
            }
        });
        assert!(validate_document(&doc).is_ok());

        let mut bad = doc.clone();
        bad["info"]["bus_name"] = json!("name[@lang=en]");
        assert_eq!(
            validate_document(&bad).unwrap_err(),
            SchemaError::invalid(
                "info.bus_name",
                "'name[@lang=en]' is not a valid element path: invalid predicate"
            )
        );

        let mut bad = doc.clone();
        bad["info"]["address"]["city"] = json!(["office/city", "office[0]/city"]);
        let err = validate_document(&bad).unwrap_err();
        assert_eq!(err.tag(), Some("info.address.city"));

        // Unknown keys are ignored by the label map, and CSV locators are
        // column names.
        let mut ignored = doc.clone();
        ignored["info"]["notes"] = json!("[");
        assert!(validate_document(&ignored).is_ok());
        let csv = with(valid_csv(), "info", json!({"bus_name": "Name [legal]"}));
        assert!(validate_document(&csv).is_ok());
    }
}
