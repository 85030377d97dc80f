//! Built-in address parser for Canadian mailing addresses.
//!
//! Works on scrubbed input (lowercase, single spaces). The address is split
//! on commas: the first part is the street line, the last remaining part the
//! city. Postal code, country and province are peeled off the end first.

use std::sync::LazyLock;

use regex::Regex;

use super::{AddressParseError, AddressParser, AddressToken};

static CA_POSTCODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[a-z]\d[a-z] ?\d[a-z]\d\b").expect("Invalid postal code regex")
});

static US_ZIP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[ ,])(\d{5}(?:-\d{4})?)(?:,|$)").expect("Invalid ZIP code regex")
});

static UNIT_ONLY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:unit|suite|ste|apt|apartment|#) ?#? ?([a-z0-9-]+)$")
        .expect("Invalid unit regex")
});

static UNIT_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:unit|suite|ste|apt|apartment|#) ?#? ?([a-z0-9-]+) (.+)$")
        .expect("Invalid unit regex")
});

static UNIT_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+?) (?:unit|suite|ste|apt|apartment|#) ?#? ?([a-z0-9-]+)$")
        .expect("Invalid unit regex")
});

static UNIT_DASH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-z0-9]+) ?- ?(\d+[a-z]?) (.+)$").expect("Invalid unit regex")
});

static STREET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+[a-z]?(?: 1/2)?) (.+)$").expect("Invalid street regex")
});

/// Country names recognised at the end of an address, longest first.
const COUNTRIES: &[&str] = &[
    "united states of america",
    "united states",
    "canada",
    "usa",
];

/// Province and territory names and abbreviations, longest first.
const PROVINCES: &[&str] = &[
    "newfoundland and labrador",
    "northwest territories",
    "prince edward island",
    "british columbia",
    "new brunswick",
    "saskatchewan",
    "newfoundland",
    "nova scotia",
    "manitoba",
    "ontario",
    "nunavut",
    "alberta",
    "québec",
    "quebec",
    "yukon",
    "b.c.",
    "ab",
    "bc",
    "mb",
    "nb",
    "nl",
    "ns",
    "nt",
    "nu",
    "on",
    "pe",
    "pq",
    "qc",
    "sk",
    "yt",
];

/// Regex-based parser that needs no external library.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicAddressParser;

impl HeuristicAddressParser {
    pub fn new() -> Self {
        Self
    }

    /// Splits `address` into labelled tokens.
    pub fn tokenize(&self, address: &str) -> Vec<AddressToken> {
        let mut text = address.trim().to_string();
        let postcode = take_postcode(&mut text);

        let mut parts: Vec<String> = text
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(String::from)
            .collect();

        let country = take_trailing(&mut parts, COUNTRIES);
        let province = take_trailing(&mut parts, PROVINCES);

        let mut unit = None;
        if let Some(index) = parts.iter().position(|part| UNIT_ONLY.is_match(part)) {
            let part = parts.remove(index);
            unit = UNIT_ONLY
                .captures(&part)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string());
        }

        let mut house_number = None;
        let mut road = None;
        if !parts.is_empty() {
            let mut street = parts.remove(0);
            if let Some((found, rest)) = split_unit(&street) {
                unit = unit.or(Some(found));
                street = rest;
            }
            if let Some(caps) = UNIT_DASH.captures(&street) {
                unit = unit.or_else(|| Some(caps[1].to_string()));
                house_number = Some(caps[2].to_string());
                road = Some(caps[3].to_string());
            } else if let Some(caps) = STREET.captures(&street) {
                house_number = Some(caps[1].to_string());
                road = Some(caps[2].to_string());
            } else {
                road = Some(street);
            }
        }
        let city = parts.pop();

        [
            (unit, "unit"),
            (house_number, "house_number"),
            (road, "road"),
            (city, "city"),
            (province, "state"),
            (postcode, "postcode"),
            (country, "country"),
        ]
        .into_iter()
        .filter_map(|(text, label)| text.map(|text| AddressToken::new(text, label)))
        .collect()
    }
}

impl AddressParser for HeuristicAddressParser {
    fn parse(&self, address: &str) -> Result<Vec<AddressToken>, AddressParseError> {
        Ok(self.tokenize(address))
    }
}

/// Removes and returns a postal or ZIP code from `text`.
fn take_postcode(text: &mut String) -> Option<String> {
    let (range, code) = match CA_POSTCODE.find(text) {
        Some(m) => (m.range(), m.as_str().to_string()),
        None => {
            let m = US_ZIP.captures(text)?.get(1)?;
            (m.range(), m.as_str().to_string())
        }
    };
    text.replace_range(range, "");
    Some(code)
}

/// Removes one of `names` from the end of the last part.
///
/// A part that is exactly the name is dropped; otherwise the name must be
/// the part's trailing word(s).
fn take_trailing(parts: &mut Vec<String>, names: &[&str]) -> Option<String> {
    let last = parts.last_mut()?;
    for name in names {
        if last.as_str() == *name {
            parts.pop();
            return Some((*name).to_string());
        }
        if let Some(rest) = last.strip_suffix(name)
            && let Some(rest) = rest.strip_suffix(' ')
        {
            *last = rest.trim_end().to_string();
            return Some((*name).to_string());
        }
    }
    None
}

/// Splits a unit designator off the front or back of a street line.
fn split_unit(street: &str) -> Option<(String, String)> {
    if let Some(caps) = UNIT_PREFIX.captures(street) {
        return Some((caps[1].to_string(), caps[2].to_string()));
    }
    UNIT_SUFFIX
        .captures(street)
        .map(|caps| (caps[2].to_string(), caps[1].to_string()))
}
