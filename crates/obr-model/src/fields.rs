//! The standard business-registry field vocabulary.
//!
//! Every dataset is normalized into these columns. The order of
//! [`STANDARD_FIELDS`] is the order columns appear in the output.

/// Placeholder field for a free-form address that is decomposed into the
/// structured address columns.
pub const FULL_ADDR: &str = "full_addr";

/// Key of the nested object in `info` that maps structured address fields
/// individually.
pub const ADDRESS_GROUP: &str = "address";

/// Standardized field names, in output order.
pub const STANDARD_FIELDS: [&str; 54] = [
    "bus_name",
    "trade_name",
    "bus_type",
    "bus_no",
    "bus_desc",
    "lic_type",
    "lic_no",
    "bus_start_date",
    "bus_cease_date",
    "active",
    FULL_ADDR,
    "house_number",
    "road",
    "postcode",
    "unit",
    "city",
    "prov",
    "country",
    "phone",
    "fax",
    "email",
    "website",
    "tollfree",
    "comdist",
    "region",
    "longitude",
    "latitude",
    "no_employed",
    "no_seasonal_emp",
    "no_full_emp",
    "no_part_emp",
    "emp_range",
    "home_bus",
    "munic_bus",
    "nonres_bus",
    "exports",
    "exp_cn_1",
    "exp_cn_2",
    "exp_cn_3",
    "naics_2",
    "naics_3",
    "naics_4",
    "naics_5",
    "naics_6",
    "naics_desc",
    "qc_cae_1",
    "qc_cae_desc_1",
    "qc_cae_2",
    "qc_cae_desc_2",
    "facebook",
    "twitter",
    "linkedin",
    "youtube",
    "instagram",
];

/// Structured address fields, in Canada Post mailing-address order.
pub const ADDRESS_FIELDS: [&str; 7] = [
    "unit",
    "house_number",
    "road",
    "city",
    "prov",
    "country",
    "postcode",
];

/// Fields that may be given a literal value through the `force` object.
pub const FORCE_FIELDS: [&str; 3] = ["city", "prov", "country"];

/// Returns the canonical `&'static str` for a standard field name.
pub fn standard_field(name: &str) -> Option<&'static str> {
    STANDARD_FIELDS.iter().copied().find(|field| *field == name)
}

/// Returns true if `name` belongs to the standard vocabulary.
pub fn is_standard_field(name: &str) -> bool {
    standard_field(name).is_some()
}

/// Returns true if `name` is one of the structured address fields.
pub fn is_address_field(name: &str) -> bool {
    ADDRESS_FIELDS.contains(&name)
}

/// Returns true if `name` may appear in the `force` object.
pub fn is_force_field(name: &str) -> bool {
    FORCE_FIELDS.contains(&name)
}

/// Position of a structured address field within [`ADDRESS_FIELDS`].
pub fn address_index(name: &str) -> Option<usize> {
    ADDRESS_FIELDS.iter().position(|field| *field == name)
}

/// Standard columns written by the blank-fill pass: the whole vocabulary
/// except the `full_addr` placeholder, in vocabulary order.
pub fn blank_fill_columns() -> impl Iterator<Item = &'static str> {
    STANDARD_FIELDS
        .iter()
        .copied()
        .filter(|field| *field != FULL_ADDR)
}
