//! Projection of a device description document onto an index record.

use serde::{Deserialize, Serialize};

use crate::dom::{XmlDocument, XmlElement};
use crate::error::ExtractError;

/// Numeric `deviceData` fields, in index order. Each is read from the
/// `value` attribute and decoded as hexadecimal.
pub const NUMERIC_FIELDS: [&str; 10] = [
    "manufacturerId",
    "productType",
    "productId",
    "basicClass",
    "genericClass",
    "specificClass",
    "appVersion",
    "appSubVersion",
    "protoVersion",
    "protoSubVersion",
];

/// Column names of the standard index layout. Z-Way relies on this order.
pub const STANDARD_FIELDS: [&str; 14] = [
    "manufacturerId",
    "productType",
    "productId",
    "basicClass",
    "genericClass",
    "specificClass",
    "appVersion",
    "appSubVersion",
    "protoVersion",
    "protoSubVersion",
    "brandName",
    "productName",
    "deviceImageURL",
    "filePath",
];

/// Column names of the extended index layout
pub const EXTENDED_FIELDS: [&str; 17] = [
    "manufacturerId",
    "productType",
    "productId",
    "basicClass",
    "genericClass",
    "specificClass",
    "appVersion",
    "appSubVersion",
    "protoVersion",
    "protoSubVersion",
    "brandName",
    "productName",
    "deviceImageURL",
    "productCode",
    "rfFrequency",
    "manualUrl",
    "filePath",
];

/// Which columns an index carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexLayout {
    /// The 14 columns every index consumer understands
    #[default]
    Standard,
    /// Standard columns plus product code, RF frequency and manual URL
    Extended,
}

impl IndexLayout {
    pub fn field_names(&self) -> &'static [&'static str] {
        match self {
            IndexLayout::Standard => &STANDARD_FIELDS,
            IndexLayout::Extended => &EXTENDED_FIELDS,
        }
    }
}

/// Flat projection of one device description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRecord {
    pub manufacturer_id: u32,
    pub product_type: u32,
    pub product_id: u32,
    pub basic_class: u32,
    pub generic_class: u32,
    pub specific_class: u32,
    pub app_version: u32,
    pub app_sub_version: u32,
    pub proto_version: u32,
    pub proto_sub_version: u32,
    pub brand_name: String,
    pub product_name: String,
    pub device_image_url: String,
    pub product_code: String,
    pub rf_frequency: String,
    pub manual_url: String,
    pub file_path: String,
}

impl IndexRecord {
    /// The record's values rendered as text, in the column order of `layout`.
    /// Numbers are plain decimal.
    pub fn values(&self, layout: IndexLayout) -> Vec<String> {
        let mut values: Vec<String> = [
            self.manufacturer_id,
            self.product_type,
            self.product_id,
            self.basic_class,
            self.generic_class,
            self.specific_class,
            self.app_version,
            self.app_sub_version,
            self.proto_version,
            self.proto_sub_version,
        ]
        .iter()
        .map(|n| n.to_string())
        .collect();

        values.push(self.brand_name.clone());
        values.push(self.product_name.clone());
        values.push(self.device_image_url.clone());
        if layout == IndexLayout::Extended {
            values.push(self.product_code.clone());
            values.push(self.rf_frequency.clone());
            values.push(self.manual_url.clone());
        }
        values.push(self.file_path.clone());
        values
    }

    /// Column name / value pairs for `layout`
    pub fn fields(&self, layout: IndexLayout) -> Vec<(&'static str, String)> {
        layout
            .field_names()
            .iter()
            .copied()
            .zip(self.values(layout))
            .collect()
    }
}

/// Build the index record of `doc`, naming it `file_name`.
///
/// Descriptive strings default to empty when absent; a missing `deviceData`
/// section or any missing or non-hexadecimal numeric field fails the whole
/// document.
pub fn extract(doc: &XmlDocument, file_name: &str) -> Result<IndexRecord, ExtractError> {
    let root = &doc.root;
    let description = root.child("deviceDescription");
    let links = root.child("resourceLinks");

    let device_data = root.child("deviceData").ok_or(ExtractError::MissingSection {
        section: "deviceData",
    })?;

    let mut numbers = [0u32; 10];
    for (slot, field) in numbers.iter_mut().zip(NUMERIC_FIELDS) {
        *slot = hex_field(device_data, field)?;
    }
    let [
        manufacturer_id,
        product_type,
        product_id,
        basic_class,
        generic_class,
        specific_class,
        app_version,
        app_sub_version,
        proto_version,
        proto_sub_version,
    ] = numbers;

    Ok(IndexRecord {
        manufacturer_id,
        product_type,
        product_id,
        basic_class,
        generic_class,
        specific_class,
        app_version,
        app_sub_version,
        proto_version,
        proto_sub_version,
        brand_name: text_of(description, "brandName"),
        product_name: text_of(description, "productName"),
        device_image_url: url_of(links, "deviceImage"),
        product_code: text_of(description, "productCode"),
        rf_frequency: text_of(Some(device_data), "rfFrequency"),
        manual_url: url_of(links, "manualUrl"),
        file_path: file_name.to_string(),
    })
}

fn text_of(parent: Option<&XmlElement>, name: &str) -> String {
    parent
        .and_then(|p| p.child(name))
        .and_then(|e| e.first_text())
        .unwrap_or_default()
        .to_string()
}

fn url_of(links: Option<&XmlElement>, name: &str) -> String {
    links
        .and_then(|l| l.child(name))
        .and_then(|e| e.attribute("url"))
        .unwrap_or_default()
        .to_string()
}

fn hex_field(device_data: &XmlElement, field: &'static str) -> Result<u32, ExtractError> {
    let value = device_data
        .child(field)
        .ok_or(ExtractError::MissingField { field })?
        .attribute("value")
        .ok_or(ExtractError::MissingValue { field })?;

    parse_hex(value).ok_or_else(|| ExtractError::InvalidHex {
        field,
        value: value.to_string(),
    })
}

/// Decode hexadecimal text such as `0086`, `0x86` or ` 86 `.
pub fn parse_hex(text: &str) -> Option<u32> {
    let trimmed = text.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}
