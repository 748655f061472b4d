//! Pass metadata and its canonical `pass.json` encoding.
//!
//! [`PassConfig`] holds the five fields that identify a pass and its issuer.
//! [`PassDocument`] wraps a config with the optional presentation data a
//! wallet renders (logo text, colors, barcodes, field layout) and produces
//! the `pass.json` bytes that go into the bundle.
//!
//! # Canonical JSON
//!
//! [`PassDocument::to_json`] emits compact JSON with object keys sorted at
//! every level, so the same document always hashes to the same digest.
//!
//! # Examples
//!
//! ```
//! use pkpass::{Barcode, BarcodeFormat, PassConfig, PassDocument};
//!
//! let config = PassConfig::new(
//!     "Example Org",
//!     "Membership card",
//!     "pass.org.example.member",
//!     "AB12CD34EF",
//!     "SN-0001",
//! );
//! let pass = PassDocument::new(config)
//!     .logo_text("Example")
//!     .background_color("rgb(20, 40, 80)")
//!     .barcode(Barcode::new(BarcodeFormat::Qr, "SN-0001"));
//!
//! let json = pass.to_json()?;
//! assert!(json.starts_with(b"{\"backgroundColor\""));
//! # Ok::<(), pkpass::Error>(())
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Only format version wallets accept.
pub const FORMAT_VERSION: u32 = 1;

/// Default barcode message encoding.
const DEFAULT_MESSAGE_ENCODING: &str = "iso-8859-1";

/// Top-level keys backed by a typed [`PassDocument`] field. Additional keys
/// may not reuse these names.
const MODELED_KEYS: &[&str] = &[
    "formatVersion",
    "organizationName",
    "description",
    "passTypeIdentifier",
    "teamIdentifier",
    "serialNumber",
    "logoText",
    "foregroundColor",
    "backgroundColor",
    "labelColor",
    "barcodes",
    "generic",
    "boardingPass",
    "coupon",
    "eventTicket",
    "storeCard",
];

/// Required pass identity and issuer fields.
///
/// Fields are fixed at construction. `serial_number` together with
/// `pass_type_identifier` and `team_identifier` identifies the pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassConfig {
    organization_name: String,
    description: String,
    pass_type_identifier: String,
    team_identifier: String,
    serial_number: String,
}

impl PassConfig {
    /// Create a config from its five required fields.
    ///
    /// Values are not checked here; [`PassConfig::validate`] (called by
    /// [`PassDocument::to_json`]) rejects empty ones.
    pub fn new(
        organization_name: impl Into<String>,
        description: impl Into<String>,
        pass_type_identifier: impl Into<String>,
        team_identifier: impl Into<String>,
        serial_number: impl Into<String>,
    ) -> Self {
        Self {
            organization_name: organization_name.into(),
            description: description.into(),
            pass_type_identifier: pass_type_identifier.into(),
            team_identifier: team_identifier.into(),
            serial_number: serial_number.into(),
        }
    }

    pub fn organization_name(&self) -> &str {
        &self.organization_name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn pass_type_identifier(&self) -> &str {
        &self.pass_type_identifier
    }

    pub fn team_identifier(&self) -> &str {
        &self.team_identifier
    }

    pub fn serial_number(&self) -> &str {
        &self.serial_number
    }

    /// Logical identity of the pass: `team/pass type/serial`.
    pub fn identity(&self) -> String {
        format!(
            "{}/{}/{}",
            self.team_identifier, self.pass_type_identifier, self.serial_number
        )
    }

    /// Check that every required field holds a non-blank value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first empty field.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("organizationName", &self.organization_name),
            ("description", &self.description),
            ("passTypeIdentifier", &self.pass_type_identifier),
            ("teamIdentifier", &self.team_identifier),
            ("serialNumber", &self.serial_number),
        ];

        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("{name} must not be empty")));
            }
        }

        Ok(())
    }
}

/// Barcode symbology supported by wallets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BarcodeFormat {
    #[serde(rename = "PKBarcodeFormatQR")]
    Qr,
    #[serde(rename = "PKBarcodeFormatPDF417")]
    Pdf417,
    #[serde(rename = "PKBarcodeFormatAztec")]
    Aztec,
    #[serde(rename = "PKBarcodeFormatCode128")]
    Code128,
}

/// A barcode rendered on the pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Barcode {
    pub format: BarcodeFormat,
    pub message: String,
    #[serde(default = "default_message_encoding")]
    pub message_encoding: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
}

fn default_message_encoding() -> String {
    DEFAULT_MESSAGE_ENCODING.to_string()
}

fn default_format_version() -> u32 {
    FORMAT_VERSION
}

impl Barcode {
    /// Barcode with the default `iso-8859-1` message encoding.
    pub fn new(format: BarcodeFormat, message: impl Into<String>) -> Self {
        Self {
            format,
            message: message.into(),
            message_encoding: default_message_encoding(),
            alt_text: None,
        }
    }

    /// Set the human-readable text shown under the barcode.
    pub fn alt_text(mut self, text: impl Into<String>) -> Self {
        self.alt_text = Some(text.into());
        self
    }
}

/// One key/label/value entry in a pass field area.
///
/// `value` may be a string, number or date string. Formatting keys such as
/// `dateStyle` or `currencyCode` are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassField {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub value: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PassField {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            label: None,
            value: value.into(),
            extra: Map::new(),
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Field areas of a pass style dictionary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassFields {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub header_fields: Vec<PassField>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub primary_fields: Vec<PassField>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secondary_fields: Vec<PassField>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub auxiliary_fields: Vec<PassField>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub back_fields: Vec<PassField>,
    /// Only meaningful for boarding passes, e.g. `PKTransitTypeAir`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transit_type: Option<String>,
}

/// Visual style of the pass; selects which top-level key holds the fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassStyle {
    Generic,
    BoardingPass,
    Coupon,
    EventTicket,
    StoreCard,
}

/// Complete `pass.json` content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassDocument {
    #[serde(default = "default_format_version")]
    format_version: u32,
    #[serde(flatten)]
    config: PassConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    logo_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    foreground_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label_color: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    barcodes: Vec<Barcode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    generic: Option<PassFields>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    boarding_pass: Option<PassFields>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    coupon: Option<PassFields>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    event_ticket: Option<PassFields>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    store_card: Option<PassFields>,
    /// Keys without a typed field (`relevantDate`, `locations`, `nfc`, ...),
    /// carried through unchanged. Must stay the last flattened field.
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<PassConfig> for PassDocument {
    fn from(config: PassConfig) -> Self {
        Self::new(config)
    }
}

impl PassDocument {
    /// Create a document with no optional presentation data.
    pub fn new(config: PassConfig) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            config,
            logo_text: None,
            foreground_color: None,
            background_color: None,
            label_color: None,
            barcodes: Vec::new(),
            generic: None,
            boarding_pass: None,
            coupon: None,
            event_ticket: None,
            store_card: None,
            extra: Map::new(),
        }
    }

    /// Parse a document from `pass.json`-style JSON (camelCase keys).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the text is not a valid pass document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn config(&self) -> &PassConfig {
        &self.config
    }

    pub fn logo_text(mut self, text: impl Into<String>) -> Self {
        self.logo_text = Some(text.into());
        self
    }

    /// Foreground color as `rgb(r, g, b)`.
    pub fn foreground_color(mut self, color: impl Into<String>) -> Self {
        self.foreground_color = Some(color.into());
        self
    }

    /// Background color as `rgb(r, g, b)`.
    pub fn background_color(mut self, color: impl Into<String>) -> Self {
        self.background_color = Some(color.into());
        self
    }

    /// Label color as `rgb(r, g, b)`.
    pub fn label_color(mut self, color: impl Into<String>) -> Self {
        self.label_color = Some(color.into());
        self
    }

    /// Set a top-level key that has no typed setter, e.g. `relevantDate`.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Keys carried without a typed field, in key order.
    pub fn extra_fields(&self) -> &Map<String, Value> {
        &self.extra
    }

    pub fn barcode(mut self, barcode: Barcode) -> Self {
        self.barcodes.push(barcode);
        self
    }

    /// Set the pass style and its fields, replacing any previous style.
    pub fn style(mut self, style: PassStyle, fields: PassFields) -> Self {
        self.generic = None;
        self.boarding_pass = None;
        self.coupon = None;
        self.event_ticket = None;
        self.store_card = None;
        *self.style_slot(style) = Some(fields);
        self
    }

    fn style_slot(&mut self, style: PassStyle) -> &mut Option<PassFields> {
        match style {
            PassStyle::Generic => &mut self.generic,
            PassStyle::BoardingPass => &mut self.boarding_pass,
            PassStyle::Coupon => &mut self.coupon,
            PassStyle::EventTicket => &mut self.event_ticket,
            PassStyle::StoreCard => &mut self.store_card,
        }
    }

    fn styles_set(&self) -> usize {
        [
            &self.generic,
            &self.boarding_pass,
            &self.coupon,
            &self.event_ticket,
            &self.store_card,
        ]
        .iter()
        .filter(|s| s.is_some())
        .count()
    }

    /// Validate required fields, colors, barcodes and style.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        self.config.validate()?;

        if self.format_version != FORMAT_VERSION {
            return Err(Error::Config(format!(
                "formatVersion must be {FORMAT_VERSION}, got {}",
                self.format_version
            )));
        }

        let colors = [
            ("foregroundColor", &self.foreground_color),
            ("backgroundColor", &self.background_color),
            ("labelColor", &self.label_color),
        ];
        for (name, color) in colors {
            if let Some(color) = color {
                if parse_rgb(color).is_none() {
                    return Err(Error::Config(format!(
                        "{name} must look like rgb(r, g, b), got {color:?}"
                    )));
                }
            }
        }

        for barcode in &self.barcodes {
            if barcode.message.is_empty() {
                return Err(Error::Config("barcode message must not be empty".into()));
            }
        }

        if self.styles_set() > 1 {
            return Err(Error::Config("only one pass style may be set".into()));
        }

        if let Some(key) = self.extra.keys().find(|k| MODELED_KEYS.contains(&k.as_str())) {
            return Err(Error::Config(format!(
                "{key} must be set through its typed field"
            )));
        }

        Ok(())
    }

    /// Produce canonical `pass.json` bytes.
    ///
    /// A document without an explicit style is emitted as a `generic` pass.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if validation fails, or [`Error::Json`] if
    /// serialization fails.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        self.validate()?;

        let value = if self.styles_set() == 0 {
            let mut doc = self.clone();
            doc.generic = Some(PassFields::default());
            serde_json::to_value(&doc)?
        } else {
            serde_json::to_value(self)?
        };

        // serde_json::Map is ordered by key, so re-serializing the Value
        // sorts keys at every nesting level.
        Ok(serde_json::to_vec(&value)?)
    }
}

/// Parse `rgb(r, g, b)` with 8-bit components.
fn parse_rgb(color: &str) -> Option<(u8, u8, u8)> {
    let inner = color.trim().strip_prefix("rgb(")?.strip_suffix(')')?;
    let mut parts = inner.split(',').map(|p| p.trim().parse::<u8>());

    let r = parts.next()?.ok()?;
    let g = parts.next()?.ok()?;
    let b = parts.next()?.ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_config() -> PassConfig {
        PassConfig::new(
            "Apple inc.",
            "Example pass",
            "com.example.pass",
            "AA00AA0A0A",
            "ABCDEFG1234567890",
        )
    }

    #[test]
    fn test_to_json_sorted_keys() {
        let json = PassDocument::new(example_config()).to_json().unwrap();
        let expected = concat!(
            r#"{"description":"Example pass","formatVersion":1,"generic":{},"#,
            r#""organizationName":"Apple inc.","passTypeIdentifier":"com.example.pass","#,
            r#""serialNumber":"ABCDEFG1234567890","teamIdentifier":"AA00AA0A0A"}"#,
        );

        assert_eq!(String::from_utf8(json).unwrap(), expected);
    }

    #[test]
    fn test_to_json_is_reproducible() {
        let pass = PassDocument::new(example_config())
            .logo_text("Test pass")
            .barcode(Barcode::new(BarcodeFormat::Qr, "hello").alt_text("hello"));

        assert_eq!(pass.to_json().unwrap(), pass.clone().to_json().unwrap());
    }

    #[test]
    fn test_nested_keys_sorted() {
        let pass = PassDocument::new(example_config())
            .barcode(Barcode::new(BarcodeFormat::Pdf417, "123").alt_text("alt"));
        let json = String::from_utf8(pass.to_json().unwrap()).unwrap();

        let expected = concat!(
            r#"{"altText":"alt","format":"PKBarcodeFormatPDF417","#,
            r#""message":"123","messageEncoding":"iso-8859-1"}"#,
        );
        assert!(json.contains(expected));
    }

    #[test]
    fn test_empty_serial_number_rejected() {
        let config = PassConfig::new("Org", "Desc", "pass.id", "TEAM", "");
        let result = PassDocument::new(config).to_json();

        match result {
            Err(Error::Config(msg)) => assert!(msg.contains("serialNumber")),
            other => panic!("expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn test_whitespace_field_rejected() {
        let config = PassConfig::new("   ", "Desc", "pass.id", "TEAM", "SN");
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_identity() {
        assert_eq!(
            example_config().identity(),
            "AA00AA0A0A/com.example.pass/ABCDEFG1234567890"
        );
    }

    #[test]
    fn test_invalid_color_rejected() {
        let pass = PassDocument::new(example_config()).foreground_color("#ffffff");
        assert!(matches!(pass.to_json(), Err(Error::Config(_))));

        let pass = PassDocument::new(example_config()).label_color("rgb(0, 0, 256)");
        assert!(matches!(pass.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_parse_rgb() {
        assert_eq!(parse_rgb("rgb(1, 2, 3)"), Some((1, 2, 3)));
        assert_eq!(parse_rgb("rgb(255,255,255)"), Some((255, 255, 255)));
        assert_eq!(parse_rgb("rgb(1, 2)"), None);
        assert_eq!(parse_rgb("rgb(1, 2, 3, 4)"), None);
        assert_eq!(parse_rgb("1, 2, 3"), None);
    }

    #[test]
    fn test_empty_barcode_message_rejected() {
        let pass = PassDocument::new(example_config())
            .barcode(Barcode::new(BarcodeFormat::Aztec, ""));
        assert!(matches!(pass.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_style_replaces_previous() {
        let fields = PassFields {
            primary_fields: vec![PassField::new("balance", "10").label("Balance")],
            ..Default::default()
        };
        let pass = PassDocument::new(example_config())
            .style(PassStyle::Coupon, PassFields::default())
            .style(PassStyle::StoreCard, fields);

        let json = String::from_utf8(pass.to_json().unwrap()).unwrap();
        let expected = concat!(
            r#""storeCard":{"primaryFields":"#,
            r#"[{"key":"balance","label":"Balance","value":"10"}]}"#,
        );
        assert!(json.contains(expected));
        assert!(!json.contains("coupon"));
        assert!(!json.contains("generic"));
    }

    #[test]
    fn test_from_json_round_trips_through_canonical_form() {
        let text = r#"{
            "teamIdentifier": "XXXXXXXX",
            "serialNumber": "SN-0002",
            "passTypeIdentifier": "pass.org.example",
            "organizationName": "hackucf.org",
            "description": "Demo Pass",
            "logoText": "Demo"
        }"#;

        let pass = PassDocument::from_json(text).unwrap();
        assert_eq!(pass.config().serial_number(), "SN-0002");
        assert_eq!(pass.config().team_identifier(), "XXXXXXXX");

        let json = pass.to_json().unwrap();
        let reparsed = PassDocument::from_json(std::str::from_utf8(&json).unwrap()).unwrap();
        assert_eq!(reparsed.to_json().unwrap(), json);
    }

    #[test]
    fn test_from_json_missing_field() {
        let result = PassDocument::from_json(r#"{"description": "x"}"#);
        assert!(matches!(result, Err(Error::Json(_))));
    }

    #[test]
    fn test_unmodeled_keys_carried_through() {
        let text = r#"{
            "organizationName": "o",
            "description": "d",
            "passTypeIdentifier": "p",
            "teamIdentifier": "t",
            "serialNumber": "s",
            "relevantDate": "2026-11-01T10:00:00Z",
            "locations": [{"latitude": 37.33, "longitude": -122.03}],
            "barcode": {"format": "PKBarcodeFormatQR", "message": "m", "messageEncoding": "utf-8"},
            "voided": false,
            "userInfo": {"tier": 2},
            "storeCard": {
                "primaryFields": [{"key": "balance", "value": 21.75, "currencyCode": "USD"}]
            }
        }"#;

        let pass = PassDocument::from_json(text).unwrap();
        assert_eq!(pass.extra_fields().len(), 5);

        let json: Value = serde_json::from_slice(&pass.to_json().unwrap()).unwrap();
        assert_eq!(json["relevantDate"], "2026-11-01T10:00:00Z");
        assert_eq!(json["locations"][0]["latitude"], 37.33);
        assert_eq!(json["barcode"]["message"], "m");
        assert_eq!(json["voided"], false);
        assert_eq!(json["userInfo"]["tier"], 2);

        let balance = &json["storeCard"]["primaryFields"][0];
        assert_eq!(balance["value"], 21.75);
        assert_eq!(balance["currencyCode"], "USD");
        assert!(json.get("generic").is_none());
    }

    #[test]
    fn test_field_setter_and_typed_key_clash() {
        let pass = PassDocument::new(example_config())
            .field("groupingIdentifier", "g1")
            .field("voided", true);
        let json = String::from_utf8(pass.to_json().unwrap()).unwrap();
        assert!(json.contains(r#""groupingIdentifier":"g1""#));
        assert!(json.contains(r#""voided":true"#));

        let clash = PassDocument::new(example_config()).field("serialNumber", "other");
        match clash.validate() {
            Err(Error::Config(msg)) => assert!(msg.contains("serialNumber")),
            other => panic!("expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn test_wrong_format_version_rejected() {
        let text = r#"{"formatVersion": 2, "organizationName": "o", "description": "d",
            "passTypeIdentifier": "p", "teamIdentifier": "t", "serialNumber": "s"}"#;
        let pass = PassDocument::from_json(text).unwrap();
        assert!(matches!(pass.to_json(), Err(Error::Config(_))));
    }
}
