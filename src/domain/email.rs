use std::fmt;

use serde::{Deserialize, Serialize};

/// Separator between the fields of a `PARSED_EMAIL:` record.
pub const FIELD_SEPARATOR: &str = "_||_";
/// What a separator found inside a value is rewritten to.
const SEPARATOR_REPLACEMENT: &str = "_|_";

pub const DEFAULT_KW_SERIAL: &str = "Serial Number:";
pub const DEFAULT_KW_TIME: &str = "Time to reimage:";
pub const DEFAULT_KW_FAILED: &str = "items failed to install:";

/// Line anchors used to pull values out of a message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Keywords {
    pub serial: String,
    pub time: String,
    pub failed: String,
}

impl Default for Keywords {
    fn default() -> Self {
        Self {
            serial: DEFAULT_KW_SERIAL.to_string(),
            time: DEFAULT_KW_TIME.to_string(),
            failed: DEFAULT_KW_FAILED.to_string(),
        }
    }
}

/// Fields extracted from one message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyFields {
    pub serial_number: String,
    pub reimage_time: String,
    pub failed_installs: String,
}

impl Default for BodyFields {
    fn default() -> Self {
        Self {
            serial_number: "N/A".to_string(),
            reimage_time: "N/A".to_string(),
            failed_installs: "0".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEmail {
    pub computer_name: String,
    pub fields: BodyFields,
}

impl ParsedEmail {
    pub fn new(computer_name: impl Into<String>, fields: BodyFields) -> Self {
        Self {
            computer_name: computer_name.into(),
            fields,
        }
    }
}

fn escape_field(value: &str) -> String {
    let mut out = value.to_string();
    // a single pass can leave a new separator behind ("_||_||_")
    while out.contains(FIELD_SEPARATOR) {
        out = out.replace(FIELD_SEPARATOR, SEPARATOR_REPLACEMENT);
    }
    out
}

/// Renders the record line read by the calling process.
impl fmt::Display for ParsedEmail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PARSED_EMAIL:{}",
            [
                escape_field(&self.computer_name),
                escape_field(&self.fields.serial_number),
                escape_field(&self.fields.reimage_time),
                escape_field(&self.fields.failed_installs),
            ]
            .join(FIELD_SEPARATOR)
        )
    }
}
