//! Certificate fields as submitted by the issuer.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::fingerprint::FIELD_ORDER;

/// The five fields that identify a certificate.
///
/// Wire names match the issuance API (`Certificate_Number`, `name`,
/// `courseName`, `Grant_Date`, `Expiration_Date`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateFields {
    #[serde(rename = "Certificate_Number")]
    pub certificate_number: String,
    pub name: String,
    #[serde(rename = "courseName")]
    pub course_name: String,
    #[serde(rename = "Grant_Date")]
    pub grant_date: String,
    #[serde(rename = "Expiration_Date")]
    pub expiration_date: String,
}

impl CertificateFields {
    /// Build fields from an untyped JSON object.
    ///
    /// Absent and `null` values are missing. Numbers and booleans are coerced
    /// to their string form; arrays and objects are rejected.
    pub fn from_json(value: &Value) -> Result<Self> {
        let Some(object) = value.as_object() else {
            return Err(Error::InvalidInput(
                "certificate fields must be a JSON object".into(),
            ));
        };

        let mut missing = Vec::new();
        let mut values = Vec::with_capacity(FIELD_ORDER.len());
        for name in FIELD_ORDER {
            match object.get(name) {
                None | Some(Value::Null) => missing.push(name),
                Some(Value::String(s)) => values.push(s.clone()),
                Some(Value::Number(n)) => values.push(n.to_string()),
                Some(Value::Bool(b)) => values.push(b.to_string()),
                Some(Value::Array(_) | Value::Object(_)) => {
                    return Err(Error::InvalidInput(format!(
                        "field '{}' must be a string",
                        name
                    )));
                }
            }
        }

        if !missing.is_empty() {
            return Err(Error::InvalidInput(format!(
                "missing required field(s): {}",
                missing.join(", ")
            )));
        }

        let [certificate_number, name, course_name, grant_date, expiration_date]: [String; 5] =
            values
                .try_into()
                .map_err(|_| Error::InvalidInput("unexpected field count".into()))?;

        Ok(Self {
            certificate_number,
            name,
            course_name,
            grant_date,
            expiration_date,
        })
    }

    /// Certificate number as the unsigned integer the ledger stores.
    pub fn numeric_certificate_number(&self) -> Result<u64> {
        parse_certificate_number(&self.certificate_number).ok_or_else(|| {
            Error::InvalidInput(format!(
                "Certificate_Number '{}' must be an unsigned integer",
                self.certificate_number
            ))
        })
    }
}

/// Parse a certificate number for comparison against the ledger.
///
/// Surrounding whitespace is ignored. Anything else that is not an unsigned
/// decimal integer yields `None`.
pub fn parse_certificate_number(s: &str) -> Option<u64> {
    s.trim().parse::<u64>().ok()
}
