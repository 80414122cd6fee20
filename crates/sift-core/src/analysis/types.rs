//! Result types for label analysis.

use crate::llm::ProviderKind;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Dates and identifiers read off a product label.
///
/// Every field is nullable; the all-null default doubles as the sentinel a
/// failed provider contributes to a comparison. Dates are requested as
/// `DD/MM/YYYY` but the format is not enforced. Non-string values (lot
/// numbers are often emitted as bare integers) are kept as their JSON text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default, deserialize_with = "lenient_string", alias = "productionDate")]
    pub production_date: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient_string",
        alias = "expirationDate",
        alias = "expiryDate"
    )]
    pub expiration_date: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient_string",
        alias = "productionId",
        alias = "batchNumber",
        alias = "lot"
    )]
    pub production_id: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", alias = "additionalInfo")]
    pub additional_info: Option<String>,
}

/// `null` → `None`, strings as-is, anything else as its JSON text.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

impl AnalysisResult {
    /// True when no field was extracted.
    pub fn is_empty(&self) -> bool {
        self.production_date.is_none()
            && self.expiration_date.is_none()
            && self.production_id.is_none()
            && self.additional_info.is_none()
    }
}

/// One slot of a multi-provider comparison.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderResult {
    pub provider: ProviderKind,
    pub result: AnalysisResult,
    /// Failure message when the slot was null-filled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
