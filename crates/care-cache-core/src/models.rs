//! Canonical record types.
//!
//! Each [`RecordKind`] has one strict struct. These are the only shapes that
//! leave the normalizer; raw model JSON never travels past it. All records
//! serialize with camelCase field names and snake_case enum tokens, and all
//! carry a `locale` tag ([`BASE_LOCALE`] for canonical records).
//!
//! Canonical records are immutable once cached. A changed schema means a new
//! cache version, never an in-place update.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::vocab::{
    BleachRule, ColorGroup, DryingMethod, Fabric, GarmentType, IronSetting, Program, StainKind,
    WashCycle,
};

/// Language of canonical records.
pub const BASE_LOCALE: &str = "en";

/// Wash temperature used when the model gives none (°C).
pub const DEFAULT_TEMP: u32 = 30;

/// Spin speed used when the model gives none (rpm).
pub const DEFAULT_SPIN: u32 = 800;

/// The kind of answer requested from the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Garment profile from a photo of a garment or its care label.
    Garment,
    /// Fabric care profile for a textile.
    Fabric,
    /// Laundry advice, usually from a text question.
    Laundry,
    /// Stain-removal tip.
    Stain,
    /// Multi-garment load analysis.
    Batch,
}

impl RecordKind {
    pub const ALL: [RecordKind; 5] = [
        RecordKind::Garment,
        RecordKind::Fabric,
        RecordKind::Laundry,
        RecordKind::Stain,
        RecordKind::Batch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Garment => "garment",
            RecordKind::Fabric => "fabric",
            RecordKind::Laundry => "laundry",
            RecordKind::Stain => "stain",
            RecordKind::Batch => "batch",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "unknown record kind '{}'. Must be garment, fabric, laundry, stain, or batch.",
                    s
                )
            })
    }
}

/// Machine settings recommended for an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    /// Wash temperature in °C.
    pub temp: u32,
    /// Spin speed in rpm.
    pub spin: u32,
    pub program: Program,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GarmentProfile {
    pub garment_type: GarmentType,
    pub fabric: Fabric,
    pub color: String,
    pub wash_cycle: WashCycle,
    pub recommended: Recommendation,
    pub care_instructions: Vec<String>,
    pub warnings: Vec<String>,
    pub stains: Vec<StainKind>,
    pub locale: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FabricCareProfile {
    pub fabric: Fabric,
    pub wash_cycle: WashCycle,
    pub drying: DryingMethod,
    pub ironing: IronSetting,
    pub bleach: BleachRule,
    pub recommended: Recommendation,
    pub description: String,
    pub care_instructions: Vec<String>,
    pub warnings: Vec<String>,
    pub locale: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaundryAdvice {
    pub wash_cycle: WashCycle,
    pub recommended: Recommendation,
    pub answer: String,
    pub tips: Vec<String>,
    pub warnings: Vec<String>,
    pub locale: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StainTip {
    pub stain: StainKind,
    pub fabric: Fabric,
    pub recommended: Recommendation,
    pub steps: Vec<String>,
    pub products: Vec<String>,
    pub warnings: Vec<String>,
    pub locale: String,
}

/// One garment recognised in a load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
    pub label: String,
    pub garment_type: GarmentType,
    pub fabric: Fabric,
    pub color_group: ColorGroup,
    pub wash_cycle: WashCycle,
    pub recommended: Recommendation,
    pub stains: Vec<StainKind>,
}

/// Items that can share a wash, by colour group and wash cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchGroup {
    pub label: String,
    pub color_group: ColorGroup,
    pub wash_cycle: WashCycle,
    pub recommended: Recommendation,
    /// Indices into [`BatchResult::items`].
    pub items: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub items: Vec<BatchItem>,
    pub groups: Vec<BatchGroup>,
    pub suggestions: Vec<String>,
    pub locale: String,
}

/// A normalized record of any kind.
///
/// Serializes as the inner struct; the kind is implied by the cache
/// namespace the record lives in, so decoding goes through
/// [`CanonicalRecord::from_value`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CanonicalRecord {
    Garment(GarmentProfile),
    Fabric(FabricCareProfile),
    Laundry(LaundryAdvice),
    Stain(StainTip),
    Batch(BatchResult),
}

impl CanonicalRecord {
    pub fn kind(&self) -> RecordKind {
        match self {
            CanonicalRecord::Garment(_) => RecordKind::Garment,
            CanonicalRecord::Fabric(_) => RecordKind::Fabric,
            CanonicalRecord::Laundry(_) => RecordKind::Laundry,
            CanonicalRecord::Stain(_) => RecordKind::Stain,
            CanonicalRecord::Batch(_) => RecordKind::Batch,
        }
    }

    pub fn locale(&self) -> &str {
        match self {
            CanonicalRecord::Garment(r) => &r.locale,
            CanonicalRecord::Fabric(r) => &r.locale,
            CanonicalRecord::Laundry(r) => &r.locale,
            CanonicalRecord::Stain(r) => &r.locale,
            CanonicalRecord::Batch(r) => &r.locale,
        }
    }

    /// Return the same record tagged with another locale.
    pub fn with_locale(mut self, locale: &str) -> Self {
        let slot = match &mut self {
            CanonicalRecord::Garment(r) => &mut r.locale,
            CanonicalRecord::Fabric(r) => &mut r.locale,
            CanonicalRecord::Laundry(r) => &mut r.locale,
            CanonicalRecord::Stain(r) => &mut r.locale,
            CanonicalRecord::Batch(r) => &mut r.locale,
        };
        *slot = locale.to_string();
        self
    }

    /// Top-level machine recommendation, if the kind has one.
    pub fn recommendation(&self) -> Option<&Recommendation> {
        match self {
            CanonicalRecord::Garment(r) => Some(&r.recommended),
            CanonicalRecord::Fabric(r) => Some(&r.recommended),
            CanonicalRecord::Laundry(r) => Some(&r.recommended),
            CanonicalRecord::Stain(r) => Some(&r.recommended),
            CanonicalRecord::Batch(_) => None,
        }
    }

    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    /// Decode a cached value as a record of the given kind.
    pub fn from_value(kind: RecordKind, value: Value) -> serde_json::Result<Self> {
        Ok(match kind {
            RecordKind::Garment => CanonicalRecord::Garment(serde_json::from_value(value)?),
            RecordKind::Fabric => CanonicalRecord::Fabric(serde_json::from_value(value)?),
            RecordKind::Laundry => CanonicalRecord::Laundry(serde_json::from_value(value)?),
            RecordKind::Stain => CanonicalRecord::Stain(serde_json::from_value(value)?),
            RecordKind::Batch => CanonicalRecord::Batch(serde_json::from_value(value)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn garment() -> GarmentProfile {
        GarmentProfile {
            garment_type: GarmentType::Shirt,
            fabric: Fabric::Cotton,
            color: "navy".to_string(),
            wash_cycle: WashCycle::MachineWarm,
            recommended: Recommendation {
                temp: 40,
                spin: 1000,
                program: Program::Cotton,
            },
            care_instructions: vec!["Wash inside out".to_string()],
            warnings: vec![],
            stains: vec![StainKind::Coffee],
            locale: BASE_LOCALE.to_string(),
        }
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let value = CanonicalRecord::Garment(garment()).to_value().unwrap();
        assert_eq!(value["garmentType"], "shirt");
        assert_eq!(value["washCycle"], "machine_warm");
        assert_eq!(value["careInstructions"][0], "Wash inside out");
        assert_eq!(value["recommended"]["spin"], 1000);
        assert!(value.get("kind").is_none());
    }

    #[test]
    fn test_from_value_by_kind() {
        let record = CanonicalRecord::Garment(garment());
        let value = record.to_value().unwrap();
        let back = CanonicalRecord::from_value(RecordKind::Garment, value.clone()).unwrap();
        assert_eq!(back, record);
        assert!(CanonicalRecord::from_value(RecordKind::Stain, value).is_err());
    }

    #[test]
    fn test_with_locale() {
        let record = CanonicalRecord::Garment(garment()).with_locale("el");
        assert_eq!(record.locale(), "el");
        assert_eq!(record.kind(), RecordKind::Garment);
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("Batch".parse::<RecordKind>().unwrap(), RecordKind::Batch);
        assert!("towel".parse::<RecordKind>().is_err());
    }
}
