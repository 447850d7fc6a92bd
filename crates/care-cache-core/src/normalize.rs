//! Schema normalizer: loosely shaped model JSON → strict canonical records.
//!
//! [`normalize`] never fails. `None`, non-object input and partially shaped
//! objects all produce a fully populated record, using per-field defaults:
//!
//! | Field type | Missing / wrong type | Present but unrecognised |
//! |------------|----------------------|--------------------------|
//! | enum | kind-specific default | vocabulary's unmatched value |
//! | `temp` | 30 | 30 (non-numeric or outside 0–95) |
//! | `spin` | 800 | 800 (non-numeric or outside 0–1600) |
//! | text | `""` | numbers and booleans are stringified |
//! | list | `[]` | elements trimmed, non-scalars dropped |
//!
//! Program defaults by kind: garment `mixed`, fabric `mixed`, laundry `eco`,
//! stain `cotton`, batch items `mixed`.
//!
//! Batch items are normalized one by one. An item whose fabric does not
//! coerce to a known value is dropped, not defaulted. Surviving items are
//! grouped by colour group and wash cycle.

use std::ops::RangeInclusive;

use serde_json::{Map, Value};

use crate::models::{
    BatchGroup, BatchItem, BatchResult, CanonicalRecord, FabricCareProfile, GarmentProfile,
    LaundryAdvice, Recommendation, RecordKind, StainTip, BASE_LOCALE, DEFAULT_SPIN, DEFAULT_TEMP,
};
use crate::vocab::{
    BleachRule, ColorGroup, DryingMethod, Fabric, GarmentType, IronSetting, Program, StainKind,
    Vocabulary, WashCycle,
};

type Object = Map<String, Value>;

const TEMP_RANGE: RangeInclusive<f64> = 0.0..=95.0;
const SPIN_RANGE: RangeInclusive<f64> = 0.0..=1600.0;

const CARE_KEYS: &[&str] = &["careInstructions", "care_instructions", "care"];
const WARNING_KEYS: &[&str] = &["warnings", "warning"];
const FABRIC_KEYS: &[&str] = &["fabric", "material", "composition"];
const WASH_KEYS: &[&str] = &["washCycle", "wash_cycle", "wash"];
const STAIN_LIST_KEYS: &[&str] = &["stains", "defects"];
const GARMENT_TYPE_KEYS: &[&str] = &["garmentType", "garment_type", "type", "garment"];

/// Normalize parsed model output into a canonical record of `kind`.
pub fn normalize(raw: Option<&Value>, kind: RecordKind) -> CanonicalRecord {
    let obj = raw.and_then(Value::as_object);
    match kind {
        RecordKind::Garment => CanonicalRecord::Garment(garment(obj)),
        RecordKind::Fabric => CanonicalRecord::Fabric(fabric_care(obj)),
        RecordKind::Laundry => CanonicalRecord::Laundry(laundry(obj)),
        RecordKind::Stain => CanonicalRecord::Stain(stain_tip(obj)),
        RecordKind::Batch => CanonicalRecord::Batch(batch(obj)),
    }
}

fn garment(obj: Option<&Object>) -> GarmentProfile {
    GarmentProfile {
        garment_type: enum_field(field(obj, GARMENT_TYPE_KEYS), GarmentType::Unknown),
        fabric: enum_field(field(obj, FABRIC_KEYS), Fabric::Unknown),
        color: text(field(obj, &["color", "colour"])),
        wash_cycle: enum_field(field(obj, WASH_KEYS), WashCycle::MachineCold),
        recommended: recommendation(obj, Program::Mixed),
        care_instructions: string_list(field(obj, CARE_KEYS)),
        warnings: string_list(field(obj, WARNING_KEYS)),
        stains: stain_list(field(obj, STAIN_LIST_KEYS)),
        locale: BASE_LOCALE.to_string(),
    }
}

fn fabric_care(obj: Option<&Object>) -> FabricCareProfile {
    FabricCareProfile {
        fabric: enum_field(field(obj, FABRIC_KEYS), Fabric::Unknown),
        wash_cycle: enum_field(field(obj, WASH_KEYS), WashCycle::MachineCold),
        drying: enum_field(field(obj, &["drying", "dry"]), DryingMethod::Unknown),
        ironing: enum_field(field(obj, &["ironing", "iron"]), IronSetting::Unknown),
        bleach: enum_field(field(obj, &["bleach", "bleaching"]), BleachRule::Unknown),
        recommended: recommendation(obj, Program::Mixed),
        description: text(field(obj, &["description", "summary"])),
        care_instructions: string_list(field(obj, CARE_KEYS)),
        warnings: string_list(field(obj, WARNING_KEYS)),
        locale: BASE_LOCALE.to_string(),
    }
}

fn laundry(obj: Option<&Object>) -> LaundryAdvice {
    LaundryAdvice {
        wash_cycle: enum_field(field(obj, WASH_KEYS), WashCycle::MachineCold),
        recommended: recommendation(obj, Program::Eco),
        answer: text(field(obj, &["answer", "advice", "summary"])),
        tips: string_list(field(obj, &["tips"])),
        warnings: string_list(field(obj, WARNING_KEYS)),
        locale: BASE_LOCALE.to_string(),
    }
}

fn stain_tip(obj: Option<&Object>) -> StainTip {
    StainTip {
        stain: enum_field(field(obj, &["stain", "stainType", "type"]), StainKind::Other),
        fabric: enum_field(field(obj, FABRIC_KEYS), Fabric::Unknown),
        recommended: recommendation(obj, Program::Cotton),
        steps: string_list(field(obj, &["steps", "instructions"])),
        products: string_list(field(obj, &["products"])),
        warnings: string_list(field(obj, WARNING_KEYS)),
        locale: BASE_LOCALE.to_string(),
    }
}

fn batch(obj: Option<&Object>) -> BatchResult {
    let items: Vec<BatchItem> = field(obj, &["items", "garments"])
        .and_then(Value::as_array)
        .map(|raw| raw.iter().filter_map(batch_item).collect())
        .unwrap_or_default();
    let groups = group_items(&items);
    BatchResult {
        items,
        groups,
        suggestions: string_list(field(obj, &["suggestions", "tips"])),
        locale: BASE_LOCALE.to_string(),
    }
}

/// Normalize one load item, or drop it when its fabric is unrecognisable.
fn batch_item(raw: &Value) -> Option<BatchItem> {
    let obj = raw.as_object();
    let fabric = enum_field(field(obj, FABRIC_KEYS), Fabric::Unknown);
    if fabric == Fabric::Unknown {
        return None;
    }
    let garment_type = enum_field(field(obj, GARMENT_TYPE_KEYS), GarmentType::Unknown);
    let mut label = text(field(obj, &["label", "name", "description"]));
    if label.is_empty() {
        let noun = match garment_type {
            GarmentType::Unknown => "item".to_string(),
            other => other.as_str().replace('_', " "),
        };
        label = format!("{} {}", fabric.as_str(), noun);
    }
    Some(BatchItem {
        label,
        garment_type,
        fabric,
        color_group: enum_field(
            field(obj, &["colorGroup", "color_group", "color", "colour"]),
            ColorGroup::Unknown,
        ),
        wash_cycle: enum_field(field(obj, WASH_KEYS), WashCycle::MachineCold),
        recommended: recommendation(obj, Program::Mixed),
        stains: stain_list(field(obj, STAIN_LIST_KEYS)),
    })
}

/// Group items by (colour group, wash cycle) in order of first appearance.
///
/// A group washes at the gentlest settings of its members. Its program is
/// the members' shared program, or `mixed` when they disagree.
pub fn group_items(items: &[BatchItem]) -> Vec<BatchGroup> {
    let mut groups: Vec<BatchGroup> = Vec::new();
    for (index, item) in items.iter().enumerate() {
        let existing = groups
            .iter_mut()
            .find(|g| g.color_group == item.color_group && g.wash_cycle == item.wash_cycle);
        match existing {
            Some(group) => {
                group.items.push(index);
                group.recommended.temp = group.recommended.temp.min(item.recommended.temp);
                group.recommended.spin = group.recommended.spin.min(item.recommended.spin);
                if group.recommended.program != item.recommended.program {
                    group.recommended.program = Program::Mixed;
                }
            }
            None => groups.push(BatchGroup {
                label: String::new(),
                color_group: item.color_group,
                wash_cycle: item.wash_cycle,
                recommended: item.recommended.clone(),
                items: vec![index],
            }),
        }
    }
    for group in &mut groups {
        group.label = format!(
            "{} · {}°C · {}",
            group.color_group.label(),
            group.recommended.temp,
            group.wash_cycle.label()
        );
    }
    groups
}

fn recommendation(obj: Option<&Object>, default_program: Program) -> Recommendation {
    // Nested settings win; flat keys are only consulted without them.
    let settings = field(obj, &["recommended", "recommendation"])
        .and_then(Value::as_object)
        .or(obj);
    Recommendation {
        temp: number(field(settings, &["temp", "temperature"]), TEMP_RANGE, DEFAULT_TEMP),
        spin: number(
            field(settings, &["spin", "spinSpeed", "rpm"]),
            SPIN_RANGE,
            DEFAULT_SPIN,
        ),
        program: enum_field(
            field(settings, &["program", "programme", "cycle"]),
            default_program,
        ),
    }
}

/// First non-null value among `keys`.
fn field<'a>(obj: Option<&'a Object>, keys: &[&str]) -> Option<&'a Value> {
    let obj = obj?;
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !v.is_null())
}

fn enum_field<T: Vocabulary>(raw: Option<&Value>, missing: T) -> T {
    match raw {
        Some(Value::String(s)) if !s.trim().is_empty() => T::coerce(s),
        _ => missing,
    }
}

fn text(raw: Option<&Value>) -> String {
    raw.and_then(scalar_to_string).unwrap_or_default()
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn string_list(raw: Option<&Value>) -> Vec<String> {
    match raw {
        Some(Value::Array(items)) => items.iter().filter_map(scalar_to_string).collect(),
        Some(Value::String(_)) => raw.and_then(scalar_to_string).into_iter().collect(),
        _ => Vec::new(),
    }
}

fn stain_list(raw: Option<&Value>) -> Vec<StainKind> {
    let mut stains: Vec<StainKind> = Vec::new();
    for entry in string_list(raw) {
        let stain = StainKind::coerce(&entry);
        if !stains.contains(&stain) {
            stains.push(stain);
        }
    }
    stains
}

fn number(raw: Option<&Value>, range: RangeInclusive<f64>, default: u32) -> u32 {
    let parsed = match raw {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => leading_number(s),
        _ => None,
    };
    match parsed {
        Some(x) if x.is_finite() && range.contains(&x.round()) => x.round() as u32,
        _ => default,
    }
}

/// Parse the leading decimal number of a string, e.g. `"40°C"` → 40.
fn leading_number(s: &str) -> Option<f64> {
    let trimmed = s.trim_start();
    let mut seen_dot = false;
    let end = trimmed
        .char_indices()
        .find(|(_, c)| match c {
            '0'..='9' => false,
            '.' if !seen_dot => {
                seen_dot = true;
                false
            }
            _ => true,
        })
        .map(|(i, _)| i)
        .unwrap_or(trimmed.len());
    trimmed[..end].parse().ok()
}
