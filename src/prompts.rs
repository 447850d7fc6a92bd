//! Prompt text for every model request.
//!
//! Canonicalization prompts spell out the JSON shape of the record kind and
//! list the allowed enum tokens, so well-behaved replies normalize without
//! keyword coercion. The normalizer still accepts anything the model sends.

use care_cache_core::fingerprint::Payload;
use care_cache_core::models::RecordKind;
use care_cache_core::vocab::{
    BleachRule, ColorGroup, DryingMethod, Fabric, GarmentType, IronSetting, Program, StainKind,
    WashCycle,
};

/// System prompt for canonicalizing an input as `kind`, with text written
/// in the `base_locale` language.
pub fn canonicalize_system(kind: RecordKind, base_locale: &str) -> String {
    let role = match kind {
        RecordKind::Garment => "You identify a garment from a photo or description and give laundry care advice.",
        RecordKind::Fabric => "You read fabric care labels and textile descriptions and explain how to care for them.",
        RecordKind::Laundry => "You answer laundry questions with a concrete machine recommendation.",
        RecordKind::Stain => "You explain how to remove a stain from a textile safely.",
        RecordKind::Batch => "You sort a pile of laundry into compatible wash loads.",
    };
    format!(
        "{}\nReply with a single JSON object and nothing else. \
         Write every text value in the language with tag '{}'.\n\n{}",
        role,
        base_locale,
        schema(kind)
    )
}

/// User prompt for canonicalizing a prepared payload.
pub fn canonicalize_prompt(kind: RecordKind, payload: &Payload) -> String {
    match payload {
        Payload::Image(_) => match kind {
            RecordKind::Batch => "List every garment visible in this photo.".to_string(),
            RecordKind::Fabric => "Read the care label or fabric in this photo.".to_string(),
            RecordKind::Stain => "Identify the stain in this photo and how to remove it.".to_string(),
            _ => "Describe the item in this photo.".to_string(),
        },
        Payload::Text(query) => format!("Query: {}", query),
    }
}

/// System prompt for translating a serialized record.
pub fn translate_system(locale: &str) -> String {
    format!(
        "You translate laundry care records into the language with tag '{}'. \
         Translate only human-readable text values. Keep every key, every enum \
         token, every number and the length of every array exactly as given. \
         Reply with the translated JSON object and nothing else.",
        locale
    )
}

/// User prompt carrying the record to translate.
pub fn translate_prompt(record_json: &str) -> String {
    format!("Translate this record:\n{}", record_json)
}

/// System prompt for translating a single label.
pub fn label_system(locale: &str) -> String {
    format!(
        "You translate short laundry labels into the language with tag '{}'. \
         Keep numbers and units unchanged. Reply as {{\"text\": \"<translation>\"}}.",
        locale
    )
}

pub fn label_prompt(label: &str) -> String {
    format!("Label: {}", label)
}

fn tokens<T: std::fmt::Display>(values: &[T]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("|")
}

fn recommendation_schema() -> String {
    format!(
        "\"recommended\": {{\"temp\": <celsius>, \"spin\": <rpm>, \"program\": \"{}\"}}",
        tokens(Program::ALL)
    )
}

fn schema(kind: RecordKind) -> String {
    let body = match kind {
        RecordKind::Garment => format!(
            "\"garmentType\": \"{}\", \"fabric\": \"{}\", \"color\": \"<text>\", \
             \"washCycle\": \"{}\", {}, \"careInstructions\": [\"<text>\"], \
             \"warnings\": [\"<text>\"], \"stains\": [\"{}\"]",
            tokens(GarmentType::ALL),
            tokens(Fabric::ALL),
            tokens(WashCycle::ALL),
            recommendation_schema(),
            tokens(StainKind::ALL),
        ),
        RecordKind::Fabric => format!(
            "\"fabric\": \"{}\", \"washCycle\": \"{}\", \"drying\": \"{}\", \
             \"ironing\": \"{}\", \"bleach\": \"{}\", {}, \"description\": \"<text>\", \
             \"careInstructions\": [\"<text>\"], \"warnings\": [\"<text>\"]",
            tokens(Fabric::ALL),
            tokens(WashCycle::ALL),
            tokens(DryingMethod::ALL),
            tokens(IronSetting::ALL),
            tokens(BleachRule::ALL),
            recommendation_schema(),
        ),
        RecordKind::Laundry => format!(
            "\"washCycle\": \"{}\", {}, \"answer\": \"<text>\", \"tips\": [\"<text>\"], \
             \"warnings\": [\"<text>\"]",
            tokens(WashCycle::ALL),
            recommendation_schema(),
        ),
        RecordKind::Stain => format!(
            "\"stain\": \"{}\", \"fabric\": \"{}\", {}, \"steps\": [\"<text>\"], \
             \"products\": [\"<text>\"], \"warnings\": [\"<text>\"]",
            tokens(StainKind::ALL),
            tokens(Fabric::ALL),
            recommendation_schema(),
        ),
        RecordKind::Batch => format!(
            "\"items\": [{{\"label\": \"<short name>\", \"garmentType\": \"{}\", \
             \"fabric\": \"{}\", \"colorGroup\": \"{}\", \"washCycle\": \"{}\", {}, \
             \"stains\": [\"{}\"]}}], \"suggestions\": [\"<text>\"]",
            tokens(GarmentType::ALL),
            tokens(Fabric::ALL),
            tokens(ColorGroup::ALL),
            tokens(WashCycle::ALL),
            recommendation_schema(),
            tokens(StainKind::ALL),
        ),
    };
    format!("JSON shape: {{{}}}", body)
}
