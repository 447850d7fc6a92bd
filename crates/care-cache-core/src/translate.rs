//! Field-by-field merging of a model translation into a canonical record.
//!
//! Only human-readable text changes under translation. Enum tokens, numbers
//! and list lengths always come from the canonical record. A translated text
//! that is missing, not a string, or blank falls back to the canonical text
//! for that field (or list element) alone, so a partial translation still
//! improves on the base language.
//!
//! | Kind | Translated fields |
//! |------|-------------------|
//! | garment | `color`, `careInstructions[]`, `warnings[]` |
//! | fabric | `description`, `careInstructions[]`, `warnings[]` |
//! | laundry | `answer`, `tips[]`, `warnings[]` |
//! | stain | `steps[]`, `products[]`, `warnings[]` |
//! | batch | `items[].label` |
//!
//! Batch group labels and suggestions are short, reusable strings; they are
//! translated one by one through the label cache instead.

use serde_json::Value;

use crate::models::{BatchResult, CanonicalRecord};

/// Merge a parsed translation reply into `canonical`, tagging the result
/// with `locale`. `translated` may be `None` or any JSON shape.
pub fn merge_translation(
    canonical: &CanonicalRecord,
    translated: Option<&Value>,
    locale: &str,
) -> CanonicalRecord {
    let t = |key: &str| translated.and_then(|v| v.get(key));
    let merged = match canonical {
        CanonicalRecord::Garment(c) => {
            let mut r = c.clone();
            r.color = pick_text(&c.color, t("color"));
            r.care_instructions = pick_list(&c.care_instructions, t("careInstructions"));
            r.warnings = pick_list(&c.warnings, t("warnings"));
            CanonicalRecord::Garment(r)
        }
        CanonicalRecord::Fabric(c) => {
            let mut r = c.clone();
            r.description = pick_text(&c.description, t("description"));
            r.care_instructions = pick_list(&c.care_instructions, t("careInstructions"));
            r.warnings = pick_list(&c.warnings, t("warnings"));
            CanonicalRecord::Fabric(r)
        }
        CanonicalRecord::Laundry(c) => {
            let mut r = c.clone();
            r.answer = pick_text(&c.answer, t("answer"));
            r.tips = pick_list(&c.tips, t("tips"));
            r.warnings = pick_list(&c.warnings, t("warnings"));
            CanonicalRecord::Laundry(r)
        }
        CanonicalRecord::Stain(c) => {
            let mut r = c.clone();
            r.steps = pick_list(&c.steps, t("steps"));
            r.products = pick_list(&c.products, t("products"));
            r.warnings = pick_list(&c.warnings, t("warnings"));
            CanonicalRecord::Stain(r)
        }
        CanonicalRecord::Batch(c) => CanonicalRecord::Batch(merge_batch(c, t("items"))),
    };
    merged.with_locale(locale)
}

fn merge_batch(canonical: &BatchResult, items: Option<&Value>) -> BatchResult {
    let mut r = canonical.clone();
    for (index, item) in r.items.iter_mut().enumerate() {
        let translated = items
            .and_then(Value::as_array)
            .and_then(|a| a.get(index))
            .and_then(|v| v.get("label"));
        item.label = pick_text(&item.label, translated);
    }
    r
}

/// Translated text if usable, otherwise the canonical text.
pub fn pick_text(canonical: &str, translated: Option<&Value>) -> String {
    if canonical.is_empty() {
        return String::new();
    }
    translated
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(canonical)
        .to_string()
}

/// Element-wise [`pick_text`]; the result always has the canonical length.
pub fn pick_list(canonical: &[String], translated: Option<&Value>) -> Vec<String> {
    let items = translated.and_then(Value::as_array);
    canonical
        .iter()
        .enumerate()
        .map(|(i, c)| pick_text(c, items.and_then(|a| a.get(i))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GarmentProfile, Recommendation, RecordKind, BASE_LOCALE};
    use crate::normalize::normalize;
    use crate::vocab::{Fabric, GarmentType, Program, WashCycle};
    use serde_json::json;

    fn canonical() -> CanonicalRecord {
        CanonicalRecord::Garment(GarmentProfile {
            garment_type: GarmentType::Dress,
            fabric: Fabric::Silk,
            color: "red".to_string(),
            wash_cycle: WashCycle::HandWash,
            recommended: Recommendation {
                temp: 30,
                spin: 400,
                program: Program::Delicates,
            },
            care_instructions: vec!["Wash by hand".to_string(), "Dry flat".to_string()],
            warnings: vec!["Colour may bleed".to_string()],
            stains: vec![],
            locale: BASE_LOCALE.to_string(),
        })
    }

    #[test]
    fn test_missing_field_falls_back() {
        let reply = json!({
            "careInstructions": ["Πλύσιμο στο χέρι", "Στέγνωμα σε επίπεδη θέση"],
            "warnings": ["Το χρώμα μπορεί να ξεβάψει"],
        });
        match merge_translation(&canonical(), Some(&reply), "el") {
            CanonicalRecord::Garment(g) => {
                assert_eq!(g.color, "red");
                assert_eq!(g.care_instructions[0], "Πλύσιμο στο χέρι");
                assert_eq!(g.locale, "el");
            }
            other => panic!("unexpected {:?}", other.kind()),
        }
    }

    #[test]
    fn test_control_values_are_never_translated() {
        let reply = json!({
            "fabric": "μετάξι",
            "washCycle": "πλύσιμο",
            "recommended": {"temp": 90, "spin": 1600, "program": "βαμβάκι"},
            "color": "κόκκινο",
        });
        let merged = merge_translation(&canonical(), Some(&reply), "el");
        assert_eq!(merged.recommendation(), canonical().recommendation());
        match merged {
            CanonicalRecord::Garment(g) => {
                assert_eq!(g.fabric, Fabric::Silk);
                assert_eq!(g.wash_cycle, WashCycle::HandWash);
                assert_eq!(g.color, "κόκκινο");
            }
            other => panic!("unexpected {:?}", other.kind()),
        }
    }

    #[test]
    fn test_list_lengths_preserved() {
        let reply = json!({
            "careInstructions": ["", "Séchage à plat", "extra line"],
            "warnings": 12,
        });
        match merge_translation(&canonical(), Some(&reply), "fr") {
            CanonicalRecord::Garment(g) => {
                assert_eq!(g.care_instructions, vec!["Wash by hand", "Séchage à plat"]);
                assert_eq!(g.warnings, vec!["Colour may bleed"]);
            }
            other => panic!("unexpected {:?}", other.kind()),
        }
    }

    #[test]
    fn test_no_reply_keeps_canonical_prose() {
        let merged = merge_translation(&canonical(), None, "de");
        assert_eq!(merged, canonical().with_locale("de"));
    }

    #[test]
    fn test_batch_item_labels() {
        let raw = json!({"items": [
            {"label": "Blue jeans", "fabric": "denim"},
            {"label": "White shirt", "fabric": "cotton"},
        ]});
        let batch = normalize(Some(&raw), RecordKind::Batch);
        let reply = json!({"items": [{"label": "Blaue Jeans"}, {"fabric": "Baumwolle"}]});
        match merge_translation(&batch, Some(&reply), "de") {
            CanonicalRecord::Batch(b) => {
                assert_eq!(b.items[0].label, "Blaue Jeans");
                assert_eq!(b.items[1].label, "White shirt");
                assert_eq!(b.items[1].fabric, Fabric::Cotton);
            }
            other => panic!("unexpected {:?}", other.kind()),
        }
    }
}
