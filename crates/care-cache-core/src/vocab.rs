//! Closed vocabularies for enum fields and the keyword rules that coerce
//! free text into them.
//!
//! Coercion lower-cases the raw string and walks an ordered rule list. A
//! rule matches when any of its keywords is a substring; the first matching
//! rule wins. When nothing matches, the vocabulary's *unmatched* value is
//! used. Rule order is part of the contract: changing it changes cached
//! results, so it must be accompanied by a cache version bump.

use serde::{Deserialize, Serialize};

/// One ordered coercion rule.
#[derive(Debug, Clone, Copy)]
pub struct Rule<T> {
    pub keywords: &'static [&'static str],
    pub value: T,
}

const fn rule<T>(keywords: &'static [&'static str], value: T) -> Rule<T> {
    Rule { keywords, value }
}

/// A closed vocabulary with keyword coercion.
pub trait Vocabulary: Copy + 'static {
    /// Ordered keyword rules.
    fn rules() -> &'static [Rule<Self>];

    /// Value for a present string that matches no rule.
    fn unmatched() -> Self;

    /// Coerce a raw string. Deterministic and total.
    fn coerce(raw: &str) -> Self {
        match_rules(Self::rules(), raw).unwrap_or_else(Self::unmatched)
    }
}

/// First rule whose keyword occurs in `raw` (case-insensitive).
pub fn match_rules<T: Copy>(rules: &[Rule<T>], raw: &str) -> Option<T> {
    let lowered = raw.to_lowercase();
    rules
        .iter()
        .find(|r| r.keywords.iter().any(|k| lowered.contains(k)))
        .map(|r| r.value)
}

macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident => $token:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $token)] $variant),+
        }

        impl $name {
            /// Every token, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire token for this value.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $token),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

vocabulary! {
    /// Dominant fibre of a garment or textile.
    pub enum Fabric {
        Cotton => "cotton",
        Polyester => "polyester",
        Wool => "wool",
        Cashmere => "cashmere",
        Silk => "silk",
        Linen => "linen",
        Denim => "denim",
        Nylon => "nylon",
        Viscose => "viscose",
        Acrylic => "acrylic",
        Elastane => "elastane",
        Leather => "leather",
        Down => "down",
        Blend => "blend",
        Unknown => "unknown",
    }
}

const FABRIC_RULES: &[Rule<Fabric>] = &[
    rule(&["cashmere"], Fabric::Cashmere),
    rule(&["merino", "wool", "alpaca", "mohair"], Fabric::Wool),
    rule(&["silk"], Fabric::Silk),
    rule(&["linen", "flax"], Fabric::Linen),
    rule(&["denim", "jean"], Fabric::Denim),
    rule(&["leather", "suede"], Fabric::Leather),
    rule(&["down", "feather"], Fabric::Down),
    rule(
        &["viscose", "rayon", "modal", "lyocell", "tencel", "bamboo"],
        Fabric::Viscose,
    ),
    rule(&["elastane", "spandex", "lycra"], Fabric::Elastane),
    rule(&["nylon", "polyamide"], Fabric::Nylon),
    rule(&["acrylic"], Fabric::Acrylic),
    rule(&["polyester", "poly"], Fabric::Polyester),
    rule(&["cotton"], Fabric::Cotton),
    rule(&["blend", "mixed", "mix"], Fabric::Blend),
];

impl Vocabulary for Fabric {
    fn rules() -> &'static [Rule<Self>] {
        FABRIC_RULES
    }
    fn unmatched() -> Self {
        Fabric::Unknown
    }
}

vocabulary! {
    /// How an item may be washed.
    pub enum WashCycle {
        HandWash => "hand_wash",
        DoNotWash => "do_not_wash",
        MachineHot => "machine_hot",
        MachineWarm => "machine_warm",
        MachineCold => "machine_cold",
    }
}

const WASH_CYCLE_RULES: &[Rule<WashCycle>] = &[
    rule(&["hand"], WashCycle::HandWash),
    rule(
        &["do not wash", "not washable", "dry clean"],
        WashCycle::DoNotWash,
    ),
    rule(&["60", "hot"], WashCycle::MachineHot),
    rule(&["40", "warm"], WashCycle::MachineWarm),
];

impl Vocabulary for WashCycle {
    fn rules() -> &'static [Rule<Self>] {
        WASH_CYCLE_RULES
    }
    fn unmatched() -> Self {
        WashCycle::MachineCold
    }
}

impl WashCycle {
    /// English phrase used in generated labels.
    pub fn label(&self) -> &'static str {
        match self {
            WashCycle::HandWash => "hand wash",
            WashCycle::DoNotWash => "do not wash",
            WashCycle::MachineHot => "machine hot",
            WashCycle::MachineWarm => "machine warm",
            WashCycle::MachineCold => "machine cold",
        }
    }
}

vocabulary! {
    pub enum GarmentType {
        Shirt => "shirt",
        TShirt => "t_shirt",
        Sweater => "sweater",
        Trousers => "trousers",
        Jeans => "jeans",
        Dress => "dress",
        Skirt => "skirt",
        Jacket => "jacket",
        Underwear => "underwear",
        Socks => "socks",
        Towel => "towel",
        Bedding => "bedding",
        Unknown => "unknown",
    }
}

const GARMENT_TYPE_RULES: &[Rule<GarmentType>] = &[
    rule(
        &["sweatshirt", "hoodie", "sweater", "jumper", "pullover", "cardigan"],
        GarmentType::Sweater,
    ),
    rule(&["t-shirt", "tshirt", "tee"], GarmentType::TShirt),
    rule(&["shirt", "blouse"], GarmentType::Shirt),
    rule(&["jean"], GarmentType::Jeans),
    rule(
        &["trouser", "pant", "chino", "legging", "short"],
        GarmentType::Trousers,
    ),
    rule(&["dress", "gown"], GarmentType::Dress),
    rule(&["skirt"], GarmentType::Skirt),
    rule(&["jacket", "coat", "blazer", "parka"], GarmentType::Jacket),
    rule(
        &["underwear", "bra", "brief", "boxer", "lingerie"],
        GarmentType::Underwear,
    ),
    rule(&["sock"], GarmentType::Socks),
    rule(&["towel"], GarmentType::Towel),
    rule(
        &["sheet", "duvet", "pillow", "bedding", "blanket"],
        GarmentType::Bedding,
    ),
];

impl Vocabulary for GarmentType {
    fn rules() -> &'static [Rule<Self>] {
        GARMENT_TYPE_RULES
    }
    fn unmatched() -> Self {
        GarmentType::Unknown
    }
}

vocabulary! {
    /// Washing machine program.
    pub enum Program {
        Cotton => "cotton",
        Synthetics => "synthetics",
        Delicates => "delicates",
        Wool => "wool",
        HandWash => "hand_wash",
        Sportswear => "sportswear",
        Bedding => "bedding",
        Quick => "quick",
        Eco => "eco",
        Mixed => "mixed",
        Unknown => "unknown",
    }
}

const PROGRAM_RULES: &[Rule<Program>] = &[
    rule(&["wool", "cashmere"], Program::Wool),
    rule(&["hand"], Program::HandWash),
    rule(&["delicate", "silk", "gentle"], Program::Delicates),
    rule(
        &["synthetic", "poly", "easy care", "easy-care"],
        Program::Synthetics,
    ),
    rule(&["sport", "active"], Program::Sportswear),
    rule(&["bed", "duvet", "sheet"], Program::Bedding),
    rule(&["quick", "rapid", "express"], Program::Quick),
    rule(&["eco"], Program::Eco),
    rule(&["mix"], Program::Mixed),
    rule(&["cotton"], Program::Cotton),
];

impl Vocabulary for Program {
    fn rules() -> &'static [Rule<Self>] {
        PROGRAM_RULES
    }
    fn unmatched() -> Self {
        Program::Unknown
    }
}

vocabulary! {
    /// Controlled stain/defect vocabulary.
    pub enum StainKind {
        Makeup => "makeup",
        Coffee => "coffee",
        Wine => "wine",
        Blood => "blood",
        Grass => "grass",
        Sweat => "sweat",
        Grease => "grease",
        Ink => "ink",
        Rust => "rust",
        Mud => "mud",
        Tea => "tea",
        Food => "food",
        Other => "other",
    }
}

const STAIN_RULES: &[Rule<StainKind>] = &[
    rule(
        &["makeup", "make-up", "lipstick", "foundation", "mascara"],
        StainKind::Makeup,
    ),
    rule(&["coffee", "espresso"], StainKind::Coffee),
    rule(&["wine"], StainKind::Wine),
    rule(&["blood"], StainKind::Blood),
    rule(&["grass"], StainKind::Grass),
    rule(&["sweat", "deodorant", "perspiration"], StainKind::Sweat),
    rule(&["grease", "oil", "butter"], StainKind::Grease),
    rule(&["ink", "pen", "marker"], StainKind::Ink),
    rule(&["rust"], StainKind::Rust),
    rule(&["mud", "dirt", "soil", "clay"], StainKind::Mud),
    rule(&["tea"], StainKind::Tea),
    rule(
        &["food", "sauce", "ketchup", "chocolate", "tomato", "curry", "juice"],
        StainKind::Food,
    ),
];

impl Vocabulary for StainKind {
    fn rules() -> &'static [Rule<Self>] {
        STAIN_RULES
    }
    fn unmatched() -> Self {
        StainKind::Other
    }
}

vocabulary! {
    /// Sorting group for a load.
    pub enum ColorGroup {
        Whites => "whites",
        Lights => "lights",
        Darks => "darks",
        Colors => "colors",
        Unknown => "unknown",
    }
}

const COLOR_GROUP_RULES: &[Rule<ColorGroup>] = &[
    rule(&["white", "cream", "ivory"], ColorGroup::Whites),
    rule(
        &["black", "navy", "dark", "charcoal", "brown"],
        ColorGroup::Darks,
    ),
    rule(
        &["light", "pastel", "beige", "grey", "gray"],
        ColorGroup::Lights,
    ),
    rule(&["color", "colour", "bright"], ColorGroup::Colors),
];

impl Vocabulary for ColorGroup {
    fn rules() -> &'static [Rule<Self>] {
        COLOR_GROUP_RULES
    }
    fn unmatched() -> Self {
        ColorGroup::Colors
    }
}

impl ColorGroup {
    /// English name used in generated labels.
    pub fn label(&self) -> &'static str {
        match self {
            ColorGroup::Whites => "Whites",
            ColorGroup::Lights => "Lights",
            ColorGroup::Darks => "Darks",
            ColorGroup::Colors => "Colors",
            ColorGroup::Unknown => "Mixed colors",
        }
    }
}

vocabulary! {
    pub enum DryingMethod {
        TumbleDry => "tumble_dry",
        TumbleLow => "tumble_low",
        LineDry => "line_dry",
        FlatDry => "flat_dry",
        DoNotTumble => "do_not_tumble",
        Unknown => "unknown",
    }
}

const DRYING_RULES: &[Rule<DryingMethod>] = &[
    rule(
        &["do not tumble", "no tumble", "not tumble"],
        DryingMethod::DoNotTumble,
    ),
    rule(
        &["tumble dry low", "tumble low", "low heat"],
        DryingMethod::TumbleLow,
    ),
    rule(&["tumble", "dryer"], DryingMethod::TumbleDry),
    rule(&["flat"], DryingMethod::FlatDry),
    rule(&["line", "hang", "air dry", "drip"], DryingMethod::LineDry),
];

impl Vocabulary for DryingMethod {
    fn rules() -> &'static [Rule<Self>] {
        DRYING_RULES
    }
    fn unmatched() -> Self {
        DryingMethod::Unknown
    }
}

vocabulary! {
    pub enum IronSetting {
        DoNotIron => "do_not_iron",
        Low => "low",
        Medium => "medium",
        High => "high",
        Unknown => "unknown",
    }
}

const IRON_RULES: &[Rule<IronSetting>] = &[
    rule(&["do not iron", "no iron"], IronSetting::DoNotIron),
    rule(
        &["high", "hot", "200", "three dot", "3 dot"],
        IronSetting::High,
    ),
    rule(&["medium", "150", "two dot", "2 dot"], IronSetting::Medium),
    rule(&["low", "cool", "110", "one dot", "1 dot"], IronSetting::Low),
];

impl Vocabulary for IronSetting {
    fn rules() -> &'static [Rule<Self>] {
        IRON_RULES
    }
    fn unmatched() -> Self {
        IronSetting::Unknown
    }
}

vocabulary! {
    pub enum BleachRule {
        Any => "any",
        NonChlorine => "non_chlorine",
        DoNotBleach => "do_not_bleach",
        Unknown => "unknown",
    }
}

const BLEACH_RULES: &[Rule<BleachRule>] = &[
    rule(
        &["do not bleach", "no bleach", "not bleach"],
        BleachRule::DoNotBleach,
    ),
    rule(
        &[
            "non-chlorine",
            "non chlorine",
            "oxygen",
            "color safe",
            "colour safe",
        ],
        BleachRule::NonChlorine,
    ),
    rule(&["bleach", "chlorine", "any"], BleachRule::Any),
];

impl Vocabulary for BleachRule {
    fn rules() -> &'static [Rule<Self>] {
        BLEACH_RULES
    }
    fn unmatched() -> Self {
        BleachRule::Unknown
    }
}
