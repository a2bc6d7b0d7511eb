use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::catalog::{ChoiceTable, HairColor};

/// Hair-length key that triggers the short-hair style exclusions.
pub const SHORT_HAIR: &str = "短发";

/// Appearance option tables shared by both generator flavors.
///
/// Optional categories (`hair_length`, `hair_bangs`, `chest`) are empty
/// tables when a flavor does not use them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppearanceTables {
    pub hair_length: ChoiceTable,
    pub hair_style: ChoiceTable,
    /// Styles that require long, bound hair.
    pub short_hair_exclusions: BTreeSet<String>,
    pub hair_bangs: ChoiceTable,
    pub hair_color: Vec<HairColor>,
    pub eye_color: ChoiceTable,
    pub chest: ChoiceTable,
    pub body: ChoiceTable,
    pub hair_accessories: Vec<String>,
}

impl AppearanceTables {
    pub fn hair_color(&self, key: &str) -> Option<&HairColor> {
        self.hair_color.iter().find(|color| color.key == key)
    }

    pub fn hair_color_keys(&self) -> impl Iterator<Item = &str> {
        self.hair_color.iter().map(|color| color.key.as_str())
    }

    /// Whether `style` may be combined with `length`.
    pub fn style_allowed(&self, length: Option<&str>, style: &str) -> bool {
        length != Some(SHORT_HAIR) || !self.short_hair_exclusions.contains(style)
    }

    /// Style keys usable with `length`, in declaration order.
    pub fn styles_for_length(&self, length: Option<&str>) -> Vec<&str> {
        self.hair_style
            .keys()
            .filter(|style| self.style_allowed(length, style))
            .collect()
    }
}

/// Camera framing pools.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraTables {
    pub shot: ChoiceTable,
    pub angle: ChoiceTable,
    pub composition: ChoiceTable,
    /// Empty for flavors without a character-action field.
    pub character_action: ChoiceTable,
}
