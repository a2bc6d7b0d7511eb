use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::assembler::assemble;

/// Prompt segment slot. Declaration order is assembly order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Prefix,
    Race,
    HairColor,
    Hair,
    EyeColor,
    Chest,
    Body,
    Attire,
    Expression,
    Pose,
    Scene,
    Lighting,
    Atmosphere,
    Palette,
    CharacterAction,
    Shot,
    Angle,
    Composition,
    Quality,
}

impl Field {
    /// Fields left out entirely for appearance-suppressed races.
    pub fn is_appearance(self) -> bool {
        matches!(
            self,
            Field::HairColor | Field::Hair | Field::EyeColor | Field::Chest | Field::Body
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Field::Prefix => "prefix",
            Field::Race => "race",
            Field::HairColor => "hair_color",
            Field::Hair => "hair",
            Field::EyeColor => "eye_color",
            Field::Chest => "chest",
            Field::Body => "body",
            Field::Attire => "attire",
            Field::Expression => "expression",
            Field::Pose => "pose",
            Field::Scene => "scene",
            Field::Lighting => "lighting",
            Field::Atmosphere => "atmosphere",
            Field::Palette => "palette",
            Field::CharacterAction => "character_action",
            Field::Shot => "shot",
            Field::Angle => "angle",
            Field::Composition => "composition",
            Field::Quality => "quality",
        }
    }
}

/// Concrete per-entity field values plus the entity seed.
///
/// Blank values are never stored, so a missing field and an empty field are
/// the same thing to the assembler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSelection {
    fields: BTreeMap<Field, String>,
    seed: u32,
    alternate_attire: Option<String>,
}

impl ResolvedSelection {
    pub fn new(seed: u32) -> Self {
        Self {
            fields: BTreeMap::new(),
            seed,
            alternate_attire: None,
        }
    }

    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn with_optional(self, field: Field, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.with(field, value),
            None => self,
        }
    }

    pub fn with_alternate_attire(mut self, block: Option<String>) -> Self {
        self.alternate_attire = block.filter(|block| !block.trim().is_empty());
        self
    }

    pub(crate) fn insert(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        if value.trim().is_empty() {
            self.fields.remove(&field);
        } else {
            self.fields.insert(field, value);
        }
    }

    pub(crate) fn with_seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.fields.contains_key(&field)
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn alternate_attire(&self) -> Option<&str> {
        self.alternate_attire.as_deref()
    }

    /// Present fields in assembly order.
    pub fn fields(&self) -> impl Iterator<Item = (Field, &str)> {
        self.fields
            .iter()
            .map(|(field, value)| (*field, value.as_str()))
    }

    pub fn prompt(&self) -> String {
        assemble(self.fields.values().map(Some))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_assemble_in_declaration_order() {
        let selection = ResolvedSelection::new(12345)
            .with(Field::Quality, "high quality")
            .with(Field::Race, "human girl")
            .with(Field::Prefix, "1girl, solo")
            .with(Field::Shot, "full body");

        assert_eq!(
            selection.prompt(),
            "1girl, solo, human girl, full body, high quality"
        );
    }

    #[test]
    fn blank_values_are_not_stored() {
        let selection = ResolvedSelection::new(1)
            .with(Field::Race, "elf girl")
            .with(Field::Hair, "   ")
            .with_optional(Field::Palette, None::<String>);

        assert!(!selection.contains(Field::Hair));
        assert!(!selection.contains(Field::Palette));
        assert_eq!(selection.fields().count(), 1);
    }
}
