use std::collections::BTreeMap;

use portraitgen_core::Substitutions;

use crate::selection::{Field, ResolvedSelection};

fn map_whole(value: &str, mapping: &BTreeMap<String, String>) -> String {
    mapping
        .get(value)
        .cloned()
        .unwrap_or_else(|| value.to_string())
}

/// Alternate-register rendering of `selection`.
///
/// The attire block switches to the set's alternate block (when there is
/// one) and then goes through the phrase table; expression, pose, lighting
/// and atmosphere are mapped whole-field. Everything else is copied as is,
/// and the seed moves to `seed + 1`.
pub fn corrupt(selection: &ResolvedSelection, substitutions: &Substitutions) -> ResolvedSelection {
    let mut variant = selection
        .clone()
        .with_seed(selection.seed().wrapping_add(1));

    let attire = selection
        .alternate_attire()
        .or_else(|| selection.get(Field::Attire));
    if let Some(attire) = attire {
        let mut text = attire.to_string();
        for (from, to) in &substitutions.attire_phrases {
            text = text.replace(from.as_str(), to);
        }
        variant.insert(Field::Attire, text);
    }

    for (field, mapping) in [
        (Field::Expression, &substitutions.expressions),
        (Field::Pose, &substitutions.poses),
        (Field::Lighting, &substitutions.lighting),
        (Field::Atmosphere, &substitutions.atmosphere),
    ] {
        if let Some(value) = selection.get(field) {
            variant.insert(field, map_whole(value, mapping));
        }
    }

    variant
}

#[cfg(test)]
mod tests {
    use portraitgen_core::profile::mapping;

    use super::*;

    fn substitutions() -> Substitutions {
        Substitutions {
            expressions: mapping(&[("calm", "cold detachment")]),
            poses: mapping(&[("standing", "looming stance")]),
            lighting: mapping(&[("moonlight", "blood moonlight")]),
            atmosphere: BTreeMap::new(),
            attire_phrases: vec![(
                "silver-blue color scheme".to_string(),
                "ashen blue color scheme".to_string(),
            )],
        }
    }

    fn selection() -> ResolvedSelection {
        ResolvedSelection::new(50_000)
            .with(Field::Race, "elf girl")
            .with(Field::HairColor, "silver hair")
            .with(Field::Attire, "silver-blue color scheme, luxurious robes")
            .with_alternate_attire(Some("silver-blue color scheme, tattered black robes".into()))
            .with(Field::Expression, "calm")
            .with(Field::Pose, "casting")
            .with(Field::Lighting, "moonlight")
            .with(Field::Atmosphere, "mystical")
            .with(Field::Shot, "full body")
    }

    #[test]
    fn swaps_attire_then_replaces_phrases() {
        let variant = corrupt(&selection(), &substitutions());
        assert_eq!(
            variant.get(Field::Attire),
            Some("ashen blue color scheme, tattered black robes")
        );
    }

    #[test]
    fn maps_whole_fields_and_keeps_the_rest() {
        let original = selection();
        let variant = corrupt(&original, &substitutions());

        assert_eq!(variant.get(Field::Expression), Some("cold detachment"));
        assert_eq!(variant.get(Field::Lighting), Some("blood moonlight"));
        assert_eq!(variant.get(Field::Pose), Some("casting"));
        assert_eq!(variant.get(Field::Atmosphere), Some("mystical"));
        for field in [Field::Race, Field::HairColor, Field::Shot] {
            assert_eq!(variant.get(field), original.get(field));
        }
        assert_eq!(variant.seed(), original.seed() + 1);
    }

    #[test]
    fn phrase_table_applies_without_alternate_block() {
        let selection = ResolvedSelection::new(10_000)
            .with(Field::Attire, "silver-blue color scheme, refined role attire set");
        let variant = corrupt(&selection, &substitutions());
        assert_eq!(
            variant.get(Field::Attire),
            Some("ashen blue color scheme, refined role attire set")
        );
    }
}
