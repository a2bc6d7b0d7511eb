use portraitgen_core::unit::HAIR_COLOR_PLACEHOLDER;
use portraitgen_core::{CharacterTemplate, UnitTemplate};

use crate::model::UnitRecord;
use crate::selection::{Field, ResolvedSelection};
use crate::selector::{AppearancePick, CharacterPick, UnitPick};

/// Join the non-blank parts with `", "`, in order. No reordering, no dedup.
pub fn assemble<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = Option<S>>,
    S: AsRef<str>,
{
    let kept: Vec<S> = parts
        .into_iter()
        .flatten()
        .filter(|part| !part.as_ref().trim().is_empty())
        .collect();
    kept.iter()
        .map(|part| part.as_ref())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Fill the `{hair_color}` placeholder of a race descriptor.
pub fn fill_race_text(text: &str, hue: Option<&str>) -> String {
    match hue {
        Some(hue) => text.replace(HAIR_COLOR_PLACEHOLDER, hue),
        None => text.replace(&format!("{HAIR_COLOR_PLACEHOLDER} "), ""),
    }
}

fn with_appearance(selection: ResolvedSelection, appearance: &AppearancePick) -> ResolvedSelection {
    selection
        .with(Field::HairColor, appearance.hair.color_segment())
        .with(Field::Hair, appearance.hair.style_segment())
        .with(Field::EyeColor, appearance.eye_segment())
        .with_optional(
            Field::Chest,
            appearance.chest.as_ref().map(|choice| choice.text.clone()),
        )
        .with(Field::Body, appearance.body.text.clone())
}

pub fn character_selection(template: &CharacterTemplate, pick: &CharacterPick) -> ResolvedSelection {
    let race = &pick.race_role.race;
    let race_text = template
        .race_text(race)
        .map(|text| fill_race_text(text, Some(pick.appearance.hair.hue())));
    let block = pick.attire.block();
    let palette = pick
        .attire
        .palette
        .clone()
        .filter(|palette| !block.contains(palette.as_str()));

    let selection = ResolvedSelection::new(pick.seed)
        .with(Field::Prefix, template.prefix.clone())
        .with_optional(Field::Race, race_text);

    with_appearance(selection, &pick.appearance)
        .with(Field::Attire, block)
        .with_alternate_attire(pick.attire.alternate_block())
        .with_optional(Field::Expression, pick.expression.clone())
        .with_optional(Field::Pose, pick.pose.clone())
        .with(Field::Scene, pick.scene.clone())
        .with_optional(Field::Lighting, pick.lighting.clone())
        .with_optional(Field::Atmosphere, pick.atmosphere.clone())
        .with_optional(Field::Palette, palette)
        .with_optional(Field::Shot, pick.camera.shot_text())
        .with_optional(Field::Angle, pick.camera.angle_text())
        .with_optional(Field::Composition, pick.camera.composition_text())
        .with(Field::Quality, template.quality.clone())
}

pub fn unit_selection(
    template: &UnitTemplate,
    record: &UnitRecord,
    pick: &UnitPick,
) -> ResolvedSelection {
    let hue = pick
        .appearance
        .as_ref()
        .map(|appearance| appearance.hair.hue());
    let race_text = fill_race_text(template.race_text(&record.race), hue);

    let mut selection = ResolvedSelection::new(pick.seed)
        .with(Field::Prefix, template.prefix.clone())
        .with(Field::Race, race_text);
    if let Some(appearance) = &pick.appearance {
        selection = with_appearance(selection, appearance);
    }

    selection
        .with(Field::Attire, pick.attire.clone())
        .with(Field::Expression, pick.expression.clone())
        .with(Field::Pose, pick.pose.clone())
        .with(Field::Scene, template.country_style(&record.country))
        .with(Field::Lighting, pick.lighting.clone())
        .with(Field::Atmosphere, pick.atmosphere.clone())
        .with_optional(Field::CharacterAction, pick.camera.action_text())
        .with_optional(Field::Shot, pick.camera.shot_text())
        .with_optional(Field::Angle, pick.camera.angle_text())
        .with_optional(Field::Composition, pick.camera.composition_text())
        .with(Field::Quality, template.quality.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assemble_skips_blank_parts() {
        let prompt = assemble([Some("a"), None, Some(""), Some("  "), Some("b, c"), Some("d")]);
        assert_eq!(prompt, "a, b, c, d");
    }

    #[test]
    fn assemble_keeps_duplicates_and_order() {
        assert_eq!(assemble([Some("x"), Some("y"), Some("x")]), "x, y, x");
    }

    #[test]
    fn race_placeholder_takes_the_hue() {
        let text = "fox girl, {hair_color} fox ears, {hair_color} fox tail";
        assert_eq!(
            fill_race_text(text, Some("silver")),
            "fox girl, silver fox ears, silver fox tail"
        );
        assert_eq!(fill_race_text(text, None), "fox girl, fox ears, fox tail");
    }
}
