//! Constrained random selection of one entity's options.
//!
//! Every function draws from the injected `rng` only, so a seeded source
//! replays the same picks.

use rand::{Rng, RngCore};
use serde::Serialize;
use tracing::warn;

use portraitgen_core::profile::NONE_SENTINEL;
use portraitgen_core::{
    AppearanceTables, CameraTables, CharacterTemplate, Choice, ChoiceTable, ColorRendering,
    DEFAULT_ROLE, HairColor, RoleProfile, SHORT_HAIR, UnitTemplate,
};

use crate::assembler::assemble;
use crate::errors::SelectionError;
use crate::model::UnitRecord;

pub const STUDIO_BACKGROUND: &str = "studio background";
pub const SEED_MIN: u32 = 10_000;
pub const SEED_MAX: u32 = 99_999;

pub fn draw_seed(rng: &mut dyn RngCore) -> u32 {
    rng.random_range(SEED_MIN..=SEED_MAX)
}

fn pick<'a, T>(items: &'a [T], rng: &mut dyn RngCore) -> Option<&'a T> {
    if items.is_empty() {
        None
    } else {
        items.get(rng.random_range(0..items.len()))
    }
}

fn lookup(table: &ChoiceTable, category: &str, key: &str) -> Result<Choice, SelectionError> {
    table
        .get(key)
        .cloned()
        .ok_or_else(|| SelectionError::unknown(category, key))
}

/// Fixed key or uniform draw; `None` only for an empty optional table.
fn choose(
    table: &ChoiceTable,
    category: &str,
    fixed: Option<&str>,
    rng: &mut dyn RngCore,
) -> Result<Option<Choice>, SelectionError> {
    match fixed {
        Some(key) => lookup(table, category, key).map(Some),
        None => Ok(pick(&table.entries, rng).cloned()),
    }
}

fn choose_required(
    table: &ChoiceTable,
    category: &str,
    fixed: Option<&str>,
    rng: &mut dyn RngCore,
) -> Result<Choice, SelectionError> {
    choose(table, category, fixed, rng)?
        .ok_or_else(|| SelectionError::EmptyPool(category.to_string()))
}

fn pick_text(pool: &[String], rng: &mut dyn RngCore) -> Option<String> {
    pick(pool, rng).cloned()
}

fn pick_required(
    pool: &[String],
    name: &str,
    rng: &mut dyn RngCore,
) -> Result<String, SelectionError> {
    pick_text(pool, rng).ok_or_else(|| SelectionError::EmptyPool(name.to_string()))
}

/// Race and role of one character entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RaceRole {
    pub race: String,
    pub role: String,
    /// Set when the constraints left nothing to draw and the fallback was used.
    pub degraded: bool,
}

pub fn resolve_race_and_role(
    template: &CharacterTemplate,
    race: Option<&str>,
    role: Option<&str>,
    rng: &mut dyn RngCore,
) -> Result<RaceRole, SelectionError> {
    if let Some(race) = race {
        if !template.races.contains(race) {
            return Err(SelectionError::unknown("race", race));
        }
    }
    if let Some(role) = role {
        if !template.constraints.contains_role(role) {
            return Err(SelectionError::unknown("role", role));
        }
    }

    let constraints = &template.constraints;
    let resolved = |race: &str, role: &str| RaceRole {
        race: race.to_string(),
        role: role.to_string(),
        degraded: false,
    };

    match (race, role) {
        (Some(race), Some(role)) => {
            if constraints.allows(role, race) {
                Ok(resolved(race, role))
            } else {
                fallback_race_role(template, Some(race), Some(role))
            }
        }
        (Some(race), None) => match pick(&constraints.roles_for(race), rng) {
            Some(role) => Ok(resolved(race, *role)),
            None => fallback_race_role(template, Some(race), None),
        },
        (None, Some(role)) => {
            let races: Vec<&str> = template
                .races
                .keys()
                .filter(|race| constraints.allows(role, race))
                .collect();
            match pick(&races, rng) {
                Some(race) => Ok(resolved(*race, role)),
                None => fallback_race_role(template, None, Some(role)),
            }
        }
        (None, None) => {
            let races: Vec<&str> = template.races.keys().collect();
            let race = *pick(&races, rng).ok_or_else(|| SelectionError::EmptyPool("race".into()))?;
            match pick(&constraints.roles_for(race), rng) {
                Some(role) => Ok(resolved(race, *role)),
                None => fallback_race_role(template, Some(race), None),
            }
        }
    }
}

fn fallback_race_role(
    template: &CharacterTemplate,
    race: Option<&str>,
    requested_role: Option<&str>,
) -> Result<RaceRole, SelectionError> {
    let race = match race {
        Some(race) => race,
        None => template
            .races
            .keys()
            .next()
            .ok_or_else(|| SelectionError::EmptyPool("race".into()))?,
    };
    warn!(
        event = "selection_degraded",
        race = %race,
        requested_role = requested_role.unwrap_or("-"),
        fallback_role = DEFAULT_ROLE,
        "no compatible race/role pair, using fallback"
    );
    Ok(RaceRole {
        race: race.to_string(),
        role: DEFAULT_ROLE.to_string(),
        degraded: true,
    })
}

/// Fixed hair options; `None` fields are drawn.
#[derive(Debug, Clone, Copy, Default)]
pub struct HairRequest<'a> {
    pub length: Option<&'a str>,
    pub style: Option<&'a str>,
    pub color: Option<&'a str>,
    pub rendering: Option<ColorRendering>,
    pub bangs: Option<&'a str>,
    pub accessory: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HairPick {
    pub length: Option<Choice>,
    pub style: Choice,
    pub color: HairColor,
    pub rendering: ColorRendering,
    pub bangs: Option<Choice>,
    pub accessory: Option<String>,
}

impl HairPick {
    /// Solid hue text, used for race descriptor placeholders.
    pub fn hue(&self) -> &str {
        &self.color.solid
    }

    pub fn color_segment(&self) -> String {
        match (self.rendering, self.color.gradient.as_deref()) {
            (ColorRendering::Gradient, Some(gradient)) => gradient.to_string(),
            _ => format!("{} hair", self.color.solid),
        }
    }

    /// Length, style, bangs and accessory; empty descriptors are dropped.
    pub fn style_segment(&self) -> String {
        assemble([
            self.length.as_ref().map(|choice| choice.text.as_str()),
            Some(self.style.text.as_str()),
            self.bangs.as_ref().map(|choice| choice.text.as_str()),
            self.accessory.as_deref(),
        ])
    }
}

pub fn resolve_hair(
    tables: &AppearanceTables,
    request: &HairRequest<'_>,
    rng: &mut dyn RngCore,
) -> Result<HairPick, SelectionError> {
    let style_needs_length = request
        .style
        .is_some_and(|style| tables.short_hair_exclusions.contains(style));

    let length = match request.length {
        Some(key) => Some(lookup(&tables.hair_length, "hair_length", key)?),
        None if style_needs_length => {
            let lengths: Vec<&Choice> = tables
                .hair_length
                .entries
                .iter()
                .filter(|choice| choice.key != SHORT_HAIR)
                .collect();
            pick(&lengths, rng).map(|choice| (*choice).clone())
        }
        None => pick(&tables.hair_length.entries, rng).cloned(),
    };
    let length_key = length.as_ref().map(|choice| choice.key.as_str());

    let style = match request.style {
        Some(key) => {
            let style = lookup(&tables.hair_style, "hair_style", key)?;
            if !tables.style_allowed(length_key, key) {
                return Err(SelectionError::Conflict(format!(
                    "hair style '{key}' cannot be combined with '{SHORT_HAIR}'"
                )));
            }
            style
        }
        None => {
            let styles = tables.styles_for_length(length_key);
            let key = pick(&styles, rng).ok_or_else(|| SelectionError::EmptyPool("hair_style".into()))?;
            lookup(&tables.hair_style, "hair_style", key)?
        }
    };

    let (color, rendering) = match request.color {
        Some(key) => {
            let color = tables
                .hair_color(key)
                .cloned()
                .ok_or_else(|| SelectionError::unknown("hair_color", key))?;
            (color, request.rendering.unwrap_or(ColorRendering::Solid))
        }
        None => {
            let color = pick(&tables.hair_color, rng)
                .cloned()
                .ok_or_else(|| SelectionError::EmptyPool("hair_color".into()))?;
            let rendering = match request.rendering {
                Some(rendering) => rendering,
                None if color.gradient.is_some() && rng.random_bool(0.5) => {
                    ColorRendering::Gradient
                }
                None => ColorRendering::Solid,
            };
            (color, rendering)
        }
    };

    let bangs = choose(&tables.hair_bangs, "hair_bangs", request.bangs, rng)?;

    let accessory = match request.accessory {
        Some(accessory) => {
            if !tables.hair_accessories.iter().any(|item| item == accessory) {
                return Err(SelectionError::unknown("hair_accessory", accessory));
            }
            Some(accessory.to_string())
        }
        None => pick_text(&tables.hair_accessories, rng),
    };

    Ok(HairPick {
        length,
        style,
        color,
        rendering,
        bangs,
        accessory,
    })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AppearanceRequest<'a> {
    pub hair: HairRequest<'a>,
    pub eye_color: Option<&'a str>,
    pub chest: Option<&'a str>,
    pub body: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppearancePick {
    pub hair: HairPick,
    pub eye: Choice,
    pub chest: Option<Choice>,
    pub body: Choice,
}

impl AppearancePick {
    pub fn eye_segment(&self) -> String {
        format!("{} eyes", self.eye.text)
    }
}

pub fn resolve_appearance(
    tables: &AppearanceTables,
    request: &AppearanceRequest<'_>,
    rng: &mut dyn RngCore,
) -> Result<AppearancePick, SelectionError> {
    let hair = resolve_hair(tables, &request.hair, rng)?;
    let eye = choose_required(&tables.eye_color, "eye_color", request.eye_color, rng)?;
    let chest = choose(&tables.chest, "chest", request.chest, rng)?;
    let body = choose_required(&tables.body, "body", request.body, rng)?;
    Ok(AppearancePick {
        hair,
        eye,
        chest,
        body,
    })
}

/// One palette and one attire set of a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttirePick {
    pub set_name: String,
    pub palette: Option<String>,
    pub attire: String,
    pub alternate: Option<String>,
}

impl AttirePick {
    /// `"{palette}, {attire}"`, or whichever of the two is present.
    pub fn block(&self) -> String {
        assemble([self.palette.as_deref(), Some(self.attire.as_str())])
    }

    pub fn alternate_block(&self) -> Option<String> {
        self.alternate
            .as_deref()
            .map(|alternate| assemble([self.palette.as_deref(), Some(alternate)]))
    }
}

pub fn resolve_attire(profile: &RoleProfile, rng: &mut dyn RngCore) -> AttirePick {
    let palette = pick_text(&profile.palettes, rng);
    let sets = profile.attire_sets_or_default();
    let index = rng.random_range(0..sets.len());
    let set = sets[index].clone();
    AttirePick {
        set_name: set.name,
        palette,
        attire: set.normal,
        alternate: set.alternate,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneKind {
    Natural,
    Building,
    Studio,
}

fn usable_backgrounds(pool: &[String]) -> Vec<&String> {
    pool.iter()
        .filter(|entry| entry.as_str() != NONE_SENTINEL && !entry.trim().is_empty())
        .collect()
}

/// Natural or building background with equal odds, studio as last resort.
pub fn resolve_scene(profile: &RoleProfile, rng: &mut dyn RngCore) -> (String, SceneKind) {
    let natural = usable_backgrounds(&profile.bg_natural);
    let building = usable_backgrounds(&profile.bg_building);

    if rng.random_bool(0.5) {
        if let Some(background) = pick(&natural, rng) {
            return (background.to_string(), SceneKind::Natural);
        }
    }
    match pick(&building, rng) {
        Some(background) => (background.to_string(), SceneKind::Building),
        None => (STUDIO_BACKGROUND.to_string(), SceneKind::Studio),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CameraRequest<'a> {
    pub shot: Option<&'a str>,
    pub angle: Option<&'a str>,
    pub composition: Option<&'a str>,
    pub character_action: Option<&'a str>,
}

/// Camera framing, drawn once per entity and shared by both variants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CameraPick {
    pub shot: Option<Choice>,
    pub angle: Option<Choice>,
    pub composition: Option<Choice>,
    pub character_action: Option<Choice>,
}

impl CameraPick {
    pub fn shot_text(&self) -> Option<&str> {
        self.shot.as_ref().map(|choice| choice.text.as_str())
    }

    pub fn angle_text(&self) -> Option<&str> {
        self.angle.as_ref().map(|choice| choice.text.as_str())
    }

    pub fn composition_text(&self) -> Option<&str> {
        self.composition.as_ref().map(|choice| choice.text.as_str())
    }

    pub fn action_text(&self) -> Option<&str> {
        self.character_action
            .as_ref()
            .map(|choice| choice.text.as_str())
    }
}

pub fn resolve_camera(
    tables: &CameraTables,
    request: &CameraRequest<'_>,
    rng: &mut dyn RngCore,
) -> Result<CameraPick, SelectionError> {
    Ok(CameraPick {
        shot: choose(&tables.shot, "shot", request.shot, rng)?,
        angle: choose(&tables.angle, "angle", request.angle, rng)?,
        composition: choose(&tables.composition, "composition", request.composition, rng)?,
        character_action: choose(
            &tables.character_action,
            "character_action",
            request.character_action,
            rng,
        )?,
    })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CharacterRequest<'a> {
    pub race: Option<&'a str>,
    pub role: Option<&'a str>,
    pub appearance: AppearanceRequest<'a>,
    pub camera: CameraRequest<'a>,
}

/// Everything drawn for one character entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CharacterPick {
    pub race_role: RaceRole,
    pub appearance: AppearancePick,
    pub attire: AttirePick,
    pub expression: Option<String>,
    pub pose: Option<String>,
    pub scene: String,
    pub scene_kind: SceneKind,
    pub lighting: Option<String>,
    pub atmosphere: Option<String>,
    pub camera: CameraPick,
    pub seed: u32,
}

pub fn resolve_character(
    template: &CharacterTemplate,
    request: &CharacterRequest<'_>,
    rng: &mut dyn RngCore,
) -> Result<CharacterPick, SelectionError> {
    let race_role = resolve_race_and_role(template, request.race, request.role, rng)?;
    let appearance = resolve_appearance(&template.appearance, &request.appearance, rng)?;
    let profile = template
        .profile(&race_role.role)
        .ok_or_else(|| SelectionError::EmptyPool(format!("profile for role '{}'", race_role.role)))?;

    let attire = resolve_attire(profile, rng);
    let expression = pick_text(&profile.expressions, rng);
    let pose = pick_text(&profile.poses, rng);
    let (scene, scene_kind) = resolve_scene(profile, rng);
    let lighting = pick_text(&profile.lighting, rng);
    let atmosphere = pick_text(&profile.atmosphere, rng);
    let camera = resolve_camera(&template.camera, &request.camera, rng)?;
    let seed = draw_seed(rng);

    Ok(CharacterPick {
        race_role,
        appearance,
        attire,
        expression,
        pose,
        scene,
        scene_kind,
        lighting,
        atmosphere,
        camera,
        seed,
    })
}

/// Everything drawn for one unit. `appearance` is `None` for suppressed races.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitPick {
    pub appearance: Option<AppearancePick>,
    pub attire: String,
    pub expression: String,
    pub pose: String,
    pub lighting: String,
    pub atmosphere: String,
    pub camera: CameraPick,
    pub seed: u32,
}

pub fn resolve_unit(
    template: &UnitTemplate,
    record: &UnitRecord,
    rng: &mut dyn RngCore,
) -> Result<UnitPick, SelectionError> {
    let pools = template
        .unit_type(&record.unit_type)
        .ok_or_else(|| SelectionError::EmptyPool(format!("unit type '{}'", record.unit_type)))?;

    let appearance = if template.suppresses_appearance(&record.race) {
        None
    } else {
        Some(resolve_appearance(
            &template.appearance,
            &AppearanceRequest::default(),
            rng,
        )?)
    };

    let attire = template
        .attire_for(&record.name, &record.race, &record.unit_type)
        .into_owned();
    let expression = pick_required(&pools.expressions, "expressions", rng)?;
    let pose = pick_required(&pools.poses, "poses", rng)?;
    let lighting = pick_required(&pools.lighting, "lighting", rng)?;
    let atmosphere = pick_required(&pools.atmosphere, "atmosphere", rng)?;
    let camera = resolve_camera(&template.camera, &CameraRequest::default(), rng)?;
    let seed = draw_seed(rng);

    Ok(UnitPick {
        appearance,
        attire,
        expression,
        pose,
        lighting,
        atmosphere,
        camera,
        seed,
    })
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn template() -> CharacterTemplate {
        CharacterTemplate::builtin().expect("character template")
    }

    #[test]
    fn fixed_race_limits_roles() {
        let template = template();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..50 {
            let pick = resolve_race_and_role(&template, Some("精灵"), None, &mut rng)
                .expect("resolve");
            assert_eq!(pick.race, "精灵");
            assert!(template.constraints.allows(&pick.role, "精灵"));
            assert!(!pick.degraded);
        }
    }

    #[test]
    fn fixed_role_limits_races() {
        let template = template();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..50 {
            let pick = resolve_race_and_role(&template, None, Some("德鲁伊"), &mut rng)
                .expect("resolve");
            assert_eq!(pick.race, "精灵");
        }
    }

    #[test]
    fn incompatible_pair_degrades_to_fallback() {
        let template = template();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let pick = resolve_race_and_role(&template, Some("狐族"), Some("德鲁伊"), &mut rng)
            .expect("resolve");
        assert_eq!(pick.race, "狐族");
        assert_eq!(pick.role, DEFAULT_ROLE);
        assert!(pick.degraded);
    }

    #[test]
    fn unknown_keys_are_errors() {
        let template = template();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let err = resolve_race_and_role(&template, Some("矮人"), None, &mut rng)
            .expect_err("unknown race");
        assert_eq!(err, SelectionError::unknown("race", "矮人"));
    }

    #[test]
    fn fixed_excluded_style_with_short_hair_conflicts() {
        let template = template();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let request = HairRequest {
            length: Some(SHORT_HAIR),
            style: Some("双马尾"),
            ..HairRequest::default()
        };
        let err = resolve_hair(&template.appearance, &request, &mut rng).expect_err("conflict");
        assert_eq!(err.code(), "conflict");
    }

    #[test]
    fn fixed_excluded_style_never_draws_short_length() {
        let template = template();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let request = HairRequest {
            style: Some("包子头"),
            ..HairRequest::default()
        };
        for _ in 0..100 {
            let hair = resolve_hair(&template.appearance, &request, &mut rng).expect("resolve");
            assert_ne!(hair.length.expect("length").key, SHORT_HAIR);
        }
    }

    #[test]
    fn free_hue_with_gradient_uses_both_renderings() {
        let unit = UnitTemplate::builtin().expect("unit template");
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let mut seen_solid = false;
        let mut seen_gradient = false;
        for _ in 0..200 {
            let hair = resolve_hair(&unit.appearance, &HairRequest::default(), &mut rng)
                .expect("resolve");
            match hair.rendering {
                ColorRendering::Solid => {
                    seen_solid = true;
                    assert!(hair.color_segment().ends_with(" hair"));
                }
                ColorRendering::Gradient => {
                    seen_gradient = true;
                    assert!(hair.color_segment().contains("gradient"));
                }
            }
        }
        assert!(seen_solid && seen_gradient);
    }

    #[test]
    fn fixed_hue_defaults_to_solid() {
        let unit = UnitTemplate::builtin().expect("unit template");
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let request = HairRequest {
            color: Some("银色"),
            ..HairRequest::default()
        };
        let hair = resolve_hair(&unit.appearance, &request, &mut rng).expect("resolve");
        assert_eq!(hair.rendering, ColorRendering::Solid);
        assert_eq!(hair.color_segment(), "silver hair");
    }

    #[test]
    fn empty_bangs_emit_nothing() {
        let unit = UnitTemplate::builtin().expect("unit template");
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let request = HairRequest {
            length: Some("长发"),
            style: Some("直发"),
            bangs: Some("无刘海"),
            accessory: Some("ribbon"),
            ..HairRequest::default()
        };
        let hair = resolve_hair(&unit.appearance, &request, &mut rng).expect("resolve");
        assert_eq!(hair.style_segment(), "long hair, straight hair, ribbon");
    }

    #[test]
    fn scene_falls_back_to_studio() {
        let mut profile = RoleProfile::new("测试", Vec::new());
        profile.bg_natural = vec![NONE_SENTINEL.to_string()];
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        for _ in 0..20 {
            let (scene, kind) = resolve_scene(&profile, &mut rng);
            assert_eq!(scene, STUDIO_BACKGROUND);
            assert_eq!(kind, SceneKind::Studio);
        }
    }

    #[test]
    fn attire_block_joins_palette_and_set() {
        let template = template();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let profile = template.profile("法师").expect("profile");
        let attire = resolve_attire(profile, &mut rng);
        let palette = attire.palette.clone().expect("mage has palettes");
        assert_eq!(attire.block(), format!("{palette}, {}", attire.attire));
        let alternate = attire.alternate_block().expect("alternate block");
        assert!(alternate.starts_with(&palette));
    }

    #[test]
    fn seeds_stay_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        for _ in 0..1000 {
            let seed = draw_seed(&mut rng);
            assert!((SEED_MIN..=SEED_MAX).contains(&seed));
        }
    }
}
