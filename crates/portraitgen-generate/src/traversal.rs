//! Canonical enumeration of portrait combinations.
//!
//! Dimensions nest in the order race, hair length, hair style, hair colour,
//! eye colour, body, chest, role. Each dimension walks its table in
//! declaration order; roles walk the constraint relation of the current race.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use portraitgen_core::{CharacterTemplate, ChoiceTable};

use crate::errors::SelectionError;

/// How one traversal dimension is covered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Dimension {
    /// Always this key.
    Fixed(String),
    /// Every key, in declaration order.
    All,
    /// One draw per combination.
    Random,
}

impl Dimension {
    pub fn fixed(key: &str) -> Self {
        Dimension::Fixed(key.to_string())
    }

    pub fn fixed_key(&self) -> Option<&str> {
        match self {
            Dimension::Fixed(key) => Some(key),
            _ => None,
        }
    }
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "" => Err("dimension value cannot be empty".to_string()),
            "all" | "*" => Ok(Dimension::All),
            "random" | "?" => Ok(Dimension::Random),
            key => Ok(Dimension::Fixed(key.to_string())),
        }
    }
}

impl TryFrom<String> for Dimension {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Dimension> for String {
    fn from(value: Dimension) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Fixed(key) => write!(f, "{key}"),
            Dimension::All => write!(f, "all"),
            Dimension::Random => write!(f, "random"),
        }
    }
}

/// Portrait traversal configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortraitTraversal {
    pub race: Dimension,
    pub hair_length: Dimension,
    pub hair_style: Dimension,
    pub hair_color: Dimension,
    pub eye_color: Dimension,
    pub body: Dimension,
    pub chest: Dimension,
    pub role: Dimension,
    pub shot: Option<String>,
    pub angle: Option<String>,
    pub composition: Option<String>,
    pub include_alternate: bool,
    pub max_combinations: usize,
}

impl Default for PortraitTraversal {
    fn default() -> Self {
        Self {
            race: Dimension::fixed("人类"),
            hair_length: Dimension::fixed("长发"),
            hair_style: Dimension::fixed("双马尾"),
            hair_color: Dimension::fixed("银色"),
            eye_color: Dimension::fixed("蓝色"),
            body: Dimension::fixed("纤细"),
            chest: Dimension::fixed("中胸"),
            role: Dimension::All,
            shot: None,
            angle: None,
            composition: None,
            include_alternate: true,
            max_combinations: 50,
        }
    }
}

/// One enumerated combination. `None` marks a dimension drawn per entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Combination {
    pub race: Option<String>,
    pub hair_length: Option<String>,
    pub hair_style: Option<String>,
    pub hair_color: Option<String>,
    pub eye_color: Option<String>,
    pub body: Option<String>,
    pub chest: Option<String>,
    pub role: Option<String>,
}

/// Keys of one dimension after checking fixed keys against the table.
fn expand(
    dimension: &Dimension,
    keys: Vec<&str>,
    category: &str,
) -> Result<Vec<Option<String>>, SelectionError> {
    match dimension {
        Dimension::Fixed(key) => {
            if keys.contains(&key.as_str()) {
                Ok(vec![Some(key.clone())])
            } else {
                Err(SelectionError::unknown(category, key))
            }
        }
        Dimension::All if keys.is_empty() => Ok(vec![None]),
        Dimension::All => Ok(keys.into_iter().map(|key| Some(key.to_string())).collect()),
        Dimension::Random => Ok(vec![None]),
    }
}

fn table_keys(table: &ChoiceTable) -> Vec<&str> {
    table.keys().collect()
}

/// Fixed-key checked expansion of every dimension.
struct Plan {
    races: Vec<Option<String>>,
    lengths: Vec<Option<String>>,
    styles: Vec<Option<String>>,
    colors: Vec<Option<String>>,
    eyes: Vec<Option<String>>,
    bodies: Vec<Option<String>>,
    chests: Vec<Option<String>>,
}

impl PortraitTraversal {
    fn plan(&self, template: &CharacterTemplate) -> Result<Plan, SelectionError> {
        let appearance = &template.appearance;
        let plan = Plan {
            races: expand(&self.race, table_keys(&template.races), "race")?,
            lengths: expand(&self.hair_length, table_keys(&appearance.hair_length), "hair_length")?,
            styles: expand(&self.hair_style, table_keys(&appearance.hair_style), "hair_style")?,
            colors: expand(&self.hair_color, appearance.hair_color_keys().collect(), "hair_color")?,
            eyes: expand(&self.eye_color, table_keys(&appearance.eye_color), "eye_color")?,
            bodies: expand(&self.body, table_keys(&appearance.body), "body")?,
            chests: expand(&self.chest, table_keys(&appearance.chest), "chest")?,
        };
        if let Some(role) = self.role.fixed_key() {
            if !template.constraints.contains_role(role) {
                return Err(SelectionError::unknown("role", role));
            }
        }
        let camera = &template.camera;
        for (table, category, key) in [
            (&camera.shot, "shot", &self.shot),
            (&camera.angle, "angle", &self.angle),
            (&camera.composition, "composition", &self.composition),
        ] {
            if let Some(key) = key.as_deref() {
                if !table.contains(key) {
                    return Err(SelectionError::unknown(category, key));
                }
            }
        }
        if let (Some(length), Some(style)) = (self.hair_length.fixed_key(), self.hair_style.fixed_key()) {
            if !appearance.style_allowed(Some(length), style) {
                return Err(SelectionError::Conflict(format!(
                    "hair style '{style}' cannot be combined with '{length}'"
                )));
            }
        }
        Ok(plan)
    }

    fn roles_for(&self, template: &CharacterTemplate, race: Option<&str>) -> Vec<Option<String>> {
        match (&self.role, race) {
            (Dimension::Fixed(role), _) => vec![Some(role.clone())],
            (Dimension::Random, _) => vec![None],
            (Dimension::All, Some(race)) => template
                .constraints
                .roles_for(race)
                .into_iter()
                .map(|role| Some(role.to_string()))
                .collect(),
            (Dimension::All, None) => template
                .constraints
                .roles()
                .map(|role| Some(role.to_string()))
                .collect(),
        }
    }

    /// Styles valid for `length`, keeping the drawn-style marker.
    fn styles_for(
        template: &CharacterTemplate,
        styles: &[Option<String>],
        length: Option<&str>,
    ) -> Vec<Option<String>> {
        styles
            .iter()
            .filter(|style| match (length, style.as_deref()) {
                (Some(length), Some(style)) => template.appearance.style_allowed(Some(length), style),
                _ => true,
            })
            .cloned()
            .collect()
    }

    /// Exact number of valid combinations.
    pub fn count(&self, template: &CharacterTemplate) -> Result<u64, SelectionError> {
        let plan = self.plan(template)?;
        let per_style = (plan.colors.len() * plan.eyes.len() * plan.bodies.len() * plan.chests.len()) as u64;

        let mut total = 0_u64;
        for race in &plan.races {
            let roles = self.roles_for(template, race.as_deref()).len() as u64;
            for length in &plan.lengths {
                let styles = Self::styles_for(template, &plan.styles, length.as_deref()).len() as u64;
                total = total.saturating_add(styles.saturating_mul(per_style).saturating_mul(roles));
            }
        }
        Ok(total)
    }

    /// The first `limit` combinations in canonical order.
    pub fn enumerate(
        &self,
        template: &CharacterTemplate,
        limit: usize,
    ) -> Result<Vec<Combination>, SelectionError> {
        let plan = self.plan(template)?;
        let mut combinations = Vec::new();
        if limit == 0 {
            return Ok(combinations);
        }

        for race in &plan.races {
            let roles = self.roles_for(template, race.as_deref());
            for length in &plan.lengths {
                let styles = Self::styles_for(template, &plan.styles, length.as_deref());
                for style in &styles {
                    for color in &plan.colors {
                        for eye in &plan.eyes {
                            for body in &plan.bodies {
                                for chest in &plan.chests {
                                    for role in &roles {
                                        combinations.push(Combination {
                                            race: race.clone(),
                                            hair_length: length.clone(),
                                            hair_style: style.clone(),
                                            hair_color: color.clone(),
                                            eye_color: eye.clone(),
                                            body: body.clone(),
                                            chest: chest.clone(),
                                            role: role.clone(),
                                        });
                                        if combinations.len() >= limit {
                                            return Ok(combinations);
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
        Ok(combinations)
    }
}

#[cfg(test)]
mod tests {
    use portraitgen_core::SHORT_HAIR;

    use super::*;

    fn template() -> CharacterTemplate {
        CharacterTemplate::builtin().expect("character template")
    }

    #[test]
    fn default_traversal_enumerates_human_roles() {
        let template = template();
        let traversal = PortraitTraversal::default();
        let expected = template.constraints.roles_for("人类").len() as u64;

        assert_eq!(traversal.count(&template).expect("count"), expected);
        let combinations = traversal.enumerate(&template, 100).expect("enumerate");
        let roles: Vec<&str> = combinations
            .iter()
            .map(|combination| combination.role.as_deref().expect("role"))
            .collect();
        assert_eq!(roles, template.constraints.roles_for("人类"));
    }

    #[test]
    fn short_hair_drops_excluded_styles_from_the_count() {
        let template = template();
        let traversal = PortraitTraversal {
            hair_length: Dimension::All,
            hair_style: Dimension::All,
            role: Dimension::fixed("骑士"),
            ..PortraitTraversal::default()
        };
        let styles = template.appearance.hair_style.len() as u64;
        let excluded = template.appearance.short_hair_exclusions.len() as u64;
        let lengths = template.appearance.hair_length.len() as u64;

        assert_eq!(
            traversal.count(&template).expect("count"),
            lengths * styles - excluded
        );
        let combinations = traversal.enumerate(&template, usize::MAX).expect("enumerate");
        assert_eq!(combinations.len() as u64, lengths * styles - excluded);
        assert!(combinations.iter().all(|combination| {
            combination.hair_length.as_deref() != Some(SHORT_HAIR)
                || !template
                    .appearance
                    .short_hair_exclusions
                    .contains(combination.hair_style.as_deref().unwrap_or_default())
        }));
    }

    #[test]
    fn truncation_keeps_the_canonical_prefix() {
        let template = template();
        let traversal = PortraitTraversal {
            race: Dimension::All,
            eye_color: Dimension::All,
            ..PortraitTraversal::default()
        };
        let all = traversal.enumerate(&template, usize::MAX).expect("enumerate");
        let first = traversal.enumerate(&template, 10).expect("enumerate");
        assert_eq!(first.len(), 10);
        assert_eq!(first.as_slice(), &all[..10]);
        assert_eq!(all.len() as u64, traversal.count(&template).expect("count"));
        assert_eq!(all[0].race.as_deref(), Some("人类"));
    }

    #[test]
    fn fixed_short_with_excluded_style_is_a_conflict() {
        let template = template();
        let traversal = PortraitTraversal {
            hair_length: Dimension::fixed(SHORT_HAIR),
            ..PortraitTraversal::default()
        };
        let err = traversal.count(&template).expect_err("conflict");
        assert_eq!(err.code(), "conflict");
    }

    #[test]
    fn unknown_fixed_key_is_rejected() {
        let template = template();
        let traversal = PortraitTraversal {
            eye_color: Dimension::fixed("橙色"),
            ..PortraitTraversal::default()
        };
        assert_eq!(
            traversal.count(&template).expect_err("unknown"),
            SelectionError::unknown("eye_color", "橙色")
        );
    }

    #[test]
    fn unknown_camera_key_is_rejected() {
        let template = template();
        let traversal = PortraitTraversal {
            shot: Some("不存在".to_string()),
            ..PortraitTraversal::default()
        };
        assert_eq!(
            traversal.count(&template).expect_err("unknown shot"),
            SelectionError::unknown("shot", "不存在")
        );

        let known = template.camera.angle.keys().next().expect("angle").to_string();
        let traversal = PortraitTraversal {
            angle: Some(known),
            composition: Some("不存在".to_string()),
            ..PortraitTraversal::default()
        };
        assert_eq!(
            traversal.count(&template).expect_err("unknown composition"),
            SelectionError::unknown("composition", "不存在")
        );
    }

    #[test]
    fn dimension_parses_from_text() {
        assert_eq!("all".parse::<Dimension>(), Ok(Dimension::All));
        assert_eq!("random".parse::<Dimension>(), Ok(Dimension::Random));
        assert_eq!("精灵".parse::<Dimension>(), Ok(Dimension::fixed("精灵")));
        assert!("".parse::<Dimension>().is_err());
    }
}
