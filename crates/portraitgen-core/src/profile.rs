use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constraints::parse_shared_key;
use crate::error::Result;

/// Sentinel some pools use to mean "no entry".
pub const NONE_SENTINEL: &str = "none";

/// Attire used when a role defines no attire sets.
pub const DEFAULT_ATTIRE: &str = "refined role attire set";

/// One complete outfit for a role, with its alternate-register rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttireSet {
    pub name: String,
    pub normal: String,
    pub alternate: Option<String>,
}

impl AttireSet {
    pub fn new(name: &str, normal: &str, alternate: &str) -> Self {
        Self {
            name: name.to_string(),
            normal: normal.to_string(),
            alternate: Some(alternate.to_string()),
        }
    }

    pub fn fallback() -> Self {
        Self {
            name: "角色成套".to_string(),
            normal: DEFAULT_ATTIRE.to_string(),
            alternate: None,
        }
    }
}

/// Everything a role contributes to a prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleProfile {
    pub role: String,
    pub palettes: Vec<String>,
    pub attire_sets: Vec<AttireSet>,
    pub expressions: Vec<String>,
    pub poses: Vec<String>,
    pub bg_natural: Vec<String>,
    pub bg_building: Vec<String>,
    pub lighting: Vec<String>,
    pub atmosphere: Vec<String>,
}

/// Shared-library category a pool entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SharedCategory {
    Expressions,
    Poses,
    BgNatural,
    BgBuilding,
    Lighting,
    Atmosphere,
    Palettes,
}

impl SharedCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SharedCategory::Expressions => "expressions",
            SharedCategory::Poses => "poses",
            SharedCategory::BgNatural => "bg_natural",
            SharedCategory::BgBuilding => "bg_building",
            SharedCategory::Lighting => "lighting",
            SharedCategory::Atmosphere => "atmosphere",
            SharedCategory::Palettes => "palettes",
        }
    }
}

impl RoleProfile {
    pub fn new(role: &str, attire_sets: Vec<AttireSet>) -> Self {
        Self {
            role: role.to_string(),
            attire_sets,
            ..Self::default()
        }
    }

    fn pool_mut(&mut self, category: SharedCategory) -> &mut Vec<String> {
        match category {
            SharedCategory::Expressions => &mut self.expressions,
            SharedCategory::Poses => &mut self.poses,
            SharedCategory::BgNatural => &mut self.bg_natural,
            SharedCategory::BgBuilding => &mut self.bg_building,
            SharedCategory::Lighting => &mut self.lighting,
            SharedCategory::Atmosphere => &mut self.atmosphere,
            SharedCategory::Palettes => &mut self.palettes,
        }
    }

    /// Attire sets, or the single fallback set when none are defined.
    pub fn attire_sets_or_default(&self) -> Vec<AttireSet> {
        if self.attire_sets.is_empty() {
            vec![AttireSet::fallback()]
        } else {
            self.attire_sets.clone()
        }
    }
}

/// Fold shared-library entries (`"name-roleA/roleB" → descriptor`) into the
/// per-role pools of `profiles`. Roles without a profile are ignored.
pub fn fold_shared_library(
    profiles: &mut BTreeMap<String, RoleProfile>,
    library: &[(SharedCategory, &[(&str, &str)])],
) -> Result<()> {
    for (category, entries) in library {
        for (key, descriptor) in entries.iter() {
            let (_, roles) = parse_shared_key(key)?;
            for role in roles {
                if let Some(profile) = profiles.get_mut(&role) {
                    profile.pool_mut(*category).push(descriptor.to_string());
                }
            }
        }
    }
    Ok(())
}

/// Whole-field and phrase substitutions for the alternate register.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitutions {
    pub expressions: BTreeMap<String, String>,
    pub poses: BTreeMap<String, String>,
    pub lighting: BTreeMap<String, String>,
    pub atmosphere: BTreeMap<String, String>,
    /// Applied in order as substring replacements inside the attire block.
    pub attire_phrases: Vec<(String, String)>,
}

pub fn mapping(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_shared_entries_into_matching_roles() {
        let mut profiles = BTreeMap::new();
        profiles.insert("法师".to_string(), RoleProfile::new("法师", Vec::new()));
        profiles.insert("学者".to_string(), RoleProfile::new("学者", Vec::new()));

        let expressions: &[(&str, &str)] = &[("平静-法师/学者", "calm"), ("神秘-法师/盗贼", "mysterious")];
        fold_shared_library(&mut profiles, &[(SharedCategory::Expressions, expressions)])
            .expect("fold library");

        assert_eq!(profiles["法师"].expressions, vec!["calm", "mysterious"]);
        assert_eq!(profiles["学者"].expressions, vec!["calm"]);
    }

    #[test]
    fn empty_attire_sets_use_fallback() {
        let profile = RoleProfile::new("游侠", Vec::new());
        let sets = profile.attire_sets_or_default();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].normal, DEFAULT_ATTIRE);
    }
}
