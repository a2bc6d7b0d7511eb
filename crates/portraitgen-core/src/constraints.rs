//! Typed role/race constraint relation.
//!
//! The source tables encode constraints as `"role-raceA/raceB"` strings
//! (and shared-library keys as `"name-roleA/roleB"`). They are parsed exactly
//! once, here, when a template is built; lookups never touch the encoded form.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TemplateError};

/// Role used when a constraint or profile lookup comes up empty.
pub const DEFAULT_ROLE: &str = "战士";

/// Split an encoded `"head-a/b/c"` entry into its head and member list.
fn split_encoded(entry: &str) -> Result<(String, Vec<String>)> {
    let malformed = |reason: &str| TemplateError::MalformedEntry {
        entry: entry.to_string(),
        reason: reason.to_string(),
    };

    let (head, tail) = entry
        .split_once('-')
        .ok_or_else(|| malformed("missing '-' separator"))?;
    let head = head.trim();
    if head.is_empty() {
        return Err(malformed("empty name before '-'"));
    }

    let members: Vec<String> = tail.split('/').map(|item| item.trim().to_string()).collect();
    if members.iter().any(|member| member.is_empty()) {
        return Err(malformed("empty member in '/' list"));
    }
    if members.iter().any(|member| member.contains('-')) {
        return Err(malformed("more than one '-' separator"));
    }

    Ok((head.to_string(), members))
}

/// Parse a `"role-raceA/raceB"` entry.
pub fn parse_role_entry(entry: &str) -> Result<RoleEntry> {
    let (role, races) = split_encoded(entry)?;
    Ok(RoleEntry { role, races })
}

/// Parse a shared-library key `"name-roleA/roleB"` into its name and roles.
pub fn parse_shared_key(key: &str) -> Result<(String, Vec<String>)> {
    split_encoded(key)
}

/// A role together with the races allowed to take it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleEntry {
    pub role: String,
    pub races: Vec<String>,
}

/// Identity grouping (noble, commoner, ...). Identities never reach the prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub roles: Vec<RoleEntry>,
}

impl Identity {
    pub fn role_names(&self) -> impl Iterator<Item = &str> {
        self.roles.iter().map(|entry| entry.role.as_str())
    }
}

/// Role ⇄ race relation grouped by identity, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleConstraints {
    identities: Vec<Identity>,
}

impl RoleConstraints {
    pub fn from_encoded(groups: &[(&str, &[&str])]) -> Result<Self> {
        let mut identities = Vec::with_capacity(groups.len());
        for (name, entries) in groups {
            let roles = entries
                .iter()
                .map(|entry| parse_role_entry(entry))
                .collect::<Result<Vec<_>>>()?;
            identities.push(Identity {
                name: name.to_string(),
                roles,
            });
        }
        Ok(Self { identities })
    }

    pub fn identities(&self) -> &[Identity] {
        &self.identities
    }

    pub fn identity(&self, name: &str) -> Option<&Identity> {
        self.identities.iter().find(|identity| identity.name == name)
    }

    /// Roles grouped under `identity`, or `None` for an unknown identity.
    pub fn roles_in(&self, identity: &str) -> Option<Vec<&str>> {
        self.identity(identity)
            .map(|identity| identity.role_names().collect())
    }

    fn entries(&self) -> impl Iterator<Item = (&Identity, &RoleEntry)> {
        self.identities
            .iter()
            .flat_map(|identity| identity.roles.iter().map(move |entry| (identity, entry)))
    }

    /// All roles in declaration order.
    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.entries().map(|(_, entry)| entry.role.as_str())
    }

    pub fn contains_role(&self, role: &str) -> bool {
        self.races_for(role).is_some()
    }

    /// Races allowed for `role`, or `None` for an unknown role.
    pub fn races_for(&self, role: &str) -> Option<&[String]> {
        self.entries()
            .find(|(_, entry)| entry.role == role)
            .map(|(_, entry)| entry.races.as_slice())
    }

    pub fn allows(&self, role: &str, race: &str) -> bool {
        self.races_for(role)
            .is_some_and(|races| races.iter().any(|allowed| allowed == race))
    }

    /// Roles whose constraint set includes `race`, in declaration order.
    pub fn roles_for(&self, race: &str) -> Vec<&str> {
        self.entries()
            .filter(|(_, entry)| entry.races.iter().any(|allowed| allowed == race))
            .map(|(_, entry)| entry.role.as_str())
            .collect()
    }

    pub fn identity_of(&self, role: &str) -> Option<&str> {
        self.entries()
            .find(|(_, entry)| entry.role == role)
            .map(|(identity, _)| identity.name.as_str())
    }

    pub(crate) fn duplicate_roles(&self) -> Vec<&str> {
        let mut seen = std::collections::BTreeSet::new();
        self.roles().filter(|role| !seen.insert(*role)).collect()
    }
}
