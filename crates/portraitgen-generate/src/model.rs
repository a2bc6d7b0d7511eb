use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use portraitgen_core::unit::DEFAULT_UNIT_TYPE;

/// A row type with a fixed CSV header that can be submitted as a job.
pub trait OutputRow: Serialize + DeserializeOwned {
    const HEADER: &'static [&'static str];

    fn race(&self) -> &str;
    fn prompt(&self) -> &str;
    fn seed(&self) -> u32;
    /// Second half of the `{race}_{label}` image filename prefix.
    fn label(&self) -> Cow<'_, str>;
}

/// One traversal combination rendered as a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortraitRow {
    pub race: String,
    pub style: String,
    pub prompt: String,
    pub seed: u32,
}

impl OutputRow for PortraitRow {
    const HEADER: &'static [&'static str] = &["race", "style", "prompt", "seed"];

    fn race(&self) -> &str {
        &self.race
    }

    fn prompt(&self) -> &str {
        &self.prompt
    }

    fn seed(&self) -> u32 {
        self.seed
    }

    fn label(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.style)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePromptRow {
    pub race: String,
    pub identity: String,
    pub role: String,
    pub prompt: String,
    pub seed: u32,
    pub corrupted: bool,
}

impl OutputRow for RolePromptRow {
    const HEADER: &'static [&'static str] =
        &["race", "identity", "role", "prompt", "seed", "corrupted"];

    fn race(&self) -> &str {
        &self.race
    }

    fn prompt(&self) -> &str {
        &self.prompt
    }

    fn seed(&self) -> u32 {
        self.seed
    }

    fn label(&self) -> Cow<'_, str> {
        if self.corrupted {
            Cow::Owned(format!("{}_{}_corrupted", self.identity, self.role))
        } else {
            Cow::Owned(format!("{}_{}", self.identity, self.role))
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitRow {
    pub name: String,
    pub race: String,
    pub country: String,
    pub unit_type: String,
    pub level: String,
    pub avatar: String,
    pub attire_name: String,
    pub attire_set: String,
    pub expression: String,
    pub pose: String,
    pub background: String,
    pub lighting: String,
    pub atmosphere: String,
    pub shot: String,
    pub angle: String,
    pub composition: String,
    pub character_action: String,
    pub hair_length: String,
    pub hair_style: String,
    pub hair_color: String,
    pub eye_color: String,
    pub body_type: String,
    pub hair_accessory: String,
    pub hair_bangs: String,
    pub prompt: String,
    pub seed: u32,
}

impl OutputRow for UnitRow {
    const HEADER: &'static [&'static str] = &[
        "name",
        "race",
        "country",
        "unit_type",
        "level",
        "avatar",
        "attire_name",
        "attire_set",
        "expression",
        "pose",
        "background",
        "lighting",
        "atmosphere",
        "shot",
        "angle",
        "composition",
        "character_action",
        "hair_length",
        "hair_style",
        "hair_color",
        "eye_color",
        "body_type",
        "hair_accessory",
        "hair_bangs",
        "prompt",
        "seed",
    ];

    fn race(&self) -> &str {
        &self.race
    }

    fn prompt(&self) -> &str {
        &self.prompt
    }

    fn seed(&self) -> u32 {
        self.seed
    }

    fn label(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }
}

fn unknown() -> String {
    "Unknown".to_string()
}

fn default_unit_type() -> String {
    DEFAULT_UNIT_TYPE.to_string()
}

fn default_level() -> String {
    "1".to_string()
}

/// One row of the input unit table. Missing columns take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitRecord {
    #[serde(default = "unknown")]
    pub name: String,
    #[serde(default = "unknown")]
    pub race: String,
    #[serde(default = "unknown")]
    pub country: String,
    #[serde(default = "default_unit_type")]
    pub unit_type: String,
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub avatar: String,
}

impl UnitRecord {
    pub fn new(name: &str, race: &str, country: &str, unit_type: &str) -> Self {
        Self {
            name: name.to_string(),
            race: race.to_string(),
            country: country.to_string(),
            unit_type: unit_type.to_string(),
            level: default_level(),
            avatar: String::new(),
        }
    }

    /// Replace blank cells with the column defaults.
    pub fn normalized(mut self) -> Self {
        let fill = |value: &mut String, default: fn() -> String| {
            if value.trim().is_empty() {
                *value = default();
            } else {
                *value = value.trim().to_string();
            }
        };
        fill(&mut self.name, unknown);
        fill(&mut self.race, unknown);
        fill(&mut self.country, unknown);
        fill(&mut self.unit_type, default_unit_type);
        fill(&mut self.level, default_level);
        self
    }
}

/// Random role prompts drawn per identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleBatch {
    /// Only this identity; every identity when `None`.
    pub identity: Option<String>,
    /// Only this role; a uniform draw from the identity's roles when `None`.
    pub role: Option<String>,
    pub limit_per_identity: usize,
    pub include_alternate: bool,
}

impl Default for RoleBatch {
    fn default() -> Self {
        Self {
            identity: None,
            role: None,
            limit_per_identity: 5,
            include_alternate: true,
        }
    }
}

/// Case-insensitive unit selection. Unset filters match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitFilter {
    pub race: Option<String>,
    pub country: Option<String>,
    pub name: Option<String>,
}

impl UnitFilter {
    pub fn matches(&self, record: &UnitRecord) -> bool {
        let accepts = |filter: &Option<String>, value: &str| {
            filter
                .as_deref()
                .is_none_or(|filter| filter.trim().to_lowercase() == value.to_lowercase())
        };
        accepts(&self.race, &record.race)
            && accepts(&self.country, &record.country)
            && accepts(&self.name, &record.name)
    }
}

/// Structured per-entity issue recorded during a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchIssue {
    pub level: String,
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

impl BatchIssue {
    pub fn warning(code: &str, message: impl Into<String>, entity: Option<String>) -> Self {
        Self {
            level: "warning".to_string(),
            code: code.to_string(),
            message: message.into(),
            entity,
        }
    }
}

/// Outcome of one batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub run_id: String,
    pub flavor: String,
    pub run_seed: u64,
    /// Entities the batch set out to produce (combinations, draws, units).
    pub requested: u64,
    pub generated: u64,
    pub rows_written: u64,
    pub skipped: u64,
    pub degraded: u64,
    /// Units dropped by the excluded-race rule or the caller's filters.
    pub filtered: u64,
    pub truncated: bool,
    pub warnings_by_code: BTreeMap<String, u64>,
    pub issues: Vec<BatchIssue>,
}

impl BatchReport {
    pub fn new(run_id: String, flavor: &str, run_seed: u64) -> Self {
        Self {
            run_id,
            flavor: flavor.to_string(),
            run_seed,
            requested: 0,
            generated: 0,
            rows_written: 0,
            skipped: 0,
            degraded: 0,
            filtered: 0,
            truncated: false,
            warnings_by_code: BTreeMap::new(),
            issues: Vec::new(),
        }
    }

    pub fn record_issue(&mut self, issue: BatchIssue) {
        *self.warnings_by_code.entry(issue.code.clone()).or_insert(0) += 1;
        self.issues.push(issue);
    }

    pub fn record_skip(&mut self, issue: BatchIssue) {
        self.skipped += 1;
        self.record_issue(issue);
    }

    pub fn record_degraded(&mut self, entity: String) {
        self.degraded += 1;
        self.record_issue(BatchIssue::warning(
            "selection_degraded",
            "no compatible race/role pair, fallback used",
            Some(entity),
        ));
    }

    pub fn record_row(&mut self) {
        self.rows_written += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_record_blank_cells_take_defaults() {
        let record = UnitRecord {
            name: " 人类骑士 ".to_string(),
            race: "人类".to_string(),
            country: String::new(),
            unit_type: "  ".to_string(),
            level: String::new(),
            avatar: String::new(),
        }
        .normalized();

        assert_eq!(record.name, "人类骑士");
        assert_eq!(record.country, "Unknown");
        assert_eq!(record.unit_type, DEFAULT_UNIT_TYPE);
        assert_eq!(record.level, "1");
    }

    #[test]
    fn filters_ignore_case() {
        let record = UnitRecord::new("Scout", "人类", "人类国家", "physical");
        let filter = UnitFilter {
            name: Some("scout".to_string()),
            ..UnitFilter::default()
        };
        assert!(filter.matches(&record));
        assert!(!UnitFilter {
            country: Some("天界".to_string()),
            ..UnitFilter::default()
        }
        .matches(&record));
    }

    #[test]
    fn role_row_label_marks_variant() {
        let row = RolePromptRow {
            race: "人类".to_string(),
            identity: "贵族".to_string(),
            role: "骑士".to_string(),
            prompt: "p".to_string(),
            seed: 10_001,
            corrupted: true,
        };
        assert_eq!(row.label(), "贵族_骑士_corrupted");
    }
}
