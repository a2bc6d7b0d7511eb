use std::time::Instant;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use portraitgen_core::{CharacterTemplate, UnitTemplate};

use crate::assembler::{character_selection, unit_selection};
use crate::errors::{GenerationError, SelectionError};
use crate::model::{
    BatchIssue, BatchReport, PortraitRow, RoleBatch, RolePromptRow, UnitFilter, UnitRecord, UnitRow,
};
use crate::output::RowSink;
use crate::selection::ResolvedSelection;
use crate::selector::{
    AppearanceRequest, CameraRequest, CharacterPick, CharacterRequest, HairRequest, UnitPick,
    resolve_character, resolve_unit,
};
use crate::traversal::{Combination, PortraitTraversal};
use crate::variant::corrupt;

pub const CORRUPTED_SUFFIX: &str = "_corrupted";

/// Options shared by every batch of one engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineOptions {
    /// Run seed. A fresh one is drawn when unset and recorded in the report.
    pub seed: Option<u64>,
}

/// Drives batches of entities through selection, assembly and a row sink.
///
/// Every entity gets its own `ChaCha8Rng` derived from the run seed, the
/// batch flavor and the entity index, so one entity's draws never shift
/// another's and a fixed run seed replays the whole batch.
#[derive(Debug, Clone)]
pub struct PromptEngine {
    run_id: String,
    seed: u64,
}

impl PromptEngine {
    pub fn new(options: EngineOptions) -> Self {
        let seed = options.seed.unwrap_or_else(|| rand::rng().random());
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            seed,
        }
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn entity_rng(&self, flavor: &str, index: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(hash_entity_seed(hash_seed(self.seed, flavor), index))
    }

    /// Enumerate `traversal` and write one row per combination, plus the
    /// alternate-register row when enabled.
    pub fn portraits<S: RowSink<PortraitRow>>(
        &self,
        template: &CharacterTemplate,
        traversal: &PortraitTraversal,
        sink: &mut S,
    ) -> Result<BatchReport, GenerationError> {
        let start = Instant::now();
        let mut report = BatchReport::new(self.run_id.clone(), "portraits", self.seed);

        let total = traversal.count(template)?;
        report.requested = total;
        if total > traversal.max_combinations as u64 {
            report.truncated = true;
            warn!(
                run_id = %self.run_id,
                total,
                limit = traversal.max_combinations,
                "traversal truncated"
            );
        }
        let combinations = traversal.enumerate(template, traversal.max_combinations)?;
        info!(
            run_id = %self.run_id,
            seed = self.seed,
            combinations = combinations.len(),
            "portrait batch started"
        );

        for (index, combination) in combinations.iter().enumerate() {
            let mut rng = self.entity_rng("portraits", index as u64);
            let request = combination_request(combination, traversal);
            let entity = format!("combination {index}");
            let pick = match resolve_character(template, &request, &mut rng) {
                Ok(pick) => pick,
                Err(err) => {
                    skip(&mut report, &err, entity);
                    continue;
                }
            };
            if pick.race_role.degraded {
                report.record_degraded(entity);
            }

            let selection = character_selection(template, &pick);
            let style = portrait_style(&pick);
            let race = pick.race_role.race.clone();
            write(
                sink,
                &mut report,
                PortraitRow {
                    race: race.clone(),
                    style: style.clone(),
                    prompt: selection.prompt(),
                    seed: selection.seed(),
                },
            )?;
            if traversal.include_alternate {
                let variant = corrupt(&selection, &template.substitutions);
                write(
                    sink,
                    &mut report,
                    PortraitRow {
                        race,
                        style: format!("{style}{CORRUPTED_SUFFIX}"),
                        prompt: variant.prompt(),
                        seed: variant.seed(),
                    },
                )?;
            }
            report.generated += 1;
        }

        finish(&report, start);
        Ok(report)
    }

    /// Draw `limit_per_identity` random role prompts for each selected identity.
    pub fn roles<S: RowSink<RolePromptRow>>(
        &self,
        template: &CharacterTemplate,
        batch: &RoleBatch,
        sink: &mut S,
    ) -> Result<BatchReport, GenerationError> {
        let start = Instant::now();
        let mut report = BatchReport::new(self.run_id.clone(), "roles", self.seed);
        let constraints = &template.constraints;

        let owner = match batch.role.as_deref() {
            Some(role) => {
                let owner = constraints
                    .identity_of(role)
                    .ok_or_else(|| SelectionError::unknown("role", role))?;
                Some((role, owner))
            }
            None => None,
        };
        let identities: Vec<&str> = match (batch.identity.as_deref(), owner) {
            (Some(name), owner) => {
                let identity = constraints
                    .identity(name)
                    .ok_or_else(|| SelectionError::unknown("identity", name))?;
                if let Some((role, owner)) = owner.filter(|(_, owner)| *owner != identity.name) {
                    return Err(SelectionError::Conflict(format!(
                        "role '{role}' belongs to identity '{owner}', not '{name}'"
                    ))
                    .into());
                }
                vec![identity.name.as_str()]
            }
            (None, Some((_, owner))) => vec![owner],
            (None, None) => constraints
                .identities()
                .iter()
                .map(|identity| identity.name.as_str())
                .collect(),
        };
        info!(
            run_id = %self.run_id,
            seed = self.seed,
            identities = identities.len(),
            per_identity = batch.limit_per_identity,
            "role batch started"
        );

        let mut index = 0_u64;
        for identity in identities {
            let roles = constraints.roles_in(identity).unwrap_or_default();
            for _ in 0..batch.limit_per_identity {
                let mut rng = self.entity_rng("roles", index);
                let entity = format!("{identity} #{index}");
                index += 1;
                report.requested += 1;

                let role = match batch.role.as_deref() {
                    Some(role) => role,
                    None if roles.is_empty() => {
                        let err = SelectionError::EmptyPool(format!("roles of identity '{identity}'"));
                        skip(&mut report, &err, entity);
                        continue;
                    }
                    None => roles[rng.random_range(0..roles.len())],
                };
                let request = CharacterRequest {
                    role: Some(role),
                    ..CharacterRequest::default()
                };
                let pick = match resolve_character(template, &request, &mut rng) {
                    Ok(pick) => pick,
                    Err(err) => {
                        skip(&mut report, &err, entity);
                        continue;
                    }
                };
                if pick.race_role.degraded {
                    report.record_degraded(entity);
                }

                let selection = character_selection(template, &pick);
                let row = |selection: &ResolvedSelection, corrupted: bool| RolePromptRow {
                    race: pick.race_role.race.clone(),
                    identity: identity.to_string(),
                    role: pick.race_role.role.clone(),
                    prompt: selection.prompt(),
                    seed: selection.seed(),
                    corrupted,
                };
                write(sink, &mut report, row(&selection, false))?;
                if batch.include_alternate {
                    let variant = corrupt(&selection, &template.substitutions);
                    write(sink, &mut report, row(&variant, true))?;
                }
                report.generated += 1;
            }
        }

        finish(&report, start);
        Ok(report)
    }

    /// One row per unit record that survives the excluded-race rule and `filter`.
    pub fn units<S: RowSink<UnitRow>>(
        &self,
        template: &UnitTemplate,
        records: Vec<UnitRecord>,
        filter: &UnitFilter,
        sink: &mut S,
    ) -> Result<BatchReport, GenerationError> {
        let start = Instant::now();
        let mut report = BatchReport::new(self.run_id.clone(), "units", self.seed);

        let loaded = records.len();
        let mut kept = Vec::with_capacity(loaded);
        for record in records {
            let record = record.normalized();
            if template.is_excluded(&record.race) || !filter.matches(&record) {
                report.filtered += 1;
                continue;
            }
            kept.push(record);
        }
        report.requested = kept.len() as u64;
        info!(
            run_id = %self.run_id,
            seed = self.seed,
            loaded,
            kept = kept.len(),
            "unit batch started"
        );

        for (index, record) in kept.iter().enumerate() {
            let mut rng = self.entity_rng("units", index as u64);
            let pick = match resolve_unit(template, record, &mut rng) {
                Ok(pick) => pick,
                Err(err) => {
                    skip(&mut report, &err, record.name.clone());
                    continue;
                }
            };
            let selection = unit_selection(template, record, &pick);
            write(sink, &mut report, unit_row(template, record, &pick, &selection))?;
            report.generated += 1;
        }

        finish(&report, start);
        Ok(report)
    }
}

fn combination_request<'a>(
    combination: &'a Combination,
    traversal: &'a PortraitTraversal,
) -> CharacterRequest<'a> {
    CharacterRequest {
        race: combination.race.as_deref(),
        role: combination.role.as_deref(),
        appearance: AppearanceRequest {
            hair: HairRequest {
                length: combination.hair_length.as_deref(),
                style: combination.hair_style.as_deref(),
                color: combination.hair_color.as_deref(),
                ..HairRequest::default()
            },
            eye_color: combination.eye_color.as_deref(),
            chest: combination.chest.as_deref(),
            body: combination.body.as_deref(),
        },
        camera: CameraRequest {
            shot: traversal.shot.as_deref(),
            angle: traversal.angle.as_deref(),
            composition: traversal.composition.as_deref(),
            character_action: None,
        },
    }
}

/// `{role}_{race}_{hair_style}_{hair_color}_{chest}` of the resolved keys.
fn portrait_style(pick: &CharacterPick) -> String {
    let hair = &pick.appearance.hair;
    let chest = pick
        .appearance
        .chest
        .as_ref()
        .map(|choice| choice.key.as_str())
        .unwrap_or_default();
    format!(
        "{}_{}_{}_{}_{}",
        pick.race_role.role, pick.race_role.race, hair.style.key, hair.color.key, chest
    )
}

fn unit_row(
    template: &UnitTemplate,
    record: &UnitRecord,
    pick: &UnitPick,
    selection: &ResolvedSelection,
) -> UnitRow {
    let text = |choice: Option<&portraitgen_core::Choice>| {
        choice.map(|choice| choice.text.clone()).unwrap_or_default()
    };
    let mut row = UnitRow {
        name: record.name.clone(),
        race: record.race.clone(),
        country: record.country.clone(),
        unit_type: record.unit_type.clone(),
        level: record.level.clone(),
        avatar: record.avatar.clone(),
        attire_name: format!("{}_attire", record.unit_type),
        attire_set: pick.attire.clone(),
        expression: pick.expression.clone(),
        pose: pick.pose.clone(),
        background: template.country_style(&record.country).to_string(),
        lighting: pick.lighting.clone(),
        atmosphere: pick.atmosphere.clone(),
        shot: text(pick.camera.shot.as_ref()),
        angle: text(pick.camera.angle.as_ref()),
        composition: text(pick.camera.composition.as_ref()),
        character_action: text(pick.camera.character_action.as_ref()),
        prompt: selection.prompt(),
        seed: selection.seed(),
        ..UnitRow::default()
    };
    if let Some(appearance) = &pick.appearance {
        let hair = &appearance.hair;
        row.hair_length = hair
            .length
            .as_ref()
            .map(|choice| choice.key.clone())
            .unwrap_or_default();
        row.hair_style = hair.style.key.clone();
        row.hair_color = hair.color.key.clone();
        row.eye_color = appearance.eye.key.clone();
        row.body_type = appearance.body.key.clone();
        row.hair_accessory = hair.accessory.clone().unwrap_or_default();
        row.hair_bangs = hair
            .bangs
            .as_ref()
            .map(|choice| choice.key.clone())
            .unwrap_or_default();
    }
    row
}

fn write<R, S: RowSink<R>>(sink: &mut S, report: &mut BatchReport, row: R) -> Result<(), GenerationError> {
    sink.write_row(&row)?;
    report.record_row();
    Ok(())
}

fn skip(report: &mut BatchReport, err: &SelectionError, entity: String) {
    warn!(
        run_id = %report.run_id,
        entity = %entity,
        code = err.code(),
        error = %err,
        "entity skipped"
    );
    report.record_skip(BatchIssue::warning(err.code(), err.to_string(), Some(entity)));
}

fn finish(report: &BatchReport, start: Instant) {
    info!(
        run_id = %report.run_id,
        flavor = %report.flavor,
        generated = report.generated,
        rows = report.rows_written,
        skipped = report.skipped,
        degraded = report.degraded,
        duration_ms = start.elapsed().as_millis() as u64,
        "batch finished"
    );
}

fn hash_seed(seed: u64, key: &str) -> u64 {
    let mut hash = seed ^ 0xcbf29ce484222325;
    for byte in key.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

fn hash_entity_seed(batch_seed: u64, index: u64) -> u64 {
    let hash = batch_seed ^ index.wrapping_mul(0x9e3779b97f4a7c15);
    hash.wrapping_mul(0x100000001b3)
}
