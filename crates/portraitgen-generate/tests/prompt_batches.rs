use std::fs;
use std::path::PathBuf;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use portraitgen_core::{CharacterTemplate, SHORT_HAIR, UnitTemplate};
use portraitgen_generate::selector::{
    AppearanceRequest, CharacterRequest, HairRequest, UnitPick, resolve_character, resolve_unit,
};
use portraitgen_generate::{
    CsvSink, Dimension, EngineOptions, Field, PortraitRow, PortraitTraversal, PromptEngine,
    RowSink, UnitFilter, UnitRecord, UnitRow, assemble, character_selection, corrupt, read_rows,
    unit_selection,
};

fn temp_out_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("portraitgen_{name}_{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn character_template() -> CharacterTemplate {
    CharacterTemplate::builtin().expect("character template")
}

fn unit_template() -> UnitTemplate {
    UnitTemplate::builtin().expect("unit template")
}

fn engine(seed: u64) -> PromptEngine {
    PromptEngine::new(EngineOptions { seed: Some(seed) })
}

#[test]
fn fixed_options_render_their_literal_text() {
    let template = character_template();
    let request = CharacterRequest {
        race: Some("精灵"),
        role: Some("法师"),
        appearance: AppearanceRequest {
            hair: HairRequest {
                length: Some("长发"),
                style: Some("双马尾"),
                color: Some("银色"),
                ..HairRequest::default()
            },
            eye_color: Some("蓝色"),
            chest: Some("中胸"),
            body: Some("纤细"),
        },
        ..CharacterRequest::default()
    };

    for seed in 0..20 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let pick = resolve_character(&template, &request, &mut rng).expect("resolve");
        let selection = character_selection(&template, &pick);

        assert_eq!(selection.get(Field::HairColor), Some("silver hair"));
        assert_eq!(
            selection.get(Field::EyeColor).map(|text| text.to_string()),
            Some(format!("{} eyes", template.appearance.eye_color.text("蓝色").expect("eye")))
        );
        assert_eq!(
            selection.get(Field::Body),
            template.appearance.body.text("纤细")
        );
        assert!(selection.prompt().starts_with("1girl, solo, "));
    }
}

#[test]
fn free_length_with_excluded_style_is_never_short() {
    let template = character_template();
    let request = CharacterRequest {
        appearance: AppearanceRequest {
            hair: HairRequest {
                style: Some("双马尾"),
                ..HairRequest::default()
            },
            ..AppearanceRequest::default()
        },
        ..CharacterRequest::default()
    };

    for seed in 0..200 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let pick = resolve_character(&template, &request, &mut rng).expect("resolve");
        let length = pick.appearance.hair.length.expect("length drawn");
        assert_ne!(length.key, SHORT_HAIR);
    }
}

#[test]
fn human_with_free_role_and_short_hair_avoids_bound_styles() {
    let template = character_template();
    let request = CharacterRequest {
        race: Some("人类"),
        appearance: AppearanceRequest {
            hair: HairRequest {
                length: Some(SHORT_HAIR),
                ..HairRequest::default()
            },
            ..AppearanceRequest::default()
        },
        ..CharacterRequest::default()
    };

    for seed in 0..200 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let pick = resolve_character(&template, &request, &mut rng).expect("resolve");
        assert_eq!(pick.race_role.race, "人类");
        assert!(template.constraints.allows(&pick.race_role.role, "人类"));
        assert!(
            !template
                .appearance
                .short_hair_exclusions
                .contains(&pick.appearance.hair.style.key)
        );
    }
}

#[test]
fn undead_units_carry_no_appearance() {
    let template = unit_template();
    let record = UnitRecord::new("亡灵骑士", "亡灵", "遗迹", "physical");

    for seed in 0..20 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let pick = resolve_unit(&template, &record, &mut rng).expect("resolve");
        assert!(pick.appearance.is_none());

        let selection = unit_selection(&template, &record, &pick);
        assert!(selection.fields().all(|(field, _)| !field.is_appearance()));

        let prompt = selection.prompt();
        assert!(!prompt.contains("hair"), "{prompt}");
        assert!(!prompt.contains("eyes"), "{prompt}");
        assert!(!prompt.contains(", ,"), "{prompt}");
        assert!(!prompt.contains("build"), "{prompt}");
    }
}

#[test]
fn suppression_drops_exactly_the_appearance_fields() {
    let template = unit_template();
    let undead = UnitRecord::new("亡灵骑士", "亡灵", "遗迹", "physical");
    let living = UnitRecord::new("亡灵骑士", "人类", "遗迹", "physical");

    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let with_appearance = resolve_unit(&template, &living, &mut rng).expect("resolve");
    let without_appearance = UnitPick {
        appearance: None,
        ..with_appearance.clone()
    };

    let full = unit_selection(&template, &undead, &with_appearance);
    let suppressed = unit_selection(&template, &undead, &without_appearance);
    let appearance_fields = full
        .fields()
        .filter(|(field, _)| field.is_appearance())
        .count();
    assert!(appearance_fields >= 4);
    assert_eq!(
        suppressed.fields().count() + appearance_fields,
        full.fields().count()
    );

    let segments = |prompt: &str| prompt.split(", ").count();
    let appearance_segments: usize = full
        .fields()
        .filter(|(field, _)| field.is_appearance())
        .map(|(_, value)| segments(value))
        .sum();
    assert_eq!(
        segments(&suppressed.prompt()) + appearance_segments,
        segments(&full.prompt())
    );
}

#[test]
fn variant_keeps_appearance_and_camera() {
    let template = character_template();
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let pick = resolve_character(&template, &CharacterRequest::default(), &mut rng)
        .expect("resolve");
    let selection = character_selection(&template, &pick);
    let variant = corrupt(&selection, &template.substitutions);

    for field in [
        Field::Prefix,
        Field::Race,
        Field::HairColor,
        Field::Hair,
        Field::EyeColor,
        Field::Body,
        Field::Scene,
        Field::Shot,
        Field::Angle,
        Field::Composition,
        Field::Quality,
    ] {
        assert_eq!(variant.get(field), selection.get(field), "{}", field.as_str());
    }
    assert_eq!(variant.seed(), selection.seed() + 1);
    if let Some(alternate) = pick.attire.alternate_block() {
        assert_ne!(variant.get(Field::Attire), Some(pick.attire.block().as_str()));
        assert!(!alternate.is_empty());
    }
}

#[test]
fn same_run_seed_replays_the_batch() {
    let template = character_template();
    let traversal = PortraitTraversal {
        race: Dimension::Random,
        role: Dimension::Random,
        hair_style: Dimension::Random,
        max_combinations: 10,
        ..PortraitTraversal::default()
    };

    let mut first: Vec<PortraitRow> = Vec::new();
    let mut second: Vec<PortraitRow> = Vec::new();
    engine(2024)
        .portraits(&template, &traversal, &mut first)
        .expect("first run");
    engine(2024)
        .portraits(&template, &traversal, &mut second)
        .expect("second run");

    assert_eq!(first, second);
    assert!(!first.is_empty());
}

#[test]
fn short_hair_traversal_never_uses_excluded_styles() {
    let template = character_template();
    let traversal = PortraitTraversal {
        hair_length: Dimension::fixed(SHORT_HAIR),
        hair_style: Dimension::All,
        include_alternate: false,
        max_combinations: 500,
        ..PortraitTraversal::default()
    };

    let mut rows: Vec<PortraitRow> = Vec::new();
    let report = engine(8)
        .portraits(&template, &traversal, &mut rows)
        .expect("portraits");

    assert_eq!(report.skipped, 0);
    assert!(!rows.is_empty());
    for row in &rows {
        for excluded in &template.appearance.short_hair_exclusions {
            assert!(!row.style.contains(excluded.as_str()), "{}", row.style);
        }
    }
}

#[test]
fn traversal_above_limit_is_truncated_and_reported() {
    let template = character_template();
    let traversal = PortraitTraversal {
        hair_color: Dimension::All,
        max_combinations: 5,
        ..PortraitTraversal::default()
    };

    let mut rows: Vec<PortraitRow> = Vec::new();
    let report = engine(1)
        .portraits(&template, &traversal, &mut rows)
        .expect("portraits");

    assert!(report.truncated);
    assert!(report.requested > 5);
    assert_eq!(report.generated, 5);
    assert_eq!(rows.len(), 10);
}

#[test]
fn csv_output_reads_back_as_written() {
    let template = unit_template();
    let out_dir = temp_out_dir("units");
    let path = out_dir.join("units.csv");
    let records = vec![
        UnitRecord::new("人类骑士", "人类", "人类国家", "physical"),
        UnitRecord::new("狐族弓手", "狐族", "九尾神社", "physical"),
        UnitRecord::new("天使祭司", "天使", "天界", "magical"),
    ];

    let mut sink = CsvSink::<UnitRow>::create(&path).expect("create sink");
    let report = engine(17)
        .units(&template, records, &UnitFilter::default(), &mut sink)
        .expect("units");
    assert_eq!(sink.rows_written(), 3);
    assert_eq!(report.rows_written, 3);

    let rows: Vec<UnitRow> = read_rows(&path).expect("read rows");
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].name, "人类骑士");
    let fox = &rows[1];
    assert!(!fox.prompt.contains("{hair_color}"));
    assert!(fox.prompt.contains("fox ears"));
    for row in &rows {
        assert!((10_000..=99_999).contains(&row.seed));
        assert!(!row.prompt.contains(", ,"));
    }
}

#[test]
fn vec_sink_and_csv_sink_see_the_same_rows() {
    let template = character_template();
    let traversal = PortraitTraversal::default();
    let out_dir = temp_out_dir("portraits");
    let path = out_dir.join("portraits.csv");

    let mut memory: Vec<PortraitRow> = Vec::new();
    engine(5)
        .portraits(&template, &traversal, &mut memory)
        .expect("memory run");
    let mut sink = CsvSink::<PortraitRow>::create(&path).expect("create sink");
    engine(5)
        .portraits(&template, &traversal, &mut sink)
        .expect("csv run");

    let from_disk: Vec<PortraitRow> = read_rows(&path).expect("read rows");
    assert_eq!(memory, from_disk);

    let mut extra: Vec<PortraitRow> = Vec::new();
    extra.write_row(&memory[0]).expect("vec sink");
    assert_eq!(extra.len(), 1);
}

#[test]
fn assembling_twice_gives_the_same_prompt() {
    let template = character_template();
    let mut rng = ChaCha8Rng::seed_from_u64(31);
    let pick = resolve_character(&template, &CharacterRequest::default(), &mut rng)
        .expect("resolve");
    let selection = character_selection(&template, &pick);

    let parts: Vec<Option<&str>> = selection.fields().map(|(_, value)| Some(value)).collect();
    assert_eq!(assemble(parts.clone()), assemble(parts));
    assert_eq!(selection.prompt(), selection.prompt());
    assert_eq!(character_selection(&template, &pick), selection);
}
