//! Unit-flavor template store.
//!
//! Units come from an external table (one row per unit) and only borrow their
//! look from here: race descriptor, faction style used as the background, one
//! attire per unit name and mood pools shared by every unit of a type.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::appearance::{AppearanceTables, CameraTables};
use crate::catalog::{ChoiceTable, HairColor, pool};
use crate::character::{QUALITY_TAGS, validate_appearance};
use crate::error::{Result, TemplateError};
use crate::validation::{ValidationIssue, ValidationReport, require_entries};

pub const UNIT_PREFIX: &str = "score_9, score_8_up, score_7_up, source_anime";
pub const DEFAULT_UNIT_TYPE: &str = "physical";
pub const DEFAULT_COUNTRY_STYLE: &str = "classical theme";
pub const DEFAULT_RACE_TEXT: &str = "beautiful girl";
/// Race whose descriptor replaces every appearance field.
pub const SUPPRESSED_RACE: &str = "亡灵";
/// Race filtered out of unit tables before generation.
pub const EXCLUDED_RACE: &str = "哥布林";
/// Placeholder in race descriptors filled with the resolved hair hue.
pub const HAIR_COLOR_PLACEHOLDER: &str = "{hair_color}";

/// Mood pools shared by every unit of one type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitTypeProfile {
    pub expressions: Vec<String>,
    pub poses: Vec<String>,
    pub lighting: Vec<String>,
    pub atmosphere: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitTemplate {
    pub prefix: String,
    pub quality: String,
    pub races: ChoiceTable,
    pub appearance: AppearanceTables,
    pub countries: ChoiceTable,
    pub attires: ChoiceTable,
    pub unit_types: BTreeMap<String, UnitTypeProfile>,
    pub camera: CameraTables,
}

impl UnitTemplate {
    pub fn builtin() -> Result<Self> {
        let unit_types = [
            ("physical".to_string(), physical_profile()),
            ("magical".to_string(), magical_profile()),
        ]
        .into_iter()
        .collect();

        Self::build(Self {
            prefix: UNIT_PREFIX.to_string(),
            quality: QUALITY_TAGS.to_string(),
            races: ChoiceTable::from_pairs("races", RACES),
            appearance: appearance(),
            countries: ChoiceTable::from_pairs("countries", COUNTRIES),
            attires: ChoiceTable::from_pairs("unit_attires", UNIT_ATTIRES),
            unit_types,
            camera: CameraTables {
                shot: ChoiceTable::from_pairs("shot", &[("全身像", "full_shot")]),
                angle: ChoiceTable::from_pairs("angle", ANGLES),
                composition: ChoiceTable::from_pairs("composition", COMPOSITIONS),
                character_action: ChoiceTable::from_pairs("character_action", ACTIONS),
            },
        })
    }

    pub fn build(raw: Self) -> Result<Self> {
        let report = raw.validate();
        if report.is_ok() {
            Ok(raw)
        } else {
            Err(TemplateError::Invalid(report))
        }
    }

    /// Race descriptor with `DEFAULT_RACE_TEXT` for unknown races.
    pub fn race_text(&self, race: &str) -> &str {
        self.races.text(race).unwrap_or(DEFAULT_RACE_TEXT)
    }

    /// Faction style, used as the scene.
    pub fn country_style(&self, country: &str) -> &str {
        self.countries.text(country).unwrap_or(DEFAULT_COUNTRY_STYLE)
    }

    /// Pools for `unit_type`, falling back to `physical`.
    pub fn unit_type(&self, unit_type: &str) -> Option<&UnitTypeProfile> {
        self.unit_types
            .get(unit_type)
            .or_else(|| self.unit_types.get(DEFAULT_UNIT_TYPE))
    }

    /// Named attire, or a generated sentence when the unit has none.
    pub fn attire_for(&self, name: &str, race: &str, unit_type: &str) -> Cow<'_, str> {
        match self.attires.text(name) {
            Some(attire) => Cow::Borrowed(attire),
            None => Cow::Owned(default_attire(race, unit_type)),
        }
    }

    pub fn is_excluded(&self, race: &str) -> bool {
        race.to_lowercase() == EXCLUDED_RACE.to_lowercase()
    }

    pub fn suppresses_appearance(&self, race: &str) -> bool {
        race == SUPPRESSED_RACE
    }

    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();

        require_entries(&mut report, &self.races, "races");
        require_entries(&mut report, &self.countries, "countries");
        require_entries(&mut report, &self.attires, "unit_attires");
        validate_appearance(&mut report, &self.appearance, "appearance");
        require_entries(&mut report, &self.appearance.hair_length, "appearance.hair_length");
        require_entries(&mut report, &self.camera.shot, "camera.shot");
        require_entries(&mut report, &self.camera.angle, "camera.angle");
        require_entries(&mut report, &self.camera.composition, "camera.composition");
        require_entries(
            &mut report,
            &self.camera.character_action,
            "camera.character_action",
        );

        if !self.races.contains(SUPPRESSED_RACE) {
            report.push(ValidationIssue::warning(
                "missing_race",
                "races",
                format!("appearance-suppressed race '{SUPPRESSED_RACE}' is not defined"),
            ));
        }
        if !self.unit_types.contains_key(DEFAULT_UNIT_TYPE) {
            report.push(ValidationIssue::error(
                "missing_default_unit_type",
                "unit_types",
                format!("fallback unit type '{DEFAULT_UNIT_TYPE}' is not defined"),
            ));
        }
        for (name, profile) in &self.unit_types {
            for (pool, values) in [
                ("expressions", &profile.expressions),
                ("poses", &profile.poses),
                ("lighting", &profile.lighting),
                ("atmosphere", &profile.atmosphere),
            ] {
                if values.is_empty() {
                    report.push(ValidationIssue::error(
                        "empty_pool",
                        format!("unit_types.{name}.{pool}"),
                        "pool has no entries",
                    ));
                }
            }
        }

        report
    }
}

pub fn default_attire(race: &str, unit_type: &str) -> String {
    format!(
        "{race} {unit_type} girl, elegant attire, graceful bearing, stylish clothing, refined accessories, fine jewelry, battle-ready gear, distinctive insignia, practical boots, signature weapon"
    )
}

const RACES: &[(&str, &str)] = &[
    ("人类", "1girl, solo, human girl"),
    ("永恒精灵", "1girl, solo, elf girl, pointy ears, ethereal beauty"),
    ("黑暗精灵", "1girl, solo, dark elf girl, pointy ears, brown skin"),
    (
        "狐族",
        "1girl, solo, fox girl, kemonomimi, {hair_color} fox ears, {hair_color} fox tail",
    ),
    ("哥布林", "1girl, solo, goblin girl, green skin, small stature"),
    ("天使", "1girl, solo, angel girl, white wings, divine beauty, celestial grace"),
    ("亡灵", "undead warrior, skeletal features, dark aura, intimidating presence"),
    ("魔族", "1girl, solo, demon girl, horns, dark aura, commanding presence"),
];

fn appearance() -> AppearanceTables {
    AppearanceTables {
        hair_length: ChoiceTable::from_pairs(
            "hair_length",
            &[("短发", "short hair"), ("中发", "medium hair"), ("长发", "long hair")],
        ),
        hair_style: ChoiceTable::from_pairs(
            "hair_style",
            &[
                ("直发", "straight hair"),
                ("卷发", "curly hair"),
                ("波浪形头发", "wavy hair"),
                ("蓬发", "disheveled hair"),
                ("凌乱发型", "messy hair"),
                ("马尾", "ponytail"),
                ("双马尾", "twintails"),
                ("高马尾", "high ponytail"),
                ("侧马尾", "side ponytail"),
                ("马尾编发", "braided ponytail"),
                ("双辫子", "twin braids"),
                ("辫子刘海", "braided bangs"),
                ("眼间头发", "hair between eyes"),
                ("妹妹切", "bob cut"),
                ("公主切", "hime cut"),
                ("翼状头发", "hair wings"),
                ("露额头", "forehead"),
                ("钻头卷公主卷", "drill hair"),
                ("包子头", "hair bun"),
                ("俩包子头", "double bun"),
            ],
        ),
        short_hair_exclusions: [
            "马尾",
            "双马尾",
            "高马尾",
            "侧马尾",
            "马尾编发",
            "双辫子",
            "辫子刘海",
            "翼状头发",
            "钻头卷公主卷",
            "包子头",
            "俩包子头",
        ]
        .into_iter()
        .map(String::from)
        .collect(),
        hair_bangs: ChoiceTable::from_pairs(
            "hair_bangs",
            &[
                ("无刘海", ""),
                ("侧扫刘海", "swept bangs"),
                ("交叉刘海", "crossed bangs"),
                ("齐刘海", "blunt bangs"),
                ("空气刘海", "air bangs"),
                ("长刘海", "long bangs"),
                ("中分刘海", "centre parting bangs"),
                ("不对称刘海", "asymmetric bangs"),
            ],
        ),
        hair_color: vec![
            HairColor::with_gradient("金色", "blonde", "(blonde hair:1.2), blonde to golden gradient"),
            HairColor::with_gradient("银色", "silver", "(silver hair:1.2), silver to white gradient"),
            HairColor::with_gradient("黑色", "black", "(black hair:1.2), black to dark purple gradient"),
            HairColor::with_gradient("紫色", "purple", "(purple hair:1.2), purple to blonde gradient"),
            HairColor::with_gradient("红色", "red", "(red hair:1.2), red to orange gradient"),
            HairColor::with_gradient("白色", "white", "(white hair:1.2), white to silver gradient"),
            HairColor::with_gradient("蓝色", "blue", "(blue hair:1.2), blue to cyan gradient"),
            HairColor::with_gradient("绿色", "green", "(green hair:1.2), green to emerald gradient"),
            HairColor::with_gradient("粉色", "pink", "(pink hair:1.2), pink to rose gradient"),
        ],
        eye_color: ChoiceTable::from_pairs(
            "eye_color",
            &[
                ("蓝色", "blue"),
                ("绿色", "green"),
                ("紫色", "purple"),
                ("棕色", "brown"),
                ("粉色", "pink"),
                ("红色", "red"),
                ("金色", "golden"),
                ("彩虹色", "rainbow"),
                ("心形", "heart-shaped"),
            ],
        ),
        chest: ChoiceTable::default(),
        body: ChoiceTable::from_pairs(
            "body_type",
            &[
                ("娇小身材", "petite build"),
                ("正常身材", "athletic build"),
                ("健壮身材", "sturdy build"),
            ],
        ),
        hair_accessories: pool(&[
            "delicate hair ornament",
            "jeweled hairpin",
            "ribbon",
            "braid detail",
            "silk bow",
            "tiara",
            "flower accessory",
            "feather accent",
            "streaked hair",
            "ahoge",
        ]),
    }
}

const COUNTRIES: &[(&str, &str)] = &[
    (
        "月冠王国",
        "elegant silver-white theme, lunar motifs, ethereal beauty, moonstone jewelry, celestial symbols",
    ),
    (
        "人类国家",
        "classical medieval theme, noble appearance, royal elegance, heraldic symbols, courtly grace",
    ),
    (
        "哥布林巢穴",
        "primitive tribal theme, wild appearance, natural materials, bone ornaments, tribal markings",
    ),
    (
        "天界",
        "divine white-gold theme, celestial beauty, holy radiance, angelic wings, divine symbols",
    ),
    (
        "遗迹",
        "ancient ruins theme, mysterious aura, weathered appearance, ancient artifacts, mystical runes",
    ),
    (
        "九尾神社",
        "traditional japanese theme, shrine maiden style, spiritual elegance, fox motifs, sacred symbols",
    ),
    (
        "红叶商盟",
        "merchant theme, practical clothing, trade accessories, coin jewelry, merchant symbols",
    ),
    (
        "暗影密会",
        "dark mysterious theme, shadowy appearance, occult symbols, shadow magic, dark arts",
    ),
    (
        "地狱",
        "infernal theme, demonic appearance, dark power, demonic symbols, hellfire aura",
    ),
];

const UNIT_ATTIRES: &[(&str, &str)] = &[
    (
        "永恒精灵游侠",
        "elf ranger girl, forest cloak, silver longbow, quiver of arrows, leather armor, moonstone dagger, nature amulet, woodland boots, leaf brooch, forest charm",
    ),
    (
        "永恒精灵平民",
        "elf commoner girl, simple dress, woven basket, flower crown, delicate jewelry, wooden staff, nature pouch, herbal satchel, woodland sandals, embroidered shawl",
    ),
    (
        "永恒精灵法师",
        "elf mage girl, flowing robes, crystal staff, spellbook, moonstone ring, magical orb, arcane symbols, enchanted cloak, mystical pendant, silver circlet",
    ),
    (
        "永恒精灵德鲁伊",
        "elf druid girl, leaf robes, wooden staff, vine whip, earth amulet, nature pouch, herbal bag, forest boots, antler circlet, druidic symbols",
    ),
    (
        "天使祭司",
        "angel priestess girl, white robes, golden cross, holy book, blessed staff, sacred symbols, heavenly crown, blessed jewelry, silk sash, halo",
    ),
    (
        "守护天使",
        "guardian angel girl, divine armor, holy sword, angelic shield, blessed gauntlets, sacred symbols, divine helm, winged pauldrons, white cape, halo",
    ),
    (
        "战斗天使",
        "battle angel girl, combat armor, holy spear, divine sword, blessed shield, war symbols, battle helm, winged greaves, crimson sash, divine weapons",
    ),
    (
        "炽天使",
        "seraphim girl, golden armor, divine sword, six wings, holy shield, blessed weapons, heavenly symbols, celestial crown, radiant halo, sacred power",
    ),
    (
        "人类守卫",
        "human guard girl, chainmail armor, sword and shield, guard helm, leather boots, metal gauntlets, heraldic symbols, guard uniform, signal horn, protective gear",
    ),
    (
        "人类士兵",
        "human soldier girl, military armor, spear, short sword, soldier helm, combat boots, leather gloves, military symbols, soldier pack, battle gear",
    ),
    (
        "人类圣骑士",
        "human paladin girl, plate armor, blessed sword, holy shield, steel helm, armored boots, divine symbols, white tabard, prayer beads, holy weapons",
    ),
    (
        "人类商人",
        "human merchant girl, fine clothing, coin purse, trade scales, merchant bag, business ledger, trade symbols, merchant hat, silk scarf, trade tools",
    ),
    (
        "人类骑士",
        "human knight girl, polished armor, lance, longsword, knight helm, metal boots, steel gauntlets, heraldic symbols, knight cloak, royal weapons",
    ),
    (
        "人类农民",
        "human peasant girl, rustic dress, farming hoe, harvest basket, straw hat, work boots, agricultural tools, farming apron, rolled sleeves, country gear",
    ),
    (
        "人类牧师",
        "human priestess girl, holy vestments, blessed staff, holy book, sacred symbols, prayer beads, religious accessories, priestess crown, silk stole, blessed items",
    ),
    (
        "人类民兵",
        "human militia girl, simple armor, spear, short sword, leather helm, cloth boots, basic weapons, militia symbols, militia uniform, defensive gear",
    ),
    (
        "人类弓箭手",
        "human archer girl, leather armor, longbow, quiver of arrows, archer gloves, hunting knife, archery symbols, forest cloak, arm guard, precision tools",
    ),
    (
        "人类法师",
        "human mage girl, scholarly robes, spellbook, wand, magical staff, arcane symbols, spell components, mystical accessories, mage hat, magical tools",
    ),
    (
        "骷髅战士",
        "undead skeleton warrior, ancient armor, bone sword, rusted shield, skull helm, bone weapons, necromantic symbols, tattered banner, death magic, cursed weapons",
    ),
    (
        "骷髅仆从",
        "undead skeleton servant, tattered robes, bone dagger, servant bag, skull mask, bone tools, necromantic symbols, rusted lantern, death magic, cursed items",
    ),
    (
        "骷髅法师",
        "undead skeleton mage, dark robes, bone staff, necromantic tome, skull crown, death symbols, soul lantern, dark magic, cursed staff, necromantic tools",
    ),
    (
        "僵尸",
        "undead zombie creature, decayed clothing, rusty weapon, rotting flesh, zombie mask, death symbols, necromantic aura, broken chains, cursed items, decayed gear",
    ),
    (
        "狐族巫女",
        "fox shrine maiden girl, white kimono, sacred staff, shrine bells, prayer beads, shrine symbols, paper talismans, red hakama, traditional sandals, divine tools",
    ),
    (
        "狐族守卫",
        "fox guard girl, traditional armor, katana, wooden shield, guard helm, shrine symbols, lacquered bracers, tassel charm, traditional boots, protective gear",
    ),
    (
        "狐族商人",
        "fox merchant girl, fine kimono, trade scales, coin purse, merchant bag, trade symbols, abacus, paper parasol, traditional sandals, business tools",
    ),
    (
        "狐族航海家",
        "fox sailor girl, nautical clothing, cutlass, compass and map, sailor hat, maritime symbols, spyglass, rope belt, sailing boots, navigation tools",
    ),
    (
        "狐族弓箭手",
        "fox archer girl, traditional outfit, bamboo bow, arrow quiver, archer gloves, shrine symbols, chest guard, hair ribbon, traditional boots, hunting gear",
    ),
    (
        "狐族法师",
        "fox mage girl, traditional robes, magical fan, spell scrolls, mystical symbols, shrine accessories, foxfire orbs, silk obi, traditional sandals, magical tools",
    ),
    (
        "狐族村民",
        "fox villager girl, traditional clothing, farming tools, harvest basket, straw hat, shrine symbols, cotton apron, bamboo basket, traditional sandals, village gear",
    ),
    (
        "黑暗精灵战士",
        "dark elf warrior girl, dark armor, curved sword, dark shield, pointy ears, dark weapons, shadow symbols, spiked pauldrons, war paint, dark magic gear",
    ),
    (
        "黑暗精灵斥候",
        "dark elf scout girl, hooded cloak, light leather armor, short bow, hunting knife, pointy ears, shadow symbols, rope coil, soft boots, stealth gear",
    ),
    (
        "黑暗精灵祭司",
        "dark elf priestess girl, dark robes, shadow staff, dark tome, pointy ears, shadow symbols, spider pendant, silver circlet, dark magic, ritual tools",
    ),
    (
        "黑暗精灵弓箭手",
        "dark elf archer girl, dark leather armor, dark bow, poison arrows, pointy ears, shadow weapons, dark symbols, arm guard, hooded mantle, stealth gear",
    ),
    (
        "黑暗精灵法师",
        "dark elf mage girl, dark robes, shadow staff, dark grimoire, pointy ears, shadow magic, dark symbols, obsidian amulet, rune bracers, arcane tools",
    ),
    (
        "黑暗精灵刺客",
        "dark elf assassin girl, dark stealth gear, dual daggers, poison vials, pointy ears, hidden weapons, shadow symbols, face veil, soft boots, assassin tools",
    ),
    (
        "恶魔战士",
        "demon warrior girl, infernal armor, demonic sword, hellfire shield, horns and tail, demonic weapons, hellfire symbols, spiked gauntlets, infernal gear, cursed weapons",
    ),
    (
        "恶魔领主",
        "demon lord girl, royal demonic armor, demonic scepter, hellfire crown, horns and tail, commanding cape, hellfire symbols, obsidian throne motif, infernal majesty, dark dominion",
    ),
];

fn physical_profile() -> UnitTypeProfile {
    UnitTypeProfile {
        expressions: pool(&[
            "confident beauty",
            "serious elegance",
            "fierce resolve",
            "determined grace",
            "noble bearing",
            "heroic gaze",
        ]),
        poses: pool(&[
            "elegant combat stance",
            "graceful standing",
            "battle ready",
            "heroic pose",
            "defensive stance",
        ]),
        lighting: pool(&["sunlight", "flame light", "battle fire", "divine light"]),
        atmosphere: pool(&["epic", "intense", "heroic", "noble", "divine"]),
    }
}

fn magical_profile() -> UnitTypeProfile {
    UnitTypeProfile {
        expressions: pool(&[
            "mysterious beauty",
            "calm elegance",
            "focused grace",
            "enchanting gaze",
            "divine serenity",
            "magical aura",
        ]),
        poses: pool(&[
            "graceful casting",
            "elegant meditating",
            "channeling magic",
            "divine blessing",
            "mystical communion",
        ]),
        lighting: pool(&["magical light", "moonlight", "starlight", "divine light"]),
        atmosphere: pool(&["mystical", "magical", "ethereal", "divine", "peaceful"]),
    }
}

const ANGLES: &[(&str, &str)] = &[
    ("正面视角", "front view"),
    ("侧面视角", "from_side"),
    ("动态角度", "dynamic_angle"),
    ("倾斜角度", "dutch angle"),
];

const COMPOSITIONS: &[(&str, &str)] = &[
    ("战斗构图", "battle composition"),
    ("动态构图", "dynamic composition"),
    ("力量构图", "powerful composition"),
];

const ACTIONS: &[(&str, &str)] = &[
    ("战斗姿态", "battle stance"),
    ("准备攻击", "ready to attack"),
    ("防御姿态", "defensive stance"),
    ("警戒状态", "alert stance"),
    ("战斗准备", "combat ready"),
    ("武器举起", "weapon raised"),
    ("战斗凝视", "battle stare"),
    ("战斗怒吼", "battle cry"),
    ("战斗冲锋", "battle charge"),
    ("战斗守护", "battle guard"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_template_validates() {
        let template = UnitTemplate::builtin().expect("builtin template");
        let report = template.validate();
        assert!(report.is_ok(), "unexpected errors: {report}");
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn lookups_fall_back_to_documented_defaults() {
        let template = UnitTemplate::builtin().expect("builtin template");
        assert_eq!(template.race_text("史莱姆"), DEFAULT_RACE_TEXT);
        assert_eq!(template.country_style("Unknown"), DEFAULT_COUNTRY_STYLE);
        assert_eq!(
            template.unit_type("siege"),
            template.unit_types.get(DEFAULT_UNIT_TYPE)
        );

        let attire = template.attire_for("无名之兵", "人类", "magical");
        assert!(attire.starts_with("人类 magical girl, elegant attire"));
        assert!(matches!(template.attire_for("人类骑士", "人类", "physical"), Cow::Borrowed(_)));
    }

    #[test]
    fn excluded_race_match_ignores_case() {
        let template = UnitTemplate::builtin().expect("builtin template");
        assert!(template.is_excluded("哥布林"));
        assert!(!template.is_excluded("人类"));
        assert!(template.suppresses_appearance("亡灵"));
    }

    #[test]
    fn missing_default_unit_type_is_an_error() {
        let mut template = UnitTemplate::builtin().expect("builtin template");
        template.unit_types.remove(DEFAULT_UNIT_TYPE);
        let err = UnitTemplate::build(template).expect_err("must reject");
        assert!(matches!(err, TemplateError::Invalid(report) if report.has_code("missing_default_unit_type")));
    }
}
