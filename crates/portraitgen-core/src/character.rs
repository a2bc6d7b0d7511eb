//! Character-flavor template store: races, identities, roles and their
//! attire, shared mood pools, camera framing and the alternate register.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::appearance::{AppearanceTables, CameraTables, SHORT_HAIR};
use crate::catalog::{ChoiceTable, HairColor, pool};
use crate::constraints::{DEFAULT_ROLE, RoleConstraints};
use crate::error::{Result, TemplateError};
use crate::profile::{
    AttireSet, RoleProfile, SharedCategory, Substitutions, fold_shared_library, mapping,
};
use crate::validation::{ValidationIssue, ValidationReport, require_entries};

pub const CHARACTER_PREFIX: &str = "1girl, solo";
pub const QUALITY_TAGS: &str = "artistic, high quality, detailed";

/// Fully-populated character template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterTemplate {
    pub prefix: String,
    pub quality: String,
    pub races: ChoiceTable,
    pub appearance: AppearanceTables,
    pub constraints: RoleConstraints,
    pub profiles: BTreeMap<String, RoleProfile>,
    pub camera: CameraTables,
    pub substitutions: Substitutions,
}

impl CharacterTemplate {
    /// Built-in template, validated.
    pub fn builtin() -> Result<Self> {
        let mut profiles: BTreeMap<String, RoleProfile> = attire_profiles()
            .into_iter()
            .map(|profile| (profile.role.clone(), profile))
            .collect();
        fold_shared_library(&mut profiles, SHARED_LIBRARY)?;

        let template = Self {
            prefix: CHARACTER_PREFIX.to_string(),
            quality: QUALITY_TAGS.to_string(),
            races: ChoiceTable::from_pairs("races", RACES),
            appearance: appearance(),
            constraints: RoleConstraints::from_encoded(IDENTITY_ROLES)?,
            profiles,
            camera: CameraTables {
                shot: ChoiceTable::from_pairs("shot", SHOTS),
                angle: ChoiceTable::from_pairs("angle", ANGLES),
                composition: ChoiceTable::from_pairs("composition", COMPOSITIONS),
                character_action: ChoiceTable::default(),
            },
            substitutions: substitutions(),
        };
        Self::build(template)
    }

    /// Accept `raw` when validation reports no errors.
    pub fn build(raw: Self) -> Result<Self> {
        let report = raw.validate();
        if report.is_ok() {
            Ok(raw)
        } else {
            Err(TemplateError::Invalid(report))
        }
    }

    /// Profile for `role`, falling back to the default role's profile.
    pub fn profile(&self, role: &str) -> Option<&RoleProfile> {
        self.profiles
            .get(role)
            .or_else(|| self.profiles.get(DEFAULT_ROLE))
    }

    pub fn race_text(&self, race: &str) -> Option<&str> {
        self.races.text(race)
    }

    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();

        require_entries(&mut report, &self.races, "races");
        validate_appearance(&mut report, &self.appearance, "appearance");
        require_entries(&mut report, &self.camera.shot, "camera.shot");
        require_entries(&mut report, &self.camera.angle, "camera.angle");
        require_entries(&mut report, &self.camera.composition, "camera.composition");

        if self.constraints.identities().is_empty() {
            report.push(ValidationIssue::error(
                "empty_table",
                "identity_roles",
                "no identities defined",
            ));
        }
        for role in self.constraints.duplicate_roles() {
            report.push(ValidationIssue::error(
                "duplicate_role",
                format!("identity_roles.{role}"),
                "role listed under more than one identity",
            ));
        }
        for identity in self.constraints.identities() {
            for entry in &identity.roles {
                let path = format!("identity_roles.{}.{}", identity.name, entry.role);
                for race in &entry.races {
                    if !self.races.contains(race) {
                        report.push(ValidationIssue::error(
                            "unknown_race",
                            path.clone(),
                            format!("race '{race}' is not defined"),
                        ));
                    }
                }
                if !self.profiles.contains_key(&entry.role) {
                    report.push(ValidationIssue::warning(
                        "missing_profile",
                        path,
                        format!("no profile, '{DEFAULT_ROLE}' profile is used instead"),
                    ));
                }
            }
        }

        if !self.profiles.contains_key(DEFAULT_ROLE) {
            report.push(ValidationIssue::error(
                "missing_default_profile",
                "role_profiles",
                format!("fallback profile '{DEFAULT_ROLE}' is not defined"),
            ));
        }
        for (role, profile) in &self.profiles {
            let path = format!("role_profiles.{role}");
            if !self.constraints.contains_role(role) {
                report.push(ValidationIssue::warning(
                    "orphan_profile",
                    path.clone(),
                    "profile is not reachable from any identity",
                ));
            }
            if profile.attire_sets.is_empty() {
                report.push(ValidationIssue::warning(
                    "missing_attire",
                    path.clone(),
                    "no attire sets, the default attire is used",
                ));
            }
            for (name, values) in [
                ("expressions", &profile.expressions),
                ("poses", &profile.poses),
                ("lighting", &profile.lighting),
                ("atmosphere", &profile.atmosphere),
            ] {
                if values.is_empty() {
                    report.push(ValidationIssue::warning(
                        "empty_pool",
                        format!("{path}.{name}"),
                        "pool is empty, the field is omitted",
                    ));
                }
            }
        }

        report
    }
}

/// Checks shared by both flavors' appearance tables.
pub(crate) fn validate_appearance(
    report: &mut ValidationReport,
    appearance: &AppearanceTables,
    path: &str,
) {
    require_entries(report, &appearance.hair_style, &format!("{path}.hair_style"));
    require_entries(report, &appearance.eye_color, &format!("{path}.eye_color"));
    require_entries(report, &appearance.body, &format!("{path}.body"));
    if appearance.hair_color.is_empty() {
        report.push(ValidationIssue::error(
            "empty_table",
            format!("{path}.hair_color"),
            "table has no entries",
        ));
    }
    for style in &appearance.short_hair_exclusions {
        if !appearance.hair_style.contains(style) {
            report.push(ValidationIssue::error(
                "unknown_style",
                format!("{path}.short_hair_exclusions"),
                format!("excluded style '{style}' is not a hair style"),
            ));
        }
    }
    if !appearance.short_hair_exclusions.is_empty()
        && appearance.styles_for_length(Some(SHORT_HAIR)).is_empty()
    {
        report.push(ValidationIssue::error(
            "no_short_styles",
            format!("{path}.short_hair_exclusions"),
            "every style is excluded for short hair",
        ));
    }
}

const RACES: &[(&str, &str)] = &[
    ("人类", "human girl"),
    ("精灵", "elf girl, pointy ears"),
    ("狐族", "fox girl, kemonomimi, fox ears, fox tail"),
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
                ("波浪发", "wavy hair"),
                ("双马尾", "twin tails"),
                ("单马尾", "ponytail"),
                ("公主切", "hime cut"),
                ("包子头", "hair bun"),
            ],
        ),
        short_hair_exclusions: ["双马尾", "单马尾", "包子头"]
            .into_iter()
            .map(String::from)
            .collect(),
        hair_bangs: ChoiceTable::default(),
        hair_color: vec![
            HairColor::solid("金色", "blonde"),
            HairColor::solid("银色", "silver"),
            HairColor::solid("黑色", "black"),
            HairColor::solid("棕色", "brown"),
            HairColor::solid("红色", "red"),
            HairColor::solid("白色", "white"),
            HairColor::solid("蓝色", "blue"),
            HairColor::solid("绿色", "green"),
            HairColor::solid("粉色", "pink"),
        ],
        eye_color: ChoiceTable::from_pairs(
            "eye_color",
            &[
                ("蓝色", "blue"),
                ("绿色", "green"),
                ("紫色", "purple"),
                ("棕色", "brown"),
                ("红色", "red"),
                ("金色", "golden"),
                ("银色", "silver"),
            ],
        ),
        chest: ChoiceTable::from_pairs(
            "chest",
            &[("小胸", "small chest"), ("中胸", "medium chest"), ("大胸", "large chest")],
        ),
        body: ChoiceTable::from_pairs(
            "body",
            &[
                ("纤细", "slender build"),
                ("健美", "athletic build"),
                ("丰满", "curvy build"),
                ("娇小", "petite build"),
                ("高挑", "tall build"),
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
        ]),
    }
}

const IDENTITY_ROLES: &[(&str, &[&str])] = &[
    (
        "贵族",
        &[
            "骑士-人类",
            "圣骑士-人类",
            "法师-人类/精灵/狐族",
            "牧师-人类",
            "女皇-人类",
            "女王-人类/精灵",
            "公主-人类/精灵",
            "王后-人类",
        ],
    ),
    (
        "平民",
        &[
            "游侠-人类/精灵/狐族",
            "盗贼-人类/狐族",
            "商人-人类/狐族",
            "学者-人类/精灵",
            "女吟游诗人-狐族",
            "女仆-人类/狐族",
            "战士-人类/狐族/精灵",
            "女教师-人类",
            "女医生-人类",
        ],
    ),
    ("特殊", &["德鲁伊-精灵"]),
];

const EXPRESSIONS: &[(&str, &str)] = &[
    ("神秘-法师/德鲁伊/盗贼", "mysterious"),
    ("平静-法师/牧师/德鲁伊/学者", "calm"),
    ("自信-战士/骑士/圣骑士/商人", "confident"),
    ("温柔-牧师/德鲁伊/学者/女仆", "gentle"),
    ("严肃-战士/骑士/圣骑士", "serious"),
    ("冷酷-战士/盗贼/游侠", "cold"),
    ("微笑-商人/学者/女仆", "smiling"),
    ("优雅-女皇/女王/公主/王后", "elegant"),
    ("威严-女皇/女王/王后", "majestic"),
    ("纯真-公主", "innocent"),
    ("专注-女教师/女医生", "focused"),
    ("艺术-女吟游诗人", "artistic"),
];

const POSES: &[(&str, &str)] = &[
    ("施法-法师/牧师/德鲁伊", "casting"),
    ("冥想-法师/牧师/德鲁伊/学者", "meditating"),
    ("站立-战士/骑士/圣骑士/商人/学者/女仆", "standing"),
    ("战斗姿态-战士/骑士/圣骑士/游侠", "combat stance"),
    ("潜行-盗贼/游侠", "sneaking"),
    ("阅读-法师/学者/女教师", "reading"),
    ("祈祷-牧师/圣骑士", "praying"),
    ("坐姿-女皇/女王/王后", "sitting regally"),
    ("优雅行走-女皇/女王/公主/王后", "walking gracefully"),
    ("服务姿态-女仆", "serving pose"),
    ("教学姿态-女教师", "teaching pose"),
    ("治疗姿态-女医生", "healing pose"),
    ("演奏姿态-女吟游诗人", "performing pose"),
];

const BG_NATURAL: &[(&str, &str)] = &[
    ("月光林地-法师/德鲁伊/游侠", "moonlit grove"),
    ("银色森林-法师/德鲁伊/游侠", "silver forest"),
    ("神圣花园-牧师/圣骑士", "sacred garden"),
    ("古老遗迹-法师/德鲁伊/游侠/学者", "ancient ruins"),
    ("幽暗森林-盗贼/游侠", "dark forest"),
    ("星空平原-牧师/圣骑士/游侠", "starlit plains"),
];

const BG_BUILDING: &[(&str, &str)] = &[
    ("魔法学院-法师/学者", "magical academy"),
    ("星辰塔-法师", "stellar tower"),
    ("大教堂-牧师/圣骑士", "cathedral"),
    ("皇宫-战士/骑士/圣骑士/商人/女皇/女王/王后", "royal palace"),
    ("图书馆-法师/学者/女教师", "library"),
    ("月神殿-牧师/德鲁伊", "lunar temple"),
    ("城堡-战士/骑士/公主", "castle"),
    ("村庄-商人/游侠/女仆", "village"),
    ("医院-女医生", "hospital"),
    ("学校-女教师", "school"),
    ("酒馆-女吟游诗人/商人", "tavern"),
    ("宫殿花园-女皇/女王/公主/王后", "palace garden"),
];

const LIGHTING: &[(&str, &str)] = &[
    ("月光-法师/牧师/德鲁伊/游侠", "moonlight"),
    ("星光-法师/牧师/德鲁伊", "starlight"),
    ("魔法光-法师/德鲁伊", "magical light"),
    ("神圣光-牧师/圣骑士", "divine light"),
    ("阳光-战士/骑士/圣骑士/商人/游侠", "sunlight"),
    ("火光-战士/商人", "flame light"),
    ("烛光-盗贼/学者/女仆/女教师/女吟游诗人", "candlelight"),
    ("宫廷灯光-女皇/女王/公主/王后", "chandelier light"),
    ("柔和光-公主/女仆/女教师/女医生", "soft light"),
];

const ATMOSPHERE: &[(&str, &str)] = &[
    ("神秘-法师/德鲁伊/盗贼", "mystical"),
    ("神圣-牧师/圣骑士", "divine"),
    ("魔法-法师/德鲁伊", "magical"),
    ("史诗-战士/骑士/圣骑士/游侠", "epic"),
    ("浪漫-牧师/骑士/商人", "romantic"),
    ("宁静-牧师/德鲁伊/学者", "peaceful"),
    ("黑暗-盗贼", "dark"),
    ("自然-德鲁伊/游侠", "natural"),
    ("华贵-女皇/女王/公主/王后", "regal"),
    ("温馨-女仆/女教师/女医生", "warm"),
    ("欢快-公主/女吟游诗人", "lively"),
];

const PALETTES: &[(&str, &str)] = &[
    ("银蓝配色-法师/牧师", "silver-blue color scheme"),
    ("白金配色-法师/牧师/圣骑士/女皇/女王", "white-gold color scheme"),
    ("紫罗兰配色-法师", "violet color scheme"),
    ("银绿配色-德鲁伊/游侠", "silver-green color scheme"),
    ("绿棕配色-德鲁伊/游侠", "green-brown color scheme"),
    ("钢红配色-战士", "steel-red color scheme"),
    ("白银配色-骑士/圣骑士/学者", "white-silver color scheme"),
    ("蓝金配色-骑士/学者", "blue-gold color scheme"),
    ("黑紫配色-盗贼", "obsidian-purple color scheme"),
    ("暗绿配色-盗贼/游侠", "dark-green color scheme"),
    ("金棕配色-商人", "gold-brown color scheme"),
    ("皇室紫配色-女皇/女王/王后", "royal purple color scheme"),
    ("粉金配色-公主", "rose-gold color scheme"),
    ("温暖棕配色-女仆", "warm brown color scheme"),
    ("学院蓝配色-女教师", "academy blue color scheme"),
    ("医疗白配色-女医生", "medical white color scheme"),
    ("彩虹配色-女吟游诗人", "rainbow color scheme"),
];

const SHARED_LIBRARY: &[(SharedCategory, &[(&str, &str)])] = &[
    (SharedCategory::Expressions, EXPRESSIONS),
    (SharedCategory::Poses, POSES),
    (SharedCategory::BgNatural, BG_NATURAL),
    (SharedCategory::BgBuilding, BG_BUILDING),
    (SharedCategory::Lighting, LIGHTING),
    (SharedCategory::Atmosphere, ATMOSPHERE),
    (SharedCategory::Palettes, PALETTES),
];

const SHOTS: &[(&str, &str)] = &[
    ("全身", "full body"),
    ("半身", "half body"),
    ("四分之三", "three-quarter view"),
];

const ANGLES: &[(&str, &str)] = &[
    ("平视", "eye level"),
    ("俯视", "slight high angle"),
    ("仰视", "slight low angle"),
];

const COMPOSITIONS: &[(&str, &str)] = &[
    ("优雅构图", "elegant composition"),
    ("对称构图", "symmetric composition"),
    ("三分法", "rule of thirds"),
];

fn attire_profiles() -> Vec<RoleProfile> {
    vec![
        RoleProfile::new(
            "法师",
            vec![
                AttireSet::new(
                    "奥术华服",
                    "luxurious robes, arcane garments, enchanted silk, wizard hat, ornate staff, spellbook, glowing runes, silk gloves, arcane sash, jeweled pendant, mystical accessories",
                    "tattered black robes, corrupted arcane garments, frayed silk, thorned wizard hat, cracked staff, chained spellbook, bleeding crimson runes, black gloves, torn sash, cursed pendant, ominous accessories",
                ),
                AttireSet::new(
                    "绣纹法袍",
                    "elegant mage attire, embroidered robe, arcane sigils, crystal staff, floating grimoire, velvet cape, silk inner layers, rune earrings, belt pouches, talisman necklace, arcane jewelry",
                    "shadowed mage attire, ash-stained robe, burning sigils, blackened crystal staff, whispering grimoire, ragged velvet cape, smoke-stained layers, bone earrings, belt of vials, hex talisman, cursed jewelry",
                ),
                AttireSet::new(
                    "大法术师套装",
                    "high sorceress ensemble, satin robe, gilded trims, ornate wand, tome with clasps, brocade cape, beaded cords, magical rings, arcane brooch, spell components, mystical ornaments",
                    "fallen sorceress ensemble, charred satin robe, tarnished trims, splintered wand, tome bound in chains, torn brocade cape, knotted cords, obsidian rings, cracked brooch, forbidden components, sinister ornaments",
                ),
            ],
        ),
        RoleProfile::new(
            "牧师",
            vec![
                AttireSet::new(
                    "圣职礼装",
                    "holy vestments, blessed robes, ceremonial attire, gilded crosier, holy symbol, rosary beads, silk stole, embroidered trim, reliquary pendant, lace gloves, sacred accessories",
                    "desecrated vestments, soot-stained robes, ruined ceremonial attire, broken crosier, inverted holy symbol, rosary of black beads, torn stole, unraveling trim, empty reliquary, stained gloves, profane accessories",
                ),
                AttireSet::new(
                    "神圣典仪",
                    "divine ceremonial set, luminous robe, golden embroidery, ornate staff, prayer book, beaded rosary, ribboned sash, veil, signet ring, halo accessory, sanctified ornaments",
                    "heretical ceremonial set, dimmed robe, tarnished embroidery, thorned staff, burned prayer book, cracked rosary, black ribbon sash, torn veil, rusted signet ring, shattered halo, defiled ornaments",
                ),
            ],
        ),
        RoleProfile::new(
            "德鲁伊",
            vec![
                AttireSet::new(
                    "自然法袍",
                    "druidic robes, nature garb, ranger cloak, oak staff, vine adornments, glowing leaves, leather satchel, wooden talisman, bead necklace, nature charms, feather accents",
                    "withered druidic robes, blighted garb, moth-eaten cloak, rotting oak staff, thorned vines, dead leaves, mildewed satchel, split talisman, bone necklace, blighted charms, black feather accents",
                ),
                AttireSet::new(
                    "林地祭司",
                    "forest priestess outfit, leaf-embroidered mantle, braided cords, carved staff, seed pouch, bark wristbands, moss trim, antler pin, woven belt, herbal kit, natural trinkets",
                    "blighted priestess outfit, decaying mantle, knotted cords, gnarled staff, pouch of poisoned seeds, rotting wristbands, fungal trim, broken antler pin, frayed belt, toxic herbal kit, cursed trinkets",
                ),
            ],
        ),
        RoleProfile::new(
            "战士",
            vec![
                AttireSet::new(
                    "纹章钢甲",
                    "ornate plate armor, gilded chainmail, armored surcoat, longsword, scabbard, banner tassels, metal gorget, leather belts, riveted gauntlets, crest brooch, battlefield accessories",
                    "blackened plate armor, rusted chainmail, bloodstained surcoat, jagged longsword, cracked scabbard, burned banner tassels, spiked gorget, worn belts, clawed gauntlets, defaced crest, grim battlefield accessories",
                ),
                AttireSet::new(
                    "典仪武备",
                    "ceremonial warrior gear, polished breastplate, engraved pauldrons, greatsword, dagger, cloak clasp, heraldic tabard, belt pouches, thigh guards, cape, knightly ornaments",
                    "dread warrior gear, scarred breastplate, spiked pauldrons, serrated greatsword, bone dagger, skull cloak clasp, torn tabard, belt of trophies, dented thigh guards, tattered cape, sinister ornaments",
                ),
            ],
        ),
        RoleProfile::new(
            "骑士",
            vec![
                AttireSet::new(
                    "骑士纹章装",
                    "full plate armor, heraldic surcoat, ornate shield, rapier, cape, plume helm, leather straps, engraved vambraces, silk scarf, crest medallion, chivalric accessories",
                    "death knight plate armor, defaced surcoat, cracked shield, blackened rapier, smoldering cape, horned helm, chain straps, etched vambraces, ashen scarf, broken crest medallion, oathbreaker accessories",
                ),
                AttireSet::new(
                    "比武甲饰",
                    "tournament armor, polished cuirass, lance, buckler, sash, embroidered cape, plume, signet ring, scabbard, chain belt, ceremonial knight ornaments",
                    "fallen champion armor, tarnished cuirass, splintered lance, dented buckler, black sash, burned cape, wilted plume, rusted signet ring, cracked scabbard, heavy chain belt, forsaken knight ornaments",
                ),
            ],
        ),
        RoleProfile::new(
            "盗贼",
            vec![
                AttireSet::new(
                    "暗影皮装",
                    "leather armor, dark cloak, hood, dagger, shortsword, lockpicks, throwing knives, belt pouches, fingerless gloves, face mask, stealth accessories",
                    "scarred leather armor, smoke-black cloak, deep hood, poisoned dagger, notched shortsword, bloodied lockpicks, barbed throwing knives, belt of vials, torn gloves, skull face mask, assassin accessories",
                ),
                AttireSet::new(
                    "潜行者套装",
                    "shadowy outfit, fitted leathers, hidden blades, smoke vials, grappling hook, soft boots, wrist sheath, utility belt, cloak pin, shadow emblem, rogue ornaments",
                    "abyssal outfit, cracked leathers, venomous blades, black smoke vials, barbed grappling hook, silent boots, wrist sheath, bandolier of poisons, bone cloak pin, cult emblem, sinister rogue ornaments",
                ),
            ],
        ),
        RoleProfile::new(
            "游侠",
            vec![
                AttireSet::new(
                    "林行者装束",
                    "ranger outfit, forest cloak, leather armor, bow, quiver, hunter tools, thigh strap, bracers, hood, utility pouches, trail accessories",
                    "wraith ranger outfit, ragged cloak, weathered armor, bone bow, quiver of black arrows, grim hunter tools, thigh strap, thorned bracers, shadowed hood, trophy pouches, grim trail accessories",
                ),
                AttireSet::new(
                    "荒野斥候",
                    "woodland scout set, green mantle, reinforced leathers, shortbow, arrow case, knife, arm guard, waterproof cloak, rope, map tube, ranger ornaments",
                    "blighted scout set, grey mantle, scarred leathers, twisted shortbow, arrow case, serrated knife, spiked arm guard, mud-caked cloak, frayed rope, scorched map tube, haunted ranger ornaments",
                ),
            ],
        ),
        RoleProfile::new(
            "圣骑士",
            vec![
                AttireSet::new(
                    "神圣卫甲",
                    "holy plate, divine armor, ceremonial gear, longsword, blessed shield, sacred sigil, tabard, chain belt, silk lining, cape, sanctified accessories",
                    "corrupted plate, blackened armor, ruined ceremonial gear, cursed longsword, cracked shield, defiled sigil, burned tabard, chain belt, rotting lining, ragged cape, profane accessories",
                ),
                AttireSet::new(
                    "光辉骑誓",
                    "radiant paladin set, polished mail, greatsword, reliquary, heraldic cape, white gloves, sash, brooch, circlet, prayer book, holy ornaments",
                    "oathbroken paladin set, tarnished mail, runed greatsword, shattered reliquary, torn heraldic cape, ash-grey gloves, black sash, cracked brooch, thorned circlet, burned prayer book, unholy ornaments",
                ),
            ],
        ),
        RoleProfile::new(
            "商人",
            vec![
                AttireSet::new(
                    "行商精饰",
                    "merchant attire, traveling gear, silk garments, coin pouch, ledger, signet ring, scarf, satchel, waist purse, seal stamp, trade accessories",
                    "smuggler attire, worn traveling gear, stained garments, pouch of cursed coins, black ledger, forged signet ring, moth-eaten scarf, hidden satchel, heavy purse, counterfeit seal, shady trade accessories",
                ),
                AttireSet::new(
                    "商旅华装",
                    "caravan finery, tailored vest, silk blouse, ledger book, quill case, coin strings, lace gloves, brooch, necklace, belt bag, refined ornaments",
                    "black market finery, dark vest, faded blouse, ledger of debts, bone quill case, coin strings, black gloves, serpent brooch, poison-vial necklace, belt bag, sinister ornaments",
                ),
            ],
        ),
        RoleProfile::new(
            "学者",
            vec![
                AttireSet::new(
                    "学院书装",
                    "scholar robes, academic gown, library attire, books, quill, scroll case, ribbon bookmarks, spectacles, chain necklace, cuffed sleeves, scholarly accessories",
                    "heretic scholar robes, ink-blackened gown, forbidden library attire, cursed books, bone quill, sealed scroll case, black ribbon bookmarks, cracked spectacles, chain necklace, burned sleeves, occult accessories",
                ),
                AttireSet::new(
                    "研究者套衫",
                    "researcher set, tailored robe, ink-stained cuffs, notebook, feather quill, document tube, seal wax, lace collar, velvet ribbon, satchel, academic ornaments",
                    "obsessed researcher set, stained robe, ink-stained cuffs, notebook of sigils, black feather quill, document tube, blood-red seal wax, torn collar, black ribbon, satchel of relics, occult ornaments",
                ),
            ],
        ),
        RoleProfile::new(
            "女皇",
            vec![
                AttireSet::new(
                    "帝国华服",
                    "imperial regalia, ornate crown, royal scepter, ermine cape, silk gown, golden embroidery, jeweled belt, royal rings, ceremonial gloves, pearl necklace, imperial ornaments",
                    "tyrant regalia, iron crown, obsidian scepter, black fur cape, dark silk gown, tarnished embroidery, spiked belt, blood ruby rings, black gloves, black pearl necklace, despotic ornaments",
                ),
                AttireSet::new(
                    "威严龙袍",
                    "majestic dragon robe, imperial crown, jade scepter, phoenix embroidery, silk train, golden threads, royal brooch, ceremonial bracers, signet ring, court jewelry, sovereign accessories",
                    "shadow dragon robe, thorned crown, cracked jade scepter, burning phoenix embroidery, smoldering train, black threads, serpent brooch, spiked bracers, signet ring, cursed court jewelry, tyrannical accessories",
                ),
            ],
        ),
        RoleProfile::new(
            "女王",
            vec![
                AttireSet::new(
                    "王室礼服",
                    "royal gown, jeweled tiara, royal staff, velvet mantle, court dress, silver embroidery, royal sash, ceremonial gloves, crown jewels, pearl earrings, regal accessories",
                    "dark queen gown, thorned tiara, bone staff, black velvet mantle, shadowed court dress, tarnished embroidery, black sash, black gloves, cursed crown jewels, obsidian earrings, sinister regal accessories",
                ),
                AttireSet::new(
                    "统治华装",
                    "sovereign attire, golden circlet, ceremonial rod, brocade robe, royal insignia, silk lining, jeweled clasp, formal gloves, royal pendant, court ornaments, majestic accessories",
                    "usurper attire, iron circlet, rod of dominion, ash-grey brocade robe, defaced insignia, black lining, skull clasp, formal gloves, cursed pendant, court ornaments, ominous accessories",
                ),
            ],
        ),
        RoleProfile::new(
            "公主",
            vec![
                AttireSet::new(
                    "公主裙装",
                    "princess gown, delicate tiara, fairy tale dress, silk ribbons, lace trim, pearl accessories, satin gloves, flower crown, jeweled brooch, court shoes, innocent ornaments",
                    "cursed princess gown, tarnished tiara, torn fairy tale dress, black ribbons, frayed lace trim, black pearl accessories, stained gloves, wilted flower crown, cracked brooch, ash-covered shoes, melancholic ornaments",
                ),
                AttireSet::new(
                    "花园礼服",
                    "garden party dress, floral tiara, pastel gown, ribbon sash, embroidered flowers, pearl necklace, lace gloves, hair ribbons, delicate jewelry, garden accessories, youthful ornaments",
                    "funeral garden dress, dead-flower tiara, faded gown, black ribbon sash, embroidered thorns, black pearl necklace, torn lace gloves, black hair ribbons, tarnished jewelry, withered garden accessories, mournful ornaments",
                ),
            ],
        ),
        RoleProfile::new(
            "王后",
            vec![
                AttireSet::new(
                    "后冠华服",
                    "queen consort gown, ornate crown, royal mantle, ceremonial dress, golden embroidery, royal jewels, silk gloves, court sash, regal necklace, formal accessories, queenly ornaments",
                    "widowed queen gown, blackened crown, mourning mantle, dark ceremonial dress, tarnished embroidery, cursed jewels, black gloves, court sash, jet necklace, formal accessories, baleful ornaments",
                ),
                AttireSet::new(
                    "宫廷盛装",
                    "court regalia, jeweled diadem, state robe, formal gown, silver threading, royal brooch, ceremonial bracers, court gloves, pendant necklace, palace jewelry, dignified accessories",
                    "shadow court regalia, obsidian diadem, ashen state robe, dark formal gown, tarnished threading, serpent brooch, spiked bracers, court gloves, cursed pendant, palace jewelry, menacing accessories",
                ),
            ],
        ),
        RoleProfile::new(
            "女仆",
            vec![
                AttireSet::new(
                    "女仆制服",
                    "maid uniform, white apron, black dress, lace headband, white stockings, mary jane shoes, feather duster, cleaning supplies, service bell, uniform accessories, domestic ornaments",
                    "haunted maid uniform, stained apron, tattered black dress, torn headband, grey stockings, scuffed shoes, broken feather duster, rusted keys, cracked service bell, uniform accessories, ghostly ornaments",
                ),
                AttireSet::new(
                    "管家装束",
                    "head maid attire, formal apron, long dress, service cap, white gloves, pocket watch, key ring, silver tray, uniform brooch, service accessories, professional ornaments",
                    "cursed manor attire, ash-grey apron, mourning dress, black service cap, stained gloves, stopped pocket watch, ring of iron keys, tarnished tray, skull brooch, service accessories, eerie ornaments",
                ),
            ],
        ),
        RoleProfile::new(
            "女教师",
            vec![
                AttireSet::new(
                    "教师套装",
                    "teacher outfit, formal blazer, long skirt, white blouse, reading glasses, lesson plan, chalk, pointer stick, book bag, academic accessories, educational ornaments",
                    "sinister teacher outfit, black blazer, long dark skirt, grey blouse, cracked glasses, occult lesson plan, bone chalk, thorned pointer stick, book bag, academic accessories, ominous ornaments",
                ),
                AttireSet::new(
                    "学院制服",
                    "academy uniform, scholarly robe, formal dress, graduation cap, textbooks, quill pen, ink bottle, academic medal, school badge, educational jewelry, scholarly accessories",
                    "forbidden academy uniform, shadowed robe, dark formal dress, black graduation cap, forbidden textbooks, bone quill pen, bottle of black ink, tarnished medal, defaced badge, cursed jewelry, occult accessories",
                ),
            ],
        ),
        RoleProfile::new(
            "女医生",
            vec![
                AttireSet::new(
                    "医师白袍",
                    "doctor coat, medical uniform, stethoscope, medical bag, surgical gloves, name badge, clipboard, medical instruments, white shoes, medical accessories, healthcare ornaments",
                    "plague doctor coat, stained uniform, rusted stethoscope, bag of strange tonics, black gloves, scratched badge, clipboard of experiments, crude instruments, dark boots, plague accessories, macabre ornaments",
                ),
                AttireSet::new(
                    "治疗师装",
                    "healer robes, medical sash, herb pouch, healing crystals, bandages, medicine bottles, treatment tools, white gloves, medical pendant, healing accessories, therapeutic ornaments",
                    "blood mage robes, crimson sash, pouch of nightshade, dark crystals, bloodied bandages, poison bottles, ritual tools, black gloves, vial pendant, hexing accessories, macabre ornaments",
                ),
            ],
        ),
        RoleProfile::new(
            "女吟游诗人",
            vec![
                AttireSet::new(
                    "吟游装束",
                    "bard outfit, colorful cloak, musical instrument, feathered hat, performance costume, song sheets, lute strings, artistic accessories, performance jewelry, entertainer ornaments, creative accessories",
                    "banshee bard outfit, faded cloak, cracked instrument, black feathered hat, tattered costume, dirge sheets, snapped lute strings, haunted accessories, tarnished jewelry, spectral ornaments, mournful accessories",
                ),
                AttireSet::new(
                    "艺术家服",
                    "artist attire, paint-stained apron, creative tools, sketch pad, color palette, brushes, artistic beret, canvas bag, inspiration jewelry, creative accessories, bohemian ornaments",
                    "haunted artist attire, ink-black apron, cursed tools, sketch pad of nightmares, ashen color palette, bone brushes, black beret, torn canvas bag, obsession jewelry, eerie accessories, gothic ornaments",
                ),
            ],
        ),
    ]
}

fn substitutions() -> Substitutions {
    Substitutions {
        expressions: mapping(&[
            ("mysterious", "sinister mystery"),
            ("calm", "cold detachment"),
            ("confident", "arrogant cruelty"),
            ("gentle", "hollow gentleness"),
            ("serious", "grim fury"),
            ("cold", "merciless glare"),
            ("smiling", "twisted smile"),
            ("elegant", "dark elegance"),
            ("majestic", "tyrannical majesty"),
            ("innocent", "lost innocence"),
            ("focused", "obsessive focus"),
            ("artistic", "haunted gaze"),
        ]),
        poses: mapping(&[
            ("casting", "casting forbidden magic"),
            ("meditating", "brooding in a dark trance"),
            ("standing", "looming stance"),
            ("combat stance", "menacing combat stance"),
            ("sneaking", "stalking"),
            ("reading", "reading a forbidden tome"),
            ("praying", "kneeling before a dark altar"),
            ("sitting regally", "sitting on a dark throne"),
            ("walking gracefully", "walking through ashes"),
            ("serving pose", "hollow-eyed serving pose"),
            ("teaching pose", "sinister lecturing pose"),
            ("healing pose", "draining life pose"),
            ("performing pose", "playing a dirge"),
        ]),
        lighting: mapping(&[
            ("moonlight", "blood moonlight"),
            ("starlight", "dying starlight"),
            ("magical light", "sickly green magical light"),
            ("divine light", "profane glow"),
            ("sunlight", "eclipsed sunlight"),
            ("flame light", "hellfire light"),
            ("candlelight", "guttering candlelight"),
            ("chandelier light", "cold chandelier light"),
            ("soft light", "dim grey light"),
        ]),
        atmosphere: mapping(&[
            ("mystical", "ominous"),
            ("divine", "desecrated"),
            ("magical", "eldritch"),
            ("epic", "apocalyptic"),
            ("romantic", "tragic"),
            ("peaceful", "eerie stillness"),
            ("dark", "abyssal darkness"),
            ("natural", "withered nature"),
            ("regal", "decadent"),
            ("warm", "unsettling"),
            ("lively", "macabre"),
        ]),
        attire_phrases: [
            ("silver-blue color scheme", "ashen blue color scheme"),
            ("white-gold color scheme", "tarnished gold and black color scheme"),
            ("violet color scheme", "deep violet and black color scheme"),
            ("white-silver color scheme", "blackened silver color scheme"),
            ("blue-gold color scheme", "midnight blue and rust color scheme"),
            ("royal purple color scheme", "bruised purple color scheme"),
            ("rose-gold color scheme", "withered rose color scheme"),
            ("warm brown color scheme", "ash brown color scheme"),
            ("academy blue color scheme", "ink black color scheme"),
            ("medical white color scheme", "stained white color scheme"),
            ("rainbow color scheme", "faded grey color scheme"),
        ]
        .into_iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_template_is_consistent() {
        let template = CharacterTemplate::builtin().expect("builtin template");
        let report = template.validate();
        assert!(report.is_ok(), "unexpected errors: {report}");
        assert!(report.warnings.is_empty(), "unexpected warnings: {:?}", report.warnings);
    }

    #[test]
    fn shared_library_reaches_profiles() {
        let template = CharacterTemplate::builtin().expect("builtin template");
        let mage = template.profile("法师").expect("mage profile");
        assert!(mage.expressions.contains(&"mysterious".to_string()));
        assert!(mage.palettes.contains(&"violet color scheme".to_string()));
        assert_eq!(mage.attire_sets.len(), 3);
    }

    #[test]
    fn unknown_role_falls_back_to_default_profile() {
        let template = CharacterTemplate::builtin().expect("builtin template");
        let profile = template.profile("吟唱者").expect("fallback profile");
        assert_eq!(profile.role, DEFAULT_ROLE);
    }

    #[test]
    fn constraint_with_unknown_race_is_rejected() {
        let mut template = CharacterTemplate::builtin().expect("builtin template");
        template.constraints =
            RoleConstraints::from_encoded(&[("贵族", &["骑士-人类/矮人", "战士-人类"])])
                .expect("parse constraints");
        let err = CharacterTemplate::build(template).expect_err("unknown race must fail");
        match err {
            TemplateError::Invalid(report) => assert!(report.has_code("unknown_race")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn role_without_profile_is_a_warning() {
        let mut template = CharacterTemplate::builtin().expect("builtin template");
        template.profiles.remove("女医生");
        let report = template.validate();
        assert!(report.is_ok());
        assert!(report.has_code("missing_profile"));
    }
}
