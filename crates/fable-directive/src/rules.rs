//! Directive keyword tables for both dialects.
//!
//! Line dialect: an ordered table of `(regex, kind, payload shape)` rules,
//! built once. Entity rows come from [`ENTITY_KEYWORDS`] so every entity kind
//! gets the same register/update/delete treatment.
//!
//! Block dialect: action names from the same table, plus the `update`
//! paths for the narrative fields.

use std::sync::LazyLock;

use fable_core::EntityKind;
use regex::Regex;

use crate::command::CommandKind;

/// How a directive's text after the separator is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    /// Plain text on the same line.
    Scalar,
    /// A JSON object, possibly spanning several lines.
    Json,
    /// Plain text, or a JSON object if the text opens with `{`.
    ScalarOrJson,
}

/// Keywords and block actions for one entity kind.
#[derive(Debug, Clone, Copy)]
pub struct EntityKeywords {
    /// Collection.
    pub kind: EntityKind,
    /// Line keyword for register.
    pub register: &'static str,
    /// Line keyword for update.
    pub update: &'static str,
    /// Line keyword for delete.
    pub delete: &'static str,
    /// Block action for register.
    pub register_action: &'static str,
    /// Block action for update.
    pub update_action: &'static str,
    /// Block action for delete.
    pub delete_action: &'static str,
}

const fn row(
    kind: EntityKind,
    line: [&'static str; 3],
    block: [&'static str; 3],
) -> EntityKeywords {
    EntityKeywords {
        kind,
        register: line[0],
        update: line[1],
        delete: line[2],
        register_action: block[0],
        update_action: block[1],
        delete_action: block[2],
    }
}

/// Per-kind keyword table.
pub const ENTITY_KEYWORDS: &[EntityKeywords] = &[
    row(
        EntityKind::Event,
        ["注册事件", "更新事件", "删除事件"],
        ["registerEvent", "updateEvent", "deleteEvent"],
    ),
    row(
        EntityKind::Foreshadowing,
        ["添加伏笔", "更新伏笔", "删除伏笔"],
        ["addForeshadowing", "updateForeshadowing", "removeForeshadowing"],
    ),
    row(
        EntityKind::Character,
        ["注册角色", "更新角色", "删除角色"],
        ["registerCharacter", "updateCharacter", "deleteCharacter"],
    ),
    row(
        EntityKind::Item,
        ["添加物品", "更新物品", "删除物品"],
        ["addItem", "updateItem", "removeItem"],
    ),
    row(
        EntityKind::Property,
        ["添加资产", "更新资产", "删除资产"],
        ["addAsset", "updateAsset", "removeAsset"],
    ),
    row(
        EntityKind::Knowledge,
        ["添加知识", "更新知识", "删除知识"],
        ["addKnowledge", "updateKnowledge", "removeKnowledge"],
    ),
    row(
        EntityKind::Location,
        ["添加地点", "更新地点", "删除地点"],
        ["addLocation", "updateLocation", "removeLocation"],
    ),
];

/// Keywords for the non-entity line directives.
const NARRATIVE_KEYWORDS: &[(&str, CommandKind, PayloadShape)] = &[
    ("节拍操作", CommandKind::BeatOperation, PayloadShape::Scalar),
    ("(?:当前)?景深等级", CommandKind::DepthLevel, PayloadShape::Scalar),
    ("当前时间", CommandKind::SetTime, PayloadShape::Scalar),
    ("完成成就", CommandKind::CompleteAchievement, PayloadShape::Scalar),
    ("显示成就", CommandKind::ShowAchievement, PayloadShape::Scalar),
    ("添加角色做过的事", CommandKind::AppendHistory, PayloadShape::ScalarOrJson),
];

/// One line-dialect rule.
#[derive(Debug)]
pub struct LineRule {
    /// Matches a whole line; group 1 is the text after the separator.
    pub pattern: Regex,
    /// Command produced.
    pub kind: CommandKind,
    /// How to read the payload.
    pub shape: PayloadShape,
}

fn line_rule(keyword: &str, kind: CommandKind, shape: PayloadShape) -> Option<LineRule> {
    let pattern = Regex::new(&format!(r"^\s*(?:{keyword})\s*[：:]\s*(.*?)\s*$"));
    match pattern {
        Ok(pattern) => Some(LineRule {
            pattern,
            kind,
            shape,
        }),
        Err(e) => {
            tracing::error!(keyword, error = %e, "directive pattern failed to compile");
            None
        }
    }
}

/// The ordered line-dialect rule table.
pub static LINE_RULES: LazyLock<Vec<LineRule>> = LazyLock::new(|| {
    let narrative = NARRATIVE_KEYWORDS
        .iter()
        .filter_map(|(kw, kind, shape)| line_rule(kw, kind.clone(), *shape));
    let entities = ENTITY_KEYWORDS.iter().flat_map(|row| {
        [
            line_rule(row.register, CommandKind::Register(row.kind), PayloadShape::Json),
            line_rule(row.update, CommandKind::Update(row.kind), PayloadShape::Json),
            line_rule(row.delete, CommandKind::Delete(row.kind), PayloadShape::Scalar),
        ]
        .into_iter()
        .flatten()
    });
    narrative.chain(entities).collect()
});

/// First rule matching `line`, with the captured payload text.
pub fn match_line(line: &str) -> Option<(&'static LineRule, &str)> {
    LINE_RULES.iter().find_map(|rule| {
        let caps = rule.pattern.captures(line)?;
        let text = caps.get(1).map_or("", |m| m.as_str());
        Some((rule, text))
    })
}

/// Block `update` paths and the command each one maps to.
const UPDATE_PATHS: &[(&str, CommandKind)] = &[
    ("narrative.storyBeatOperation", CommandKind::BeatOperation),
    ("narrative.depthLevel", CommandKind::DepthLevel),
    ("metadata.currentTime", CommandKind::SetTime),
];

/// Map a block record's `action` (and `path`, for `update`) to a command kind.
pub fn block_kind(action: &str, path: Option<&str>) -> CommandKind {
    match action {
        "update" => {
            let path = path.unwrap_or_default();
            UPDATE_PATHS
                .iter()
                .find(|(p, _)| *p == path)
                .map(|(_, kind)| kind.clone())
                .unwrap_or_else(|| CommandKind::Unknown(format!("update {path}")))
        }
        "completeAchievement" => CommandKind::CompleteAchievement,
        "showAchievement" => CommandKind::ShowAchievement,
        "addCharacterThingDone" => CommandKind::AppendHistory,
        _ => ENTITY_KEYWORDS
            .iter()
            .find_map(|row| {
                if action == row.register_action {
                    Some(CommandKind::Register(row.kind))
                } else if action == row.update_action {
                    Some(CommandKind::Update(row.kind))
                } else if action == row.delete_action {
                    Some(CommandKind::Delete(row.kind))
                } else {
                    None
                }
            })
            .unwrap_or_else(|| CommandKind::Unknown(action.to_string())),
    }
}
