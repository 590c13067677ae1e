//! Data models for the loots table.

use serde::Serialize;

/// Display name used when an item id has no catalog entry.
pub const UNKNOWN_ITEM_NAME: &str = "Unknown";

/// One row of the `loots` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LootEntry {
    pub id: i32,
    pub loot_pack_id: i32,
    pub item_id: i32,
    pub drop_rate: i32,
    pub min_amount: i32,
    pub max_amount: i32,
    pub grade_id: i32,
    pub group: i32,
    pub always_drop: bool,
}

/// A loot entry joined with the catalog name of its item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LootRow {
    pub entry: LootEntry,
    pub display_name: String,
}

/// Flat view of a row for export, columns in grid order.
#[derive(Debug, Clone, Serialize)]
pub struct LootRecord<'a> {
    pub id: i32,
    pub loot_pack_id: i32,
    pub item_id: i32,
    pub name: &'a str,
    pub drop_rate: i32,
    pub min_amount: i32,
    pub max_amount: i32,
    pub always_drop: bool,
    pub grade_id: i32,
    pub group: i32,
}

impl<'a> From<&'a LootRow> for LootRecord<'a> {
    fn from(row: &'a LootRow) -> Self {
        let e = &row.entry;
        Self {
            id: e.id,
            loot_pack_id: e.loot_pack_id,
            item_id: e.item_id,
            name: &row.display_name,
            drop_rate: e.drop_rate,
            min_amount: e.min_amount,
            max_amount: e.max_amount,
            always_drop: e.always_drop,
            grade_id: e.grade_id,
            group: e.group,
        }
    }
}

/// Encode the always-drop flag the way existing databases store it.
pub fn encode_always_drop(value: bool) -> &'static str {
    if value { "t" } else { "f" }
}

/// Decode a stored always-drop flag. Only `t`/`true` (any case) mean true.
pub fn decode_always_drop(raw: Option<&str>) -> bool {
    match raw {
        Some(text) => text.eq_ignore_ascii_case("t") || text.eq_ignore_ascii_case("true"),
        None => false,
    }
}
