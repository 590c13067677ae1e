//! Add/edit form for a single loot entry.
//!
//! Fields are kept as text until submit, so a half-filled form can be shown
//! and edited. [`LootForm::validate`] turns it into a [`LootEntry`].

use crate::error::{LootError, Result};
use crate::models::{LootEntry, LootRow};
use std::fmt;

/// Editable fields of a loot form, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Id,
    LootPackId,
    ItemId,
    DropRate,
    MinAmount,
    MaxAmount,
    GradeId,
    Group,
}

impl FormField {
    pub const ALL: [FormField; 8] = [
        FormField::Id,
        FormField::LootPackId,
        FormField::ItemId,
        FormField::DropRate,
        FormField::MinAmount,
        FormField::MaxAmount,
        FormField::GradeId,
        FormField::Group,
    ];

    pub fn column(self) -> &'static str {
        match self {
            FormField::Id => "id",
            FormField::LootPackId => "loot_pack_id",
            FormField::ItemId => "item_id",
            FormField::DropRate => "drop_rate",
            FormField::MinAmount => "min_amount",
            FormField::MaxAmount => "max_amount",
            FormField::GradeId => "grade_id",
            FormField::Group => "group",
        }
    }

    pub fn from_column(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.column() == name)
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LootForm {
    pub id: String,
    pub loot_pack_id: String,
    pub item_id: String,
    pub drop_rate: String,
    pub min_amount: String,
    pub max_amount: String,
    pub grade_id: String,
    pub group: String,
    pub always_drop: bool,
}

impl LootForm {
    /// Empty form carrying only a proposed id.
    pub fn with_id(id: i32) -> Self {
        Self {
            id: id.to_string(),
            ..Self::default()
        }
    }

    /// Form prefilled from an existing row.
    pub fn from_row(row: &LootRow) -> Self {
        let e = &row.entry;
        Self {
            id: e.id.to_string(),
            loot_pack_id: e.loot_pack_id.to_string(),
            item_id: e.item_id.to_string(),
            drop_rate: e.drop_rate.to_string(),
            min_amount: e.min_amount.to_string(),
            max_amount: e.max_amount.to_string(),
            grade_id: e.grade_id.to_string(),
            group: e.group.to_string(),
            always_drop: e.always_drop,
        }
    }

    pub fn field(&self, field: FormField) -> &str {
        match field {
            FormField::Id => &self.id,
            FormField::LootPackId => &self.loot_pack_id,
            FormField::ItemId => &self.item_id,
            FormField::DropRate => &self.drop_rate,
            FormField::MinAmount => &self.min_amount,
            FormField::MaxAmount => &self.max_amount,
            FormField::GradeId => &self.grade_id,
            FormField::Group => &self.group,
        }
    }

    pub fn set(&mut self, field: FormField, value: impl Into<String>) {
        let value = value.into();
        match field {
            FormField::Id => self.id = value,
            FormField::LootPackId => self.loot_pack_id = value,
            FormField::ItemId => self.item_id = value,
            FormField::DropRate => self.drop_rate = value,
            FormField::MinAmount => self.min_amount = value,
            FormField::MaxAmount => self.max_amount = value,
            FormField::GradeId => self.grade_id = value,
            FormField::Group => self.group = value,
        }
    }

    /// Apply a `column=value` assignment. `always_drop` takes a boolean-ish value.
    /// The id is fixed by the session and is rejected here.
    pub fn assign(&mut self, assignment: &str) -> Result<()> {
        let (name, value) = assignment.split_once('=').ok_or_else(|| {
            LootError::Validation(format!("Expected column=value, got {:?}", assignment))
        })?;
        let name = name.trim();
        let value = value.trim();

        if name == "always_drop" {
            self.always_drop = parse_flag(value)?;
            return Ok(());
        }

        let field = FormField::from_column(name)
            .ok_or_else(|| LootError::Validation(format!("Unknown column: {}", name)))?;
        if field == FormField::Id {
            return Err(LootError::Validation("The id of a loot entry cannot be edited".to_string()));
        }
        self.set(field, value);
        Ok(())
    }

    /// Check the form and build an entry. The id field is not user-editable
    /// and is only checked for being a number.
    pub fn validate(&self) -> Result<LootEntry> {
        let any_blank = FormField::ALL
            .iter()
            .filter(|f| **f != FormField::Id)
            .any(|f| self.field(*f).trim().is_empty());
        if any_blank {
            return Err(LootError::Validation("All fields must be filled.".to_string()));
        }

        let int = |field: FormField| -> Result<i32> {
            self.field(field).trim().parse().map_err(|_| {
                LootError::Validation(format!(
                    "{} must be a whole number, got {:?}",
                    field,
                    self.field(field)
                ))
            })
        };

        Ok(LootEntry {
            id: int(FormField::Id)?,
            loot_pack_id: int(FormField::LootPackId)?,
            item_id: int(FormField::ItemId)?,
            drop_rate: int(FormField::DropRate)?,
            min_amount: int(FormField::MinAmount)?,
            max_amount: int(FormField::MaxAmount)?,
            grade_id: int(FormField::GradeId)?,
            group: int(FormField::Group)?,
            always_drop: self.always_drop,
        })
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "t" | "true" | "1" | "yes" | "y" => Ok(true),
        "f" | "false" | "0" | "no" | "n" => Ok(false),
        _ => Err(LootError::Validation(format!("always_drop must be true or false, got {:?}", value))),
    }
}
