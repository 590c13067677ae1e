//! Editor session: the state behind the loot grid.
//!
//! Holds the open store, the rows currently loaded, an optional search view
//! over them and the current selection. Front ends call these commands and
//! render [`EditorSession::visible_rows`]; nothing here touches the terminal.

use crate::config::SessionConfig;
use crate::database::{DEFAULT_DATABASE_FILE, LootStore};
use crate::error::{LootError, Result};
use crate::filter::{FilterOutcome, SearchTerm, filter_rows};
use crate::form::LootForm;
use crate::models::{LootEntry, LootRow};
use std::path::{Path, PathBuf};

/// Active search over the loaded rows.
#[derive(Debug, Clone)]
pub struct ActiveFilter {
    pub term: SearchTerm,
    /// Indices into the loaded rows.
    pub matches: Vec<usize>,
}

#[derive(Debug)]
pub struct EditorSession {
    config: SessionConfig,
    catalog_path: PathBuf,
    store: Option<LootStore>,
    rows: Vec<LootRow>,
    filter: Option<ActiveFilter>,
    selected: Option<usize>,
    last_selected: Option<usize>,
}

/// Resolve a user-picked location to a database file. Directories are
/// searched for the conventional file name.
pub fn resolve_database_path(location: &Path) -> Result<PathBuf> {
    let candidate = if location.is_dir() {
        location.join(DEFAULT_DATABASE_FILE)
    } else {
        location.to_path_buf()
    };
    if candidate.is_file() {
        Ok(candidate)
    } else {
        Err(LootError::DatabaseNotFound(candidate))
    }
}

impl EditorSession {
    /// New session with no database open.
    pub fn new(config: SessionConfig, catalog_path: impl Into<PathBuf>) -> Self {
        Self {
            config,
            catalog_path: catalog_path.into(),
            store: None,
            rows: Vec::new(),
            filter: None,
            selected: None,
            last_selected: None,
        }
    }

    /// Open the database saved in the config file, if it still exists.
    /// Returns whether a database was opened.
    pub fn restore(&mut self) -> Result<bool> {
        let Some(db_path) = self.config.read_database_path()? else {
            return Ok(false);
        };
        if !db_path.is_file() {
            tracing::info!("Saved database {} no longer exists", db_path.display());
            return Ok(false);
        }
        self.attach(db_path, false)?;
        Ok(true)
    }

    /// Open a database file or a folder containing one, and remember it in the config.
    pub fn open(&mut self, location: &Path) -> Result<&Path> {
        let db_path = resolve_database_path(location)?;
        self.attach(db_path, true)?;
        Ok(self.store()?.db_path())
    }

    /// Use a database for this session only, without touching the config file.
    pub fn open_transient(&mut self, location: &Path) -> Result<()> {
        let db_path = resolve_database_path(location)?;
        self.attach(db_path, false)
    }

    fn attach(&mut self, db_path: PathBuf, remember: bool) -> Result<()> {
        let store = LootStore::new(db_path, self.catalog_path.clone());
        let rows = store.read_all()?;

        tracing::info!("Opened {} ({} rows)", store.db_path().display(), rows.len());
        if remember {
            self.config.write_database_path(store.db_path())?;
        }
        self.store = Some(store);
        self.rows = rows;
        self.filter = None;
        self.selected = None;
        self.last_selected = None;
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.store.is_some()
    }

    pub fn store(&self) -> Result<&LootStore> {
        self.store.as_ref().ok_or(LootError::NoDatabase)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Rows currently shown: the search matches, or everything.
    pub fn visible_rows(&self) -> Vec<&LootRow> {
        match &self.filter {
            Some(filter) => filter.matches.iter().map(|&i| &self.rows[i]).collect(),
            None => self.rows.iter().collect(),
        }
    }

    pub fn visible_len(&self) -> usize {
        match &self.filter {
            Some(filter) => filter.matches.len(),
            None => self.rows.len(),
        }
    }

    pub fn active_filter(&self) -> Option<&ActiveFilter> {
        self.filter.as_ref()
    }

    /// Reload from the store and drop any search. The previous selection is
    /// restored when it is still in range. On error nothing changes.
    pub fn refresh(&mut self) -> Result<()> {
        let rows = self.store()?.read_all()?;
        self.rows = rows;
        self.filter = None;
        self.selected = self.last_selected.filter(|&i| i < self.rows.len());
        Ok(())
    }

    pub fn show_all(&mut self) -> Result<()> {
        self.refresh()
    }

    /// Reload after a mutation and select the row holding `id`. When that row
    /// is gone, fall back to `fallback` if it is still in range.
    fn reload_selecting(&mut self, id: Option<i32>, fallback: Option<usize>) -> Result<()> {
        let rows = self.store()?.read_all()?;
        self.rows = rows;
        self.filter = None;
        self.selected = id
            .and_then(|id| self.rows.iter().position(|r| r.entry.id == id))
            .or_else(|| fallback.filter(|&i| i < self.rows.len()));
        self.last_selected = self.selected;
        Ok(())
    }

    /// Position of the selected row in the full, unfiltered row list.
    fn selected_position(&self) -> Option<usize> {
        let id = self.selected_row()?.entry.id;
        self.rows.iter().position(|r| r.entry.id == id)
    }

    /// Search a fresh read of the table. On no matches the current view is kept.
    pub fn search(&mut self, input: &str) -> Result<FilterOutcome> {
        let term = SearchTerm::parse(input)?;
        let rows = self.store()?.read_all()?;
        let outcome = filter_rows(&rows, &term);

        if let FilterOutcome::Matches(matches) = &outcome {
            tracing::debug!("Search {:?} matched {} rows", term.as_str(), matches.len());
            self.rows = rows;
            self.filter = Some(ActiveFilter {
                term,
                matches: matches.clone(),
            });
            self.selected = Some(0);
        } else {
            tracing::debug!("Search {:?} matched nothing", term.as_str());
        }
        Ok(outcome)
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_row(&self) -> Option<&LootRow> {
        let idx = self.selected?;
        match &self.filter {
            Some(filter) => filter.matches.get(idx).map(|&i| &self.rows[i]),
            None => self.rows.get(idx),
        }
    }

    /// Select a visible row by zero-based index.
    pub fn select(&mut self, index: usize) -> Result<()> {
        if index >= self.visible_len() {
            return Err(LootError::NotFound(format!("No row at position {}", index + 1)));
        }
        self.selected = Some(index);
        Ok(())
    }

    /// Select the visible row holding loot `id`.
    pub fn select_id(&mut self, id: i32) -> Result<()> {
        let pos = self
            .visible_rows()
            .iter()
            .position(|r| r.entry.id == id)
            .ok_or_else(|| LootError::NotFound(format!("No loot entry with id {}", id)))?;
        self.selected = Some(pos);
        Ok(())
    }

    pub fn first(&mut self) {
        if self.visible_len() > 0 {
            self.selected = Some(0);
        }
    }

    pub fn previous(&mut self) {
        if let Some(idx) = self.selected {
            if idx > 0 {
                self.selected = Some(idx - 1);
            }
        }
    }

    pub fn next(&mut self) {
        let len = self.visible_len();
        match self.selected {
            Some(idx) if idx + 1 < len => self.selected = Some(idx + 1),
            None if len > 0 => self.selected = Some(0),
            _ => {}
        }
    }

    pub fn last(&mut self) {
        let len = self.visible_len();
        if len > 0 {
            self.selected = Some(len - 1);
        }
    }

    /// Status line shown under the grid.
    pub fn info_text(&self) -> String {
        let selected = match (self.selected, self.selected_row()) {
            (Some(idx), Some(_)) => (idx + 1).to_string(),
            _ => "None".to_string(),
        };
        format!("Total records: {}, Selected record: {}", self.visible_len(), selected)
    }

    /// Form for a new entry: prefilled from the selection, with the next free id.
    pub fn new_entry_form(&self) -> Result<LootForm> {
        let next_id = self.store()?.get_max_id()?.saturating_add(1);
        let mut form = match self.selected_row() {
            Some(row) => LootForm::from_row(row),
            None => LootForm::default(),
        };
        form.id = next_id.to_string();
        Ok(form)
    }

    /// Insert the form's entry, then reload and select it.
    pub fn add(&mut self, form: &LootForm) -> Result<LootEntry> {
        let entry = form.validate()?;
        self.store()?.insert(&entry)?;

        self.reload_selecting(Some(entry.id), None)?;
        Ok(entry)
    }

    /// Form for editing the selected row.
    pub fn edit_form(&self) -> Result<LootForm> {
        self.selected_row()
            .map(LootForm::from_row)
            .ok_or_else(|| LootError::NotFound("Please select a row to update.".to_string()))
    }

    /// Write the form back to the selected row. The id cannot change.
    pub fn update(&mut self, form: &LootForm) -> Result<LootEntry> {
        let selected_id = self
            .selected_row()
            .map(|r| r.entry.id)
            .ok_or_else(|| LootError::NotFound("Please select a row to update.".to_string()))?;
        let entry = form.validate()?;
        if entry.id != selected_id {
            return Err(LootError::Validation(format!(
                "Loot id cannot be changed (selected {}, form has {})",
                selected_id, entry.id
            )));
        }

        let affected = self.store()?.update(&entry)?;
        if affected == 0 {
            return Err(LootError::NotFound(format!("No loot entry with id {}", entry.id)));
        }

        self.reload_selecting(Some(entry.id), None)?;
        Ok(entry)
    }

    /// Delete the selected row. `confirm` is asked before anything is removed.
    /// Returns the deleted id, or `None` when the user declined.
    pub fn delete_selected(&mut self, confirm: impl FnOnce(&LootRow) -> bool) -> Result<Option<i32>> {
        let row = self
            .selected_row()
            .ok_or_else(|| LootError::NotFound("Please select a row to delete.".to_string()))?;
        if !confirm(row) {
            return Ok(None);
        }
        let id = row.entry.id;
        let position = self.selected_position();

        let affected = self.store()?.delete(id)?;
        if affected == 0 {
            return Err(LootError::NotFound(format!("No loot entry with id {}", id)));
        }

        self.reload_selecting(None, position)?;
        Ok(Some(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::tests::{create_test_store, sample_entry};
    use tempfile::TempDir;

    fn open_session(catalog: &str, ids: &[i32]) -> (TempDir, EditorSession) {
        let (dir, store) = create_test_store(catalog);
        for &id in ids {
            let mut entry = sample_entry(id);
            entry.item_id = 200 + id;
            store.insert(&entry).unwrap();
        }
        let config = SessionConfig::new(dir.path().join("config.txt"));
        let mut session = EditorSession::new(config, store.catalog_path());
        session.open(dir.path()).unwrap();
        (dir, session)
    }

    #[test]
    fn test_open_folder_writes_config() {
        let (dir, session) = open_session("", &[1, 2]);
        assert!(session.is_open());
        assert_eq!(session.visible_len(), 2);

        let saved = session.config().read_database_path().unwrap();
        assert_eq!(saved, Some(dir.path().join(DEFAULT_DATABASE_FILE)));
    }

    #[test]
    fn test_open_missing_keeps_session() {
        let (dir, mut session) = open_session("", &[1]);
        let err = session.open(&dir.path().join("elsewhere")).unwrap_err();

        assert!(matches!(err, LootError::DatabaseNotFound(_)));
        assert_eq!(session.visible_len(), 1);
    }

    #[test]
    fn test_restore_from_config() {
        let (dir, session) = open_session("", &[1, 2, 3]);
        let catalog = session.store().unwrap().catalog_path().to_path_buf();

        let mut restored = EditorSession::new(SessionConfig::new(dir.path().join("config.txt")), catalog);
        assert!(restored.restore().unwrap());
        assert_eq!(restored.visible_len(), 3);
    }

    #[test]
    fn test_restore_without_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = EditorSession::new(SessionConfig::new(dir.path().join("config.txt")), dir.path().join("items.txt"));
        assert!(!session.restore().unwrap());
        assert!(!session.is_open());
        assert!(matches!(session.new_entry_form(), Err(LootError::NoDatabase)));
        assert!(matches!(session.search("x"), Err(LootError::NoDatabase)));
    }

    #[test]
    fn test_navigation_and_info_text() {
        let (_dir, mut session) = open_session("", &[1, 2, 3]);
        assert_eq!(session.info_text(), "Total records: 3, Selected record: None");

        session.previous();
        assert_eq!(session.selected_index(), None);

        session.next();
        assert_eq!(session.selected_index(), Some(0));
        session.last();
        session.next();
        assert_eq!(session.selected_index(), Some(2));
        session.previous();
        assert_eq!(session.info_text(), "Total records: 3, Selected record: 2");
        session.first();
        assert_eq!(session.selected_row().unwrap().entry.id, 1);

        assert!(session.select(3).is_err());

        session.select_id(3).unwrap();
        assert_eq!(session.selected_index(), Some(2));
        assert!(matches!(session.select_id(9), Err(LootError::NotFound(_))));
    }

    #[test]
    fn test_add_selects_new_row() {
        let (_dir, mut session) = open_session("", &[1, 2]);
        session.select(0).unwrap();

        let mut form = session.new_entry_form().unwrap();
        assert_eq!(form.id, "3");
        assert_eq!(form.item_id, "201", "add form is prefilled from the selection");
        form.item_id = "999".into();

        let entry = session.add(&form).unwrap();
        assert_eq!(entry.id, 3);
        assert_eq!(session.visible_len(), 3);
        assert_eq!(session.selected_row().unwrap().entry.item_id, 999);
    }

    #[test]
    fn test_add_invalid_form_makes_no_change() {
        let (_dir, mut session) = open_session("", &[1]);
        let form = LootForm::with_id(2);

        assert!(matches!(session.add(&form), Err(LootError::Validation(_))));
        assert_eq!(session.store().unwrap().count().unwrap(), 1);
    }

    #[test]
    fn test_add_duplicate_id_keeps_rows() {
        let (_dir, mut session) = open_session("", &[1]);
        session.select(0).unwrap();
        let form = session.edit_form().unwrap();

        assert!(matches!(session.add(&form), Err(LootError::Constraint(_))));
        assert_eq!(session.visible_len(), 1);
        assert_eq!(session.selected_index(), Some(0));
    }

    #[test]
    fn test_update_selected() {
        let (_dir, mut session) = open_session("250;Silver Axe\n", &[1, 2]);
        session.select(1).unwrap();

        let mut form = session.edit_form().unwrap();
        form.item_id = "250".into();
        session.update(&form).unwrap();

        assert_eq!(session.selected_index(), Some(1));
        let row = session.selected_row().unwrap();
        assert_eq!(row.entry.id, 2);
        assert_eq!(row.display_name, "Silver Axe");
    }

    #[test]
    fn test_update_without_selection() {
        let (_dir, mut session) = open_session("", &[1]);
        assert!(matches!(session.edit_form(), Err(LootError::NotFound(_))));

        let mut form = LootForm::from_row(&session.visible_rows()[0].clone());
        form.drop_rate = "7".into();
        assert!(matches!(session.update(&form), Err(LootError::NotFound(_))));
    }

    #[test]
    fn test_update_keeps_selection_after_search() {
        let (_dir, mut session) = open_session("201;Iron Sword\n202;Apple\n203;Short Sword\n", &[1, 2, 3]);
        session.search("sword").unwrap();
        session.next();
        assert_eq!(session.selected_row().unwrap().entry.id, 3);

        let mut form = session.edit_form().unwrap();
        form.drop_rate = "7".into();
        session.update(&form).unwrap();

        assert!(session.active_filter().is_none());
        let row = session.selected_row().unwrap();
        assert_eq!(row.entry.id, 3);
        assert_eq!(row.entry.drop_rate, 7);

        assert_eq!(session.delete_selected(|_| true).unwrap(), Some(3));
        let ids: Vec<i32> = session.visible_rows().iter().map(|r| r.entry.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_delete_under_search_selects_neighbour() {
        let (_dir, mut session) = open_session("201;Iron Sword\n202;Apple\n203;Short Sword\n", &[1, 2, 3]);
        session.search("sword").unwrap();

        assert_eq!(session.delete_selected(|_| true).unwrap(), Some(1));
        // Row 1 was at position 0 of the full list, which now holds row 2.
        assert_eq!(session.selected_row().unwrap().entry.id, 2);
    }

    #[test]
    fn test_update_cannot_change_id() {
        let (_dir, mut session) = open_session("", &[1, 2]);
        session.select(0).unwrap();

        let mut form = session.edit_form().unwrap();
        form.id = "2".into();
        form.item_id = "999".into();
        assert!(matches!(session.update(&form), Err(LootError::Validation(_))));

        let rows: Vec<(i32, i32)> = session
            .store()
            .unwrap()
            .read_all()
            .unwrap()
            .iter()
            .map(|r| (r.entry.id, r.entry.item_id))
            .collect();
        assert_eq!(rows, vec![(1, 201), (2, 202)]);
    }

    #[test]
    fn test_update_vanished_row_is_not_found() {
        let (_dir, mut session) = open_session("", &[1]);
        session.select(0).unwrap();
        let form = session.edit_form().unwrap();
        session.store().unwrap().delete(1).unwrap();

        assert!(matches!(session.update(&form), Err(LootError::NotFound(_))));
    }

    #[test]
    fn test_delete_selected() {
        let (_dir, mut session) = open_session("", &[1, 2, 3]);
        session.select(1).unwrap();

        assert_eq!(session.delete_selected(|_| false).unwrap(), None);
        assert_eq!(session.visible_len(), 3);

        assert_eq!(session.delete_selected(|row| row.entry.id == 2).unwrap(), Some(2));
        let ids: Vec<i32> = session.visible_rows().iter().map(|r| r.entry.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(session.selected_index(), Some(1));
    }

    #[test]
    fn test_delete_last_row_clears_selection() {
        let (_dir, mut session) = open_session("", &[1, 2]);
        session.last();
        session.delete_selected(|_| true).unwrap();
        assert_eq!(session.selected_index(), None);
    }

    #[test]
    fn test_delete_without_selection() {
        let (_dir, mut session) = open_session("", &[1]);
        assert!(matches!(session.delete_selected(|_| true), Err(LootError::NotFound(_))));
    }

    #[test]
    fn test_search_and_show_all() {
        let (_dir, mut session) = open_session("201;Iron Sword\n202;Apple\n203;Short Sword\n", &[1, 2, 3]);

        let outcome = session.search("sword").unwrap();
        assert_eq!(outcome, FilterOutcome::Matches(vec![0, 2]));
        assert_eq!(session.visible_len(), 2);
        assert_eq!(session.selected_row().unwrap().display_name, "Iron Sword");
        assert_eq!(session.info_text(), "Total records: 2, Selected record: 1");

        session.next();
        assert_eq!(session.selected_row().unwrap().entry.id, 3);

        assert_eq!(session.search("dragon").unwrap(), FilterOutcome::NoMatches);
        assert_eq!(session.visible_len(), 2, "no-match search keeps the current view");

        assert!(matches!(session.search("  "), Err(LootError::Validation(_))));

        session.show_all().unwrap();
        assert!(session.active_filter().is_none());
        assert_eq!(session.visible_len(), 3);
    }

    #[test]
    fn test_refresh_error_keeps_rows() {
        let (dir, mut session) = open_session("", &[1, 2]);
        std::fs::remove_file(dir.path().join(DEFAULT_DATABASE_FILE)).unwrap();

        assert!(matches!(session.refresh(), Err(LootError::DatabaseNotFound(_))));
        assert_eq!(session.visible_len(), 2);
    }

    #[test]
    fn test_resolve_database_path() {
        let (dir, _session) = open_session("", &[]);
        let file = dir.path().join(DEFAULT_DATABASE_FILE);

        assert_eq!(resolve_database_path(dir.path()).unwrap(), file);
        assert_eq!(resolve_database_path(&file).unwrap(), file);
        assert!(resolve_database_path(&dir.path().join("nope.sqlite3")).is_err());
    }
}
