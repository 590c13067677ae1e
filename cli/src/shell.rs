//! Interactive line-oriented editor over an [`EditorSession`].

use crate::output::{confirm, write_table};
use anyhow::Result;
use lootmaster_core::EditorSession;
use lootmaster_core::filter::FilterOutcome;
use lootmaster_core::form::LootForm;
use std::io::{BufRead, Write};
use std::path::Path;

const HELP: &str = "\
Commands:
  list                     show the current rows
  show                     show the selected row
  first | prev | next | last
  select <n>               select the n-th visible row
  goto <id>                select the row with loot id <id>
  search <term>            filter by name, or by item/pack id for numbers
  all                      clear the search and reload
  add [col=value ...]      add an entry (prefilled from the selection)
  edit [col=value ...]     change the selected entry
  delete                   delete the selected entry
  open <path>              open a database file or folder
  info                     show record counts
  help                     this text
  quit";

/// Outcome of one shell line.
#[derive(Debug, PartialEq, Eq)]
pub enum Step {
    Continue,
    Quit,
}

pub fn run(session: &mut EditorSession) -> Result<()> {
    println!("Type `help` for commands.");
    if session.is_open() {
        println!("{}", session.info_text());
    }

    let stdin = std::io::stdin();
    loop {
        print!("loot> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let mut out = std::io::stdout().lock();
        match execute(session, line.trim(), &mut out, confirm) {
            Ok(Step::Quit) => break,
            Ok(Step::Continue) => {}
            Err(e) => {
                tracing::debug!("Command {:?} failed: {}", line.trim(), e);
                writeln!(out, "Error: {}", e)?;
            }
        }
    }
    Ok(())
}

/// Run a single shell command. Errors leave the session as it was.
pub fn execute(
    session: &mut EditorSession,
    line: &str,
    out: &mut impl Write,
    confirm: impl FnOnce(&str) -> bool,
) -> Result<Step> {
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    match command {
        "" => {}
        "help" | "?" => writeln!(out, "{}", HELP)?,
        "quit" | "exit" | "q" => return Ok(Step::Quit),
        "list" | "ls" => {
            write_table(out, &session.visible_rows(), session.selected_index())?;
            writeln!(out, "{}", session.info_text())?;
        }
        "show" => match session.selected_row() {
            Some(row) => write_table(out, &[row], Some(0))?,
            None => writeln!(out, "No row selected.")?,
        },
        "first" => session.first(),
        "prev" | "previous" => session.previous(),
        "next" => session.next(),
        "last" => session.last(),
        "select" => {
            let n: usize = rest
                .parse()
                .map_err(|_| anyhow::anyhow!("select expects a row number, got {:?}", rest))?;
            if n == 0 {
                anyhow::bail!("Row numbers start at 1");
            }
            session.select(n - 1)?;
        }
        "goto" => {
            let id: i32 = rest
                .parse()
                .map_err(|_| anyhow::anyhow!("goto expects a loot id, got {:?}", rest))?;
            session.select_id(id)?;
        }
        "search" | "find" => match session.search(rest)? {
            FilterOutcome::Matches(matches) => {
                writeln!(out, "{} matching records.", matches.len())?;
                write_table(out, &session.visible_rows(), session.selected_index())?;
            }
            FilterOutcome::NoMatches => writeln!(out, "No matching records found.")?,
        },
        "all" => {
            session.show_all()?;
            writeln!(out, "{}", session.info_text())?;
        }
        "add" => {
            let mut form = session.new_entry_form()?;
            apply_assignments(&mut form, rest)?;
            let entry = session.add(&form)?;
            writeln!(out, "Added loot entry {}.", entry.id)?;
        }
        "edit" | "update" => {
            let mut form = session.edit_form()?;
            apply_assignments(&mut form, rest)?;
            let entry = session.update(&form)?;
            writeln!(out, "Updated loot entry {}.", entry.id)?;
        }
        "delete" | "rm" => {
            let deleted = session.delete_selected(|row| {
                confirm(&format!(
                    "Delete loot entry {} ({})? Are you sure you want to delete this record?",
                    row.entry.id, row.display_name
                ))
            })?;
            match deleted {
                Some(id) => writeln!(out, "Deleted loot entry {}.", id)?,
                None => writeln!(out, "Cancelled.")?,
            }
        }
        "open" => {
            if rest.is_empty() {
                anyhow::bail!("open expects a database file or folder");
            }
            let db_path = session.open(Path::new(rest))?.to_path_buf();
            writeln!(out, "Using database {}", db_path.display())?;
            writeln!(out, "{}", session.info_text())?;
        }
        "info" => writeln!(out, "{}", session.info_text())?,
        other => writeln!(out, "Unknown command {:?}. Type `help` for commands.", other)?,
    }
    Ok(Step::Continue)
}

fn apply_assignments(form: &mut LootForm, args: &str) -> Result<()> {
    for assignment in args.split_whitespace() {
        form.assign(assignment)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lootmaster_core::LootStore;
    use lootmaster_core::config::SessionConfig;
    use lootmaster_core::database::DEFAULT_DATABASE_FILE;
    use tempfile::TempDir;

    fn setup() -> (TempDir, EditorSession) {
        let dir = tempfile::tempdir().unwrap();
        let items = dir.path().join("items.txt");
        std::fs::write(&items, "200;Iron Sword\n201;Apple\n").unwrap();
        LootStore::new(dir.path().join(DEFAULT_DATABASE_FILE), &items)
            .create_schema()
            .unwrap();

        let mut session = EditorSession::new(SessionConfig::new(dir.path().join("config.txt")), &items);
        session.open(dir.path()).unwrap();
        (dir, session)
    }

    fn run_line(session: &mut EditorSession, line: &str) -> (Result<Step>, String) {
        let mut out = Vec::new();
        let result = execute(session, line, &mut out, |_| true);
        (result, String::from_utf8(out).unwrap())
    }

    const NEW_ROW: &str = "loot_pack_id=10 item_id=200 drop_rate=50 min_amount=1 max_amount=3 grade_id=2 group=1 always_drop=t";

    #[test]
    fn test_add_list_edit_delete() {
        let (_dir, mut session) = setup();

        let (result, text) = run_line(&mut session, &format!("add {}", NEW_ROW));
        assert_eq!(result.unwrap(), Step::Continue);
        assert_eq!(text.trim(), "Added loot entry 1.");

        let (_, text) = run_line(&mut session, "list");
        assert!(text.contains("Iron Sword"));
        assert!(text.contains("Total records: 1, Selected record: 1"));

        let (result, _) = run_line(&mut session, "edit item_id=201");
        result.unwrap();
        assert_eq!(session.selected_row().unwrap().display_name, "Apple");

        let (result, text) = run_line(&mut session, "delete");
        result.unwrap();
        assert_eq!(text.trim(), "Deleted loot entry 1.");
        assert_eq!(session.visible_len(), 0);
    }

    #[test]
    fn test_add_with_missing_fields_fails() {
        let (_dir, mut session) = setup();
        let (result, _) = run_line(&mut session, "add item_id=200");
        assert!(result.is_err());
        assert_eq!(session.visible_len(), 0);
    }

    #[test]
    fn test_search_reports_no_matches() {
        let (_dir, mut session) = setup();
        run_line(&mut session, &format!("add {}", NEW_ROW)).0.unwrap();

        let (_, text) = run_line(&mut session, "search dragon");
        assert_eq!(text.trim(), "No matching records found.");

        let (_, text) = run_line(&mut session, "search sword");
        assert!(text.starts_with("1 matching records."));

        assert!(run_line(&mut session, "search").0.is_err());
    }

    #[test]
    fn test_delete_declined() {
        let (_dir, mut session) = setup();
        run_line(&mut session, &format!("add {}", NEW_ROW)).0.unwrap();

        let mut out = Vec::new();
        execute(&mut session, "delete", &mut out, |_| false).unwrap();
        assert_eq!(String::from_utf8(out).unwrap().trim(), "Cancelled.");
        assert_eq!(session.visible_len(), 1);
    }

    #[test]
    fn test_navigation_commands() {
        let (_dir, mut session) = setup();
        for _ in 0..3 {
            run_line(&mut session, &format!("add {}", NEW_ROW)).0.unwrap();
        }
        run_line(&mut session, "first").0.unwrap();
        run_line(&mut session, "next").0.unwrap();
        assert_eq!(session.selected_index(), Some(1));

        run_line(&mut session, "select 3").0.unwrap();
        assert_eq!(session.selected_index(), Some(2));
        assert!(run_line(&mut session, "select 0").0.is_err());
        assert!(run_line(&mut session, "select 4").0.is_err());

        run_line(&mut session, "goto 1").0.unwrap();
        assert_eq!(session.selected_index(), Some(0));
    }

    #[test]
    fn test_quit_and_unknown() {
        let (_dir, mut session) = setup();
        assert_eq!(run_line(&mut session, "quit").0.unwrap(), Step::Quit);

        let (result, text) = run_line(&mut session, "frobnicate");
        assert_eq!(result.unwrap(), Step::Continue);
        assert!(text.contains("Unknown command"));
    }
}
