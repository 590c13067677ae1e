mod output;
mod shell;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use lootmaster_core::config::{DEFAULT_CONFIG_FILE, SessionConfig};
use lootmaster_core::database::{DEFAULT_DATABASE_FILE, LootStore};
use lootmaster_core::filter::FilterOutcome;
use lootmaster_core::form::LootForm;
use lootmaster_core::{EditorSession, ItemCatalog};
use output::{OutputFormat, confirm, print_rows};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(
    name = "lootmaster",
    version = "0.1.0",
    about = "Browse and edit the loots table of a game server database",
    long_about = None
)]
struct Cli {
    /// Database file, or a folder containing compact.server.table.sqlite3.
    /// Overrides the database remembered in the config file.
    #[arg(long, global = true, env = "LOOTMASTER_DATABASE")]
    database: Option<PathBuf>,

    /// Item catalog file (default: Data/items.txt next to the executable)
    #[arg(long, global = true, env = "LOOTMASTER_ITEMS")]
    items: Option<PathBuf>,

    /// File remembering the last opened database
    #[arg(long, global = true, env = "LOOTMASTER_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Path to log file (default: lootmaster.log in the temp directory)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Verbosity level (repeat for more verbose output)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show every loot entry
    List {
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Search by item name, or by item id / loot pack id for numeric terms
    Search {
        term: String,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Print the highest loot id
    MaxId,

    /// Add a loot entry
    Add {
        /// Id for the new entry (default: highest id + 1)
        #[arg(long)]
        id: Option<i32>,
        #[command(flatten)]
        fields: EntryFields,
        #[arg(long, default_value_t = false)]
        always_drop: bool,
    },

    /// Update an existing loot entry; omitted fields keep their value
    Update {
        #[arg(long)]
        id: i32,
        #[command(flatten)]
        fields: UpdateFields,
        #[arg(long)]
        always_drop: Option<bool>,
    },

    /// Delete a loot entry
    Delete {
        #[arg(long)]
        id: i32,
        /// Skip the confirmation prompt
        #[arg(long, short, default_value_t = false)]
        yes: bool,
    },

    /// Select a database file or folder and remember it
    Open { path: PathBuf },

    /// Create a new database file with an empty loots table
    Init {
        /// Target file, or a folder to create compact.server.table.sqlite3 in
        path: PathBuf,
    },

    /// Interactive editor
    Shell,
}

#[derive(Args)]
struct EntryFields {
    #[arg(long)]
    loot_pack_id: i32,
    #[arg(long)]
    item_id: i32,
    #[arg(long)]
    drop_rate: i32,
    #[arg(long)]
    min_amount: i32,
    #[arg(long)]
    max_amount: i32,
    #[arg(long)]
    grade_id: i32,
    #[arg(long)]
    group: i32,
}

#[derive(Args)]
struct UpdateFields {
    #[arg(long)]
    loot_pack_id: Option<i32>,
    #[arg(long)]
    item_id: Option<i32>,
    #[arg(long)]
    drop_rate: Option<i32>,
    #[arg(long)]
    min_amount: Option<i32>,
    #[arg(long)]
    max_amount: Option<i32>,
    #[arg(long)]
    grade_id: Option<i32>,
    #[arg(long)]
    group: Option<i32>,
}

impl EntryFields {
    fn apply(&self, form: &mut LootForm) {
        form.loot_pack_id = self.loot_pack_id.to_string();
        form.item_id = self.item_id.to_string();
        form.drop_rate = self.drop_rate.to_string();
        form.min_amount = self.min_amount.to_string();
        form.max_amount = self.max_amount.to_string();
        form.grade_id = self.grade_id.to_string();
        form.group = self.group.to_string();
    }
}

impl UpdateFields {
    fn apply(&self, form: &mut LootForm) {
        let set = |slot: &mut String, value: Option<i32>| {
            if let Some(v) = value {
                *slot = v.to_string();
            }
        };
        set(&mut form.loot_pack_id, self.loot_pack_id);
        set(&mut form.item_id, self.item_id);
        set(&mut form.drop_rate, self.drop_rate);
        set(&mut form.min_amount, self.min_amount);
        set(&mut form.max_amount, self.max_amount);
        set(&mut form.grade_id, self.grade_id);
        set(&mut form.group, self.group);
    }
}

/// Log to stderr and to `log_file`. Level comes from the `-v` count unless RUST_LOG says otherwise.
fn setup_logging(verbose: u8, log_file: &Path) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let filter_level = match verbose {
        0 => tracing::Level::ERROR,
        1 => tracing::Level::WARN,
        2 => tracing::Level::INFO,
        3 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let filter = EnvFilter::from_default_env().add_directive(filter_level.into());

    let file_appender = tracing_appender::rolling::never(
        log_file.parent().unwrap_or(Path::new(".")),
        log_file.file_name().unwrap_or(std::ffi::OsStr::new("lootmaster.log")),
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::Layer::new().with_writer(std::io::stderr).with_ansi(true))
        .with(fmt::Layer::new().with_writer(non_blocking).with_ansi(false));

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(guard)
}

/// Open the database from `--database`, or the one remembered in the config.
fn open_session(session: &mut EditorSession, database: Option<&Path>) -> Result<()> {
    match database {
        Some(path) => session.open_transient(path)?,
        None => {
            if !session.restore()? {
                anyhow::bail!(
                    "No database selected. Run `lootmaster open <folder>` on the folder containing the '{}' file, or pass --database.",
                    DEFAULT_DATABASE_FILE
                );
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_file = cli
        .log_file
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("lootmaster.log"));
    let _guard = setup_logging(cli.verbose, &log_file)?;

    info!("Starting lootmaster CLI");

    let items = cli.items.clone().unwrap_or_else(ItemCatalog::default_path);
    let mut session = EditorSession::new(SessionConfig::new(&cli.config), &items);

    match cli.command {
        Commands::List { format } => {
            open_session(&mut session, cli.database.as_deref())?;
            print_rows(&session.visible_rows(), None, format)?;
            if format == OutputFormat::Table {
                println!("{}", session.info_text());
            }
        }
        Commands::Search { term, format } => {
            open_session(&mut session, cli.database.as_deref())?;
            match session.search(&term)? {
                FilterOutcome::Matches(_) => {
                    print_rows(&session.visible_rows(), None, format)?;
                }
                FilterOutcome::NoMatches => {
                    println!("No matching records found.");
                }
            }
        }
        Commands::MaxId => {
            open_session(&mut session, cli.database.as_deref())?;
            println!("{}", session.store()?.get_max_id()?);
        }
        Commands::Add { id, fields, always_drop } => {
            open_session(&mut session, cli.database.as_deref())?;
            let id = match id {
                Some(id) => id,
                None => session.store()?.get_max_id()?.saturating_add(1),
            };
            let mut form = LootForm::with_id(id);
            fields.apply(&mut form);
            form.always_drop = always_drop;

            let entry = session.add(&form)?;
            println!("Added loot entry {}", entry.id);
        }
        Commands::Update { id, fields, always_drop } => {
            open_session(&mut session, cli.database.as_deref())?;
            session.select_id(id)?;
            let mut form = session.edit_form()?;
            fields.apply(&mut form);
            if let Some(flag) = always_drop {
                form.always_drop = flag;
            }

            session.update(&form)?;
            println!("Updated loot entry {}", id);
        }
        Commands::Delete { id, yes } => {
            open_session(&mut session, cli.database.as_deref())?;
            session.select_id(id)?;
            let deleted = session.delete_selected(|row| {
                yes || confirm(&format!(
                    "Delete loot entry {} ({})? Are you sure you want to delete this record?",
                    row.entry.id, row.display_name
                ))
            })?;
            match deleted {
                Some(id) => println!("Deleted loot entry {}", id),
                None => println!("Cancelled"),
            }
        }
        Commands::Open { path } => {
            let db_path = session.open(&path)?;
            println!("Using database {}", db_path.display());
            println!("{}", session.info_text());
        }
        Commands::Init { path } => {
            let db_path = if path.is_dir() {
                path.join(DEFAULT_DATABASE_FILE)
            } else {
                path
            };
            if db_path.exists() {
                anyhow::bail!("{} already exists", db_path.display());
            }
            LootStore::new(&db_path, &items).create_schema()?;
            println!("Created {}", db_path.display());
        }
        Commands::Shell => {
            if let Some(path) = cli.database.as_deref() {
                session.open_transient(path)?;
            } else if !session.restore()? {
                println!(
                    "Please select the folder containing the '{}' file (use `open <folder>`).",
                    DEFAULT_DATABASE_FILE
                );
            }
            shell::run(&mut session)?;
        }
    }

    info!("lootmaster CLI finished");
    Ok(())
}
