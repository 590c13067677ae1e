//! Rendering of loot rows for the terminal.

use anyhow::Result;
use clap::ValueEnum;
use lootmaster_core::LootRow;
use lootmaster_core::models::LootRecord;
use std::io::{BufRead, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Csv,
    Json,
}

const HEADERS: [&str; 10] = [
    "id",
    "loot_pack_id",
    "item_id",
    "Name",
    "drop_rate",
    "min_amount",
    "max_amount",
    "always_drop",
    "grade_id",
    "group",
];

pub fn print_rows(rows: &[&LootRow], selected: Option<usize>, format: OutputFormat) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Table => write_table(&mut out, rows, selected)?,
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(out);
            for row in rows {
                writer.serialize(LootRecord::from(*row))?;
            }
            writer.flush()?;
        }
        OutputFormat::Json => {
            let records: Vec<LootRecord<'_>> = rows.iter().map(|r| LootRecord::from(*r)).collect();
            serde_json::to_writer_pretty(&mut out, &records)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

fn cells(row: &LootRow) -> [String; 10] {
    let e = &row.entry;
    [
        e.id.to_string(),
        e.loot_pack_id.to_string(),
        e.item_id.to_string(),
        row.display_name.clone(),
        e.drop_rate.to_string(),
        e.min_amount.to_string(),
        e.max_amount.to_string(),
        lootmaster_core::models::encode_always_drop(e.always_drop).to_string(),
        e.grade_id.to_string(),
        e.group.to_string(),
    ]
}

/// Plain aligned table. The selected row is marked with `>`.
pub fn write_table(out: &mut impl Write, rows: &[&LootRow], selected: Option<usize>) -> Result<()> {
    let body: Vec<[String; 10]> = rows.iter().map(|r| cells(r)).collect();

    let mut widths = HEADERS.map(str::len);
    for line in &body {
        for (w, cell) in widths.iter_mut().zip(line.iter()) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let header = HEADERS.map(str::to_string);
    write_line(out, &widths, " ", &header)?;
    for (idx, line) in body.iter().enumerate() {
        let marker = if Some(idx) == selected { ">" } else { " " };
        write_line(out, &widths, marker, line)?;
    }
    Ok(())
}

fn write_line(out: &mut impl Write, widths: &[usize; 10], marker: &str, line: &[String; 10]) -> std::io::Result<()> {
    write!(out, "{} ", marker)?;
    for (i, cell) in line.iter().enumerate() {
        if i > 0 {
            write!(out, "  ")?;
        }
        write!(out, "{:<width$}", cell, width = widths[i])?;
    }
    writeln!(out)
}

/// Ask a yes/no question on stdin. Anything but `y`/`yes` is a no.
pub fn confirm(question: &str) -> bool {
    print!("{} [y/N] ", question);
    if std::io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    match std::io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}
