//! CSV export of a shopping list.
//!
//! One row per item in grouped (category) order with the header
//! `category,name,quantity,unit,source_recipes`. Fields are quoted per
//! RFC 4180 when they contain a comma, quote, or newline. Source recipes
//! are joined with `"; "`.

use anyhow::Result;
use std::path::Path;

use crate::config::Config;
use crate::grocery::{load_shopping_list, ShoppingList};

const CSV_HEADER: [&str; 5] = ["category", "name", "quantity", "unit", "source_recipes"];

/// Render a shopping list as CSV text.
pub fn to_csv(list: &ShoppingList) -> String {
    let mut out = String::new();
    push_record(&mut out, &CSV_HEADER);
    for row in list.rows() {
        let sources = row.source_recipes.join("; ");
        push_record(
            &mut out,
            &[row.category, &row.name, &row.quantity, &row.unit, &sources],
        );
    }
    out
}

fn push_record(out: &mut String, fields: &[&str]) {
    let line: Vec<String> = fields.iter().map(|f| escape_field(f)).collect();
    out.push_str(&line.join(","));
    out.push_str("\r\n");
}

fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// `grocery export`: write CSV to `output`, or stdout when absent.
pub async fn run_export(
    config: &Config,
    event_path: &Path,
    pantry_path: Option<&Path>,
    naive_only: bool,
    output: Option<&Path>,
) -> Result<()> {
    let list = load_shopping_list(config, event_path, pantry_path, naive_only).await?;
    let csv = to_csv(&list);

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &csv)?;
            tracing::info!(
                rows = list.rows().len(),
                path = %path.display(),
                "exported shopping list"
            );
            eprintln!("Exported {} items to {}", list.rows().len(), path.display());
        }
        None => print!("{}", csv),
    }

    Ok(())
}
