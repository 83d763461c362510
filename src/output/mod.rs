//! Output formatters for command results.

use std::io::Write;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::core::Result;

/// Output format enum.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Text,
    Json,
    Markdown,
}

impl Format {
    pub fn format<T: Serialize, W: Write>(&self, data: &T, writer: &mut W) -> Result<()> {
        let value = serde_json::to_value(data)?;
        match self {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, &value)?;
                writeln!(writer)?;
            }
            Format::Markdown => write_markdown(&value, writer, 1)?,
            Format::Text => write_text(&value, writer, 0)?,
        }
        Ok(())
    }
}

fn write_markdown<W: Write>(value: &Value, writer: &mut W, level: usize) -> Result<()> {
    match value {
        Value::Object(map) => {
            // Scalars first as a definition list, then nested sections.
            for (key, val) in map.iter().filter(|(_, v)| !is_nested(v)) {
                writeln!(writer, "- **{}**: {}", title(key), scalar(val))?;
            }
            writeln!(writer)?;
            for (key, val) in map.iter().filter(|(_, v)| is_nested(v)) {
                writeln!(writer, "{} {}\n", "#".repeat(level.min(6)), title(key))?;
                write_markdown(val, writer, level + 1)?;
            }
        }
        Value::Array(items) if items.is_empty() => writeln!(writer, "_No items_\n")?,
        Value::Array(items) => match table_rows(items) {
            Some(rows) => write_table(&rows, writer)?,
            None => {
                for item in items {
                    write_markdown(item, writer, level)?;
                }
            }
        },
        _ => writeln!(writer, "{}\n", scalar(value))?,
    }
    Ok(())
}

fn write_table<W: Write>(rows: &[&Map<String, Value>], writer: &mut W) -> Result<()> {
    let headers: Vec<&String> = rows[0].keys().collect();

    let header_line: Vec<String> = headers.iter().map(|h| title(h)).collect();
    writeln!(writer, "| {} |", header_line.join(" | "))?;
    writeln!(writer, "|{}", " --- |".repeat(headers.len()))?;

    for row in rows {
        let cells: Vec<String> = headers
            .iter()
            .map(|h| scalar(row.get(*h).unwrap_or(&Value::Null)).replace('|', "\\|"))
            .collect();
        writeln!(writer, "| {} |", cells.join(" | "))?;
    }
    writeln!(writer)?;
    Ok(())
}

fn write_text<W: Write>(value: &Value, writer: &mut W, indent: usize) -> Result<()> {
    let prefix = "  ".repeat(indent);
    match value {
        Value::Object(map) => {
            for (key, val) in map {
                if is_nested(val) {
                    writeln!(writer, "{}{}:", prefix, title(key))?;
                    write_text(val, writer, indent + 1)?;
                } else {
                    writeln!(writer, "{}{}: {}", prefix, title(key), scalar(val))?;
                }
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                if is_nested(item) {
                    writeln!(writer, "{}[{}]", prefix, i + 1)?;
                    write_text(item, writer, indent + 1)?;
                } else {
                    writeln!(writer, "{}- {}", prefix, scalar(item))?;
                }
            }
        }
        _ => writeln!(writer, "{}{}", prefix, scalar(value))?,
    }
    Ok(())
}

fn is_nested(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

/// Rows when every item is an object of scalars, otherwise `None`.
fn table_rows(items: &[Value]) -> Option<Vec<&Map<String, Value>>> {
    items
        .iter()
        .map(|item| match item {
            Value::Object(map) if !map.values().any(is_nested) => Some(map),
            _ => None,
        })
        .collect()
}

fn title(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match (n.as_u64(), n.as_i64(), n.as_f64()) {
            (Some(u), _, _) => u.to_string(),
            (_, Some(i), _) => i.to_string(),
            (_, _, Some(f)) => format!("{f:.4}"),
            _ => n.to_string(),
        },
        Value::Bool(b) => if *b { "yes" } else { "no" }.to_string(),
        Value::Null => "-".to_string(),
        _ => value.to_string(),
    }
}
