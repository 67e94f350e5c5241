use std::fs;
use std::path::{Path, PathBuf};

use crate::io::vault::SETTINGS_FILE;
use crate::model::column::{Column, ColumnKind};
use crate::model::settings::BoardSettings;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse lane.toml: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("could not edit lane.toml: {0}")]
    EditError(#[from] toml_edit::TomlError),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Read and parse the vault settings.
pub fn read_settings(vault_root: &Path) -> Result<BoardSettings, SettingsError> {
    let path = vault_root.join(SETTINGS_FILE);
    let text = fs::read_to_string(&path).map_err(|e| SettingsError::ReadError {
        path: path.clone(),
        source: e,
    })?;
    Ok(toml::from_str(&text)?)
}

/// Read the settings, returning both the parsed form and the raw
/// toml_edit document for round-trip-safe editing.
pub fn read_settings_doc(
    vault_root: &Path,
) -> Result<(BoardSettings, toml_edit::DocumentMut), SettingsError> {
    let path = vault_root.join(SETTINGS_FILE);
    let text = fs::read_to_string(&path).map_err(|e| SettingsError::ReadError {
        path: path.clone(),
        source: e,
    })?;
    let settings: BoardSettings = toml::from_str(&text)?;
    let doc: toml_edit::DocumentMut = text.parse()?;
    Ok((settings, doc))
}

/// Write the settings document back to disk, preserving formatting.
pub fn write_settings_doc(
    vault_root: &Path,
    doc: &toml_edit::DocumentMut,
) -> Result<(), SettingsError> {
    let path = vault_root.join(SETTINGS_FILE);
    fs::write(&path, doc.to_string()).map_err(|e| SettingsError::ReadError { path, source: e })?;
    Ok(())
}

/// Append a column to the settings document.
pub fn add_column(doc: &mut toml_edit::DocumentMut, column: &Column) {
    if !doc.contains_key("columns") {
        doc["columns"] = toml_edit::Item::ArrayOfTables(toml_edit::ArrayOfTables::new());
    }

    if let Some(columns) = doc["columns"].as_array_of_tables_mut() {
        let mut table = toml_edit::Table::new();
        table["id"] = toml_edit::value(&column.id);
        table["label"] = toml_edit::value(&column.label);
        match &column.kind {
            ColumnKind::Todo => {
                table["type"] = toml_edit::value("todo");
            }
            ColumnKind::Backlog => {
                table["type"] = toml_edit::value("backlog");
            }
            ColumnKind::Tag { tag } => {
                table["type"] = toml_edit::value("tag");
                table["tag"] = toml_edit::value(tag);
            }
            ColumnKind::Done { limit } => {
                table["type"] = toml_edit::value("done");
                if let Some(limit) = limit {
                    table["limit"] = toml_edit::value(*limit as i64);
                }
            }
        }
        if let Some(color) = &column.color {
            table["color"] = toml_edit::value(color);
        }
        if column.collapsed {
            table["collapsed"] = toml_edit::value(true);
        }
        columns.push(table);
    }
}

/// Remove the column with the given id from the settings document.
/// Returns whether anything was removed.
pub fn remove_column(doc: &mut toml_edit::DocumentMut, id: &str) -> bool {
    let Some(columns) = doc
        .get_mut("columns")
        .and_then(|c| c.as_array_of_tables_mut())
    else {
        return false;
    };
    let before = columns.len();
    columns.retain(|table| table.get("id").and_then(|v| v.as_str()) != Some(id));
    columns.len() != before
}
