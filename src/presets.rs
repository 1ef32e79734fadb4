//! Flattens several CMake presets files into one.
//!
//! IDEs that ignore `include` in `CMakeUserPresets.json` still understand a
//! single file holding every preset, so presets are copied in by name.

use std::path::{Path, PathBuf};

use clap::Parser;
use serde_json::{Value, json};

use crate::{ToolError, ToolResult, file};

pub const CATEGORIES: [&str; 3] = ["configurePresets", "buildPresets", "testPresets"];

#[derive(Parser, Debug)]
#[command(name = "cmake-presets")]
#[command(about = "Helper to flatten a set of CMakePresets.json", long_about = None)]
pub struct PresetsArgs {
    /// CMakePresets.json or CMakeUserPresets.json this will operate on
    #[arg(long = "output", value_name = "FILE")]
    pub output: PathBuf,

    /// The CMakePresets.json or CMakeUserPresets.json to be included
    #[arg(long = "add", value_name = "FILE")]
    pub add: Vec<PathBuf>,
}

pub fn run(args: &PresetsArgs) -> ToolResult<()> {
    let mut presets = load_or_default(&args.output);
    for added in &args.add {
        let text = file::read_to_string(added)?;
        let added_presets: Value =
            serde_json::from_str(&text).map_err(|err| ToolError::Json(err, added.clone()))?;
        merge(&mut presets, &added_presets, added)?;
    }
    let rendered = render(&presets).map_err(|err| ToolError::Json(err, args.output.clone()))?;
    file::write(&args.output, &rendered)
}

fn default_presets() -> Value {
    json!({
        "version": 3,
        "cmakeMinimumRequired": {
            "major": 3,
            "minor": 23,
            "patch": 0
        },
        "configurePresets": [],
        "buildPresets": [],
        "testPresets": []
    })
}

/// Loads the existing output, starting over when it is missing, broken or
/// has no configure presets.
pub fn load_or_default(path: &Path) -> Value {
    let existing = std::fs::read_to_string(path)
        .ok()
        .and_then(|text| serde_json::from_str::<Value>(&text).ok())
        .filter(|value| value.get("configurePresets").is_some_and(Value::is_array));
    let mut presets = match existing {
        Some(presets) => presets,
        None => {
            debug!("starting fresh presets for {}", path.display());
            default_presets()
        }
    };
    if let Some(object) = presets.as_object_mut() {
        object.insert("version".into(), json!(3));
        for category in CATEGORIES {
            let entry = object.entry(category).or_insert_with(|| json!([]));
            if !entry.is_array() {
                *entry = json!([]);
            }
        }
    }
    presets
}

/// Adds every preset of `added`, replacing existing presets of the same name.
pub fn merge(presets: &mut Value, added: &Value, source: &Path) -> ToolResult<()> {
    for category in CATEGORIES {
        let Some(entries) = added.get(category).and_then(Value::as_array) else {
            continue;
        };
        let Some(target) = presets.get_mut(category).and_then(Value::as_array_mut) else {
            continue;
        };
        for entry in entries {
            let name = preset_name(entry).ok_or_else(|| {
                ToolError::Usage(format!(
                    "{}: preset in {category} without a name",
                    source.display()
                ))
            })?;
            target.retain(|existing| preset_name(existing) != Some(name));
            target.push(entry.clone());
        }
        debug!("merged {} {category} from {}", entries.len(), source.display());
    }
    Ok(())
}

fn preset_name(preset: &Value) -> Option<&str> {
    preset.get("name").and_then(Value::as_str)
}

/// Pretty prints with four space indentation.
pub fn render(presets: &Value) -> serde_json::Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    serde::Serialize::serialize(presets, &mut ser)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
