use anyhow::Result;
use provision::ConfigValue;

use crate::Context;
use crate::ui;

/// Print the resolved configuration
pub fn run(ctx: &Context, json: bool) -> Result<()> {
    let loaded = ctx.load_config()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&loaded.config)?);
        return Ok(());
    }

    ui::header("Configuration");
    match &loaded.file {
        Some(path) => ui::kv("file", &path.display().to_string()),
        None => ui::dim("No config file found, using defaults"),
    }
    println!();

    for (key, value) in loaded.config.iter() {
        ui::kv(key, &display_value(value));
    }
    Ok(())
}

fn display_value(value: &ConfigValue) -> String {
    match value {
        ConfigValue::Text(text) if text.is_empty() => "(empty)".to_string(),
        ConfigValue::Text(text) => text.clone(),
        ConfigValue::List(items) => format!("[{}]", items.join(", ")),
    }
}
