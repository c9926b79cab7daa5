//! Subcommand handlers for the `glider-playground` binary.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use glider_core::history::RECENT_HISTORY_LEN;
use glider_core::{
    format_duration, format_timestamp, HistoryEntry, ToolCategory, ToolMetadata, ToolParams,
};
use glider_playground::AppState;
use serde_json::Value;

/// Split `key=value`. The value is typed later against the tool's parameters.
pub fn parse_param(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("invalid key=value: no `=` found in `{}`", raw))?;

    if key.is_empty() {
        return Err(format!("invalid key=value: empty key in `{}`", raw));
    }

    Ok((key.to_string(), value.to_string()))
}

/// Type raw values by the tool's declared parameters. Undeclared keys are
/// JSON when they parse, plain strings otherwise.
fn typed_params(tool: &ToolMetadata, raw: Vec<(String, String)>) -> ToolParams {
    raw.into_iter()
        .map(|(key, value)| {
            let value = match tool.parameter(&key) {
                Some(parameter) => parameter.param_type.coerce(&value),
                None => serde_json::from_str(&value).unwrap_or(Value::String(value)),
            };
            (key, value)
        })
        .collect()
}

pub async fn status(state: &AppState) -> Result<()> {
    let connected = state.client.connect().await;
    println!("Server:  {}", state.client.base_url());
    println!("Status:  {}", state.client.status());

    if connected {
        if let Some(health) = state.client.server_status().await {
            println!("{}", serde_json::to_string_pretty(&health)?);
        }
    }

    state.client.disconnect();
    Ok(())
}

pub fn tools(state: &AppState, category: Option<&str>) -> Result<()> {
    let groups = match category {
        Some(raw) => {
            let category: ToolCategory = raw.parse()?;
            vec![(category, state.catalog.by_category(category))]
        }
        None => state.catalog.grouped_by_category(),
    };

    for (category, tools) in groups {
        if tools.is_empty() {
            continue;
        }
        println!("{} - {}", category.label(), category.description());
        for tool in tools {
            println!("  {:<26} {}", tool.id, tool.description);
        }
        println!();
    }
    Ok(())
}

pub async fn call(
    state: &AppState,
    tool_id: &str,
    params: Vec<(String, String)>,
    example: Option<usize>,
) -> Result<()> {
    let playground = &state.playground;

    match example {
        Some(index) => {
            if !playground.load_example(tool_id, index) {
                bail!("Tool {} has no example #{}", tool_id, index);
            }
        }
        None => {
            if !playground.select_tool(tool_id) {
                bail!("Unknown tool: {}", tool_id);
            }
        }
    }
    let tool = playground
        .selected_tool()
        .with_context(|| format!("Unknown tool: {}", tool_id))?;
    playground.set_params(typed_params(tool, params));

    let report = tool.validate(&playground.tool_params());
    if !report.valid {
        bail!("Invalid parameters: {}", report.errors.join(", "));
    }

    let response = playground.execute().await;
    let duration = format_duration(response.duration);

    if response.success {
        println!("✓ {} ({})", tool.display_name, duration);
        if let Some(data) = &response.data {
            println!("{}", serde_json::to_string_pretty(data)?);
        }
    } else {
        println!(
            "✗ {} ({}): {}",
            tool.display_name,
            duration,
            response.error.as_deref().unwrap_or("Unknown error")
        );
    }
    Ok(())
}

pub fn history(state: &AppState, tool: Option<&str>, all: bool) -> Result<()> {
    let entries = match tool {
        Some(tool_id) => state.history.for_tool(tool_id),
        None if all => state.history.entries(),
        None => state.history.recent(),
    };

    if entries.is_empty() {
        println!("No history yet");
        return Ok(());
    }

    for entry in &entries {
        println!("{}", history_line(entry));
    }
    if tool.is_none() && !all && state.history.len() > RECENT_HISTORY_LEN {
        println!("... {} older entries (use --all)", state.history.len() - RECENT_HISTORY_LEN);
    }
    Ok(())
}

fn history_line(entry: &HistoryEntry) -> String {
    let mark = if entry.success { "✓" } else { "✗" };
    let mut line = format!(
        "{} {} {:<24} {:>8}  {}",
        format_timestamp(entry.timestamp),
        mark,
        entry.tool_name,
        format_duration(entry.duration),
        entry.id
    );
    if let Some(error) = &entry.error {
        line.push_str(&format!("\n    {}", error));
    }
    line
}

pub fn history_remove(state: &AppState, id: &str) -> Result<()> {
    if state.history.remove_entry(id) {
        println!("Removed {}", id);
    } else {
        println!("No entry with id {}", id);
    }
    Ok(())
}

pub fn history_clear(state: &AppState) -> Result<()> {
    let count = state.history.len();
    state.history.clear();
    println!("Cleared {} entries", count);
    Ok(())
}

pub fn history_stats(state: &AppState) -> Result<()> {
    let stats = state.history.stats();
    println!("Total:     {}", stats.total);
    println!("Succeeded: {}", stats.succeeded);
    println!("Failed:    {}", stats.failed);
    Ok(())
}

pub async fn watch(state: &AppState) -> Result<()> {
    let link = state.link_connection_status();
    let mut rx = state.playground.subscribe();

    let printer = tokio::spawn(async move {
        let mut last = rx.borrow_and_update().connection_status;
        println!("{} {}", format_timestamp(Utc::now().timestamp_millis()), last);

        while rx.changed().await.is_ok() {
            let status = rx.borrow_and_update().connection_status;
            if status != last {
                println!("{} {}", format_timestamp(Utc::now().timestamp_millis()), status);
                last = status;
            }
        }
    });

    state.client.connect().await;
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    state.client.disconnect();
    link.unsubscribe();
    printer.abort();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glider_core::ToolCatalog;
    use serde_json::json;

    #[test]
    fn test_parse_param_splits_on_first_equals() {
        assert_eq!(
            parse_param("pattern=*Service").unwrap(),
            ("pattern".to_string(), "*Service".to_string())
        );
        assert_eq!(
            parse_param("filter=a=b").unwrap(),
            ("filter".to_string(), "a=b".to_string())
        );
        assert_eq!(parse_param("newName=").unwrap().1, "");
    }

    fn raw(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_typed_params_follow_declared_types() {
        let catalog = ToolCatalog::builtin().unwrap();
        let rename = catalog.get("rename_symbol").unwrap();

        let params = typed_params(
            rename,
            raw(&[
                ("symbolName", "123"),
                ("newName", "true"),
                ("applyChanges", "false"),
                ("extra", "42"),
                ("note", "plain text"),
            ]),
        );

        assert_eq!(
            Value::Object(params.clone()),
            json!({
                "symbolName": "123",
                "newName": "true",
                "applyChanges": false,
                "extra": 42,
                "note": "plain text"
            })
        );
        assert!(rename.validate(&params).valid);
    }

    #[test]
    fn test_typed_params_number_parameter() {
        let catalog = ToolCatalog::from_json(
            r#"[{
                "id": "goto_line",
                "name": "goto_line",
                "displayName": "Go To Line",
                "description": "",
                "category": "search",
                "parameters": [
                    {"name": "line", "type": "number", "description": "", "required": true}
                ]
            }]"#,
        )
        .unwrap();
        let tool = catalog.get("goto_line").unwrap();

        let params = typed_params(tool, raw(&[("line", "42")]));
        assert_eq!(params["line"], json!(42));

        // Unparseable numbers stay strings and fail validation
        let params = typed_params(tool, raw(&[("line", "forty")]));
        assert_eq!(params["line"], json!("forty"));
        assert!(!tool.validate(&params).valid);
    }

    #[test]
    fn test_parse_param_rejects_malformed() {
        assert!(parse_param("pattern").is_err());
        assert!(parse_param("=value").is_err());
    }

    #[test]
    fn test_history_line_shows_error() {
        let entry = HistoryEntry {
            id: "abc".to_string(),
            tool_id: "load_solution".to_string(),
            tool_name: "Load Solution".to_string(),
            params: ToolParams::new(),
            success: false,
            error: Some("File not found".to_string()),
            duration: 1500,
            timestamp: 0,
        };

        let line = history_line(&entry);
        assert!(line.contains("Load Solution"));
        assert!(line.contains("1.50s"));
        assert!(line.ends_with("File not found"));
    }
}
