use serde_json::{json, Value};

use crate::cli::OutputFormat;

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(target), Some(Value::Object(extra))) = (response.as_object_mut(), data) {
                target.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Print a raw API response
pub fn output_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Output an `{ items, total }` listing; text mode prints one row per item
pub fn output_list(output_format: &OutputFormat, response: &Value, columns: &[&str]) -> anyhow::Result<()> {
    if let OutputFormat::Json = output_format {
        return output_json(response);
    }

    let items = response["items"].as_array().cloned().unwrap_or_default();
    if items.is_empty() {
        println!("No records found");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = items
        .iter()
        .map(|item| columns.iter().map(|c| cell(lookup(item, c))).collect())
        .collect();
    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| rows.iter().map(|r| r[i].len()).max().unwrap_or(0).max(c.len()))
        .collect();

    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| format!("{:<w$}", c.to_uppercase(), w = *w))
        .collect();
    println!("{}", header.join("  "));
    for row in rows {
        let line: Vec<String> = row.iter().zip(&widths).map(|(v, w)| format!("{:<w$}", v, w = *w)).collect();
        println!("{}", line.join("  ").trim_end());
    }
    println!("\n{} total", response["total"]);
    Ok(())
}

/// Output a batch report: summary line, then one line per failure
pub fn output_report(output_format: &OutputFormat, report: &Value) -> anyhow::Result<()> {
    if let OutputFormat::Json = output_format {
        return output_json(report);
    }

    println!("✓ {}", report["message"].as_str().unwrap_or("Done"));
    for failure in report["errors"].as_array().into_iter().flatten() {
        let who = failure["email"].as_str().unwrap_or("?");
        let why = failure["error"].as_str().unwrap_or("unknown error");
        println!("  ✗ {}: {}", who, why);
    }
    Ok(())
}

// dotted paths reach into embedded objects, e.g. "profile.email"
fn lookup<'a>(item: &'a Value, path: &str) -> &'a Value {
    path.split('.').fold(item, |v, key| &v[key])
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
