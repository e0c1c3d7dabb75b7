//! Output formatting module

use anyhow::Result;
use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Write as _;
use std::io::Write as _;

use crate::config::OutputFormat;

/// Print output in the configured format
pub fn print_output<T: Serialize>(data: &T, format: OutputFormat) -> Result<()> {
    print!("{}", render(data, format)?);
    Ok(())
}

/// Render a document in the given format, newline-terminated
pub fn render<T: Serialize>(data: &T, format: OutputFormat) -> Result<String> {
    let rendered = match format {
        OutputFormat::Yaml => serde_yaml::to_string(data)?,
        OutputFormat::Json => format!("{}\n", serde_json::to_string_pretty(data)?),
        OutputFormat::Compact => {
            let mut out = String::new();
            render_value_compact(&mut out, &serde_json::to_value(data)?, 0);
            out
        }
    };
    Ok(rendered)
}

fn render_value_compact(out: &mut String, value: &Value, indent: usize) {
    let prefix = "  ".repeat(indent);

    match value {
        Value::Object(map) => {
            for (key, val) in map {
                match val {
                    Value::Object(_) | Value::Array(_) => {
                        let _ = writeln!(out, "{}{}: ", prefix, key.cyan());
                        render_value_compact(out, val, indent + 1);
                    }
                    _ => {
                        let _ = writeln!(out, "{}{}: {}", prefix, key.cyan(), format_value(val));
                    }
                }
            }
        }
        Value::Array(arr) => {
            for (i, val) in arr.iter().enumerate() {
                let _ = writeln!(out, "{}[{}]", prefix, i.to_string().dimmed());
                render_value_compact(out, val, indent + 1);
            }
        }
        _ => {
            let _ = writeln!(out, "{}{}", prefix, format_value(value));
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".dimmed().to_string(),
        Value::Bool(b) => {
            if *b {
                "true".green().to_string()
            } else {
                "false".red().to_string()
            }
        }
        Value::Number(n) => n.to_string().yellow().to_string(),
        Value::String(s) => s.clone(),
        _ => value.to_string(),
    }
}

/// Print success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg);
}

/// Print error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red().bold(), msg);
}

/// Status line on stderr, keeping stdout clean for piping
pub fn status(msg: &str) {
    eprint!("{}", msg);
    let _ = std::io::stderr().flush();
}

/// One unit of progress feedback
pub fn tick() {
    status(".");
}

/// Heading for a section of multi-part output
pub fn heading(msg: &str) {
    println!("{}", msg.bold().underline());
}
