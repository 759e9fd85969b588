//! Demo driver for the two caller patterns the library is built for:
//!
//! 1. a config document folded into trusted defaults through `merge`, with
//!    unknown keys and wrong kinds tolerated and the defaults kept;
//! 2. an untrusted "API" whose return values get vetted through
//!    `check`/`is_type` before use.

use anyhow::Result;
use json_vet::{CheckOptions, MergeOptions, TemplateNode, check, is_type, merge};
use serde_json::{Value, json};

fn compile(description: Value) -> Result<TemplateNode> {
    let arg = serde_json::from_value(description)?;
    Ok(TemplateNode::compile(&arg)?)
}

fn main() -> Result<()> {
    config_demo()?;
    untrusted_api_demo()?;
    Ok(())
}

// ------------------------------ Config files ------------------------------ //

/// Enforce `template` on an untrusted config document, falling back to the
/// defaults wherever the document cannot be used.
fn load_config(template: &TemplateNode, defaults: &Value, source: &str) -> Value {
    let opts = MergeOptions { ignore_extra: true, ignore_type: true };

    let parsed = match serde_json::from_str::<Value>(source) {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("config unreadable, keeping defaults: {err}");
            return defaults.clone();
        }
    };

    match merge(template, defaults, &parsed, &opts) {
        Ok(merged) => merged.into_owned(),
        Err(err) => {
            eprintln!("config rejected, keeping defaults: {err}");
            defaults.clone()
        }
    }
}

fn config_demo() -> Result<()> {
    println!("--- config file ---");

    let template = compile(json!({
        "volume": "number",
        "auto_play": "boolean",
        "subtitles_language": ["string", "undefined"],
    }))?;
    let defaults = json!({"volume": 0.5, "auto_play": false});

    // volume is usable; auto_play has the wrong kind, theme is undeclared
    let on_disk = r#"{ "volume": 0.9, "auto_play": "yes", "theme": "dark" }"#;
    println!("from a sloppy file:     {}", load_config(&template, &defaults, on_disk));

    println!("from an unreadable one: {}", load_config(&template, &defaults, "{ volume:"));

    Ok(())
}

// ----------------------------- Untrusted API ------------------------------ //

/// A third-party API we do not trust to match its own documentation.
mod api {
    use serde_json::{Value, json};

    /// Correctly shaped as long as the sum is not zero; `text` goes missing
    /// when it is.
    pub fn add_numbers(a: f64, b: f64) -> Value {
        let sum = a + b;
        if sum == 0.0 {
            json!({"value": sum})
        } else {
            json!({"value": sum, "text": format!("{a} + {b} = {sum}")})
        }
    }

    /// Ships an undeclared `debug` field with every response.
    pub fn subtract_numbers(a: f64, b: f64) -> Value {
        let dif = a - b;
        json!({"value": dif, "text": format!("{a} - {b} = {dif}"), "debug": [a, b]})
    }
}

fn untrusted_api_demo() -> Result<()> {
    println!("--- untrusted api ---");

    let math_result = compile(json!({"value": "number", "text": "string"}))?;
    let strict = CheckOptions::default();

    let first_sum = api::add_numbers(2.0, 2.0);
    println!("add_numbers(2, 2) well-typed: {}", is_type(&math_result, &first_sum, &strict));

    let second_sum = api::add_numbers(0.0, 0.0);
    match check(&math_result, &second_sum, &strict) {
        Ok(()) => println!("add_numbers(0, 0) well-typed: true"),
        Err(mismatch) => println!("add_numbers(0, 0) rejected: {mismatch}"),
    }

    // legacy responses carry extra fields; tolerate them explicitly
    let dif = api::subtract_numbers(5.0, 3.0);
    println!("subtract_numbers strict:       {}", is_type(&math_result, &dif, &strict));
    println!(
        "subtract_numbers ignore_extra: {}",
        is_type(&math_result, &dif, &CheckOptions { ignore_extra: true })
    );

    Ok(())
}
