//! Minimal CLI: check untrusted JSON against a template, or merge it into
//! trusted state.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::check::{CheckOptions, check};
use crate::merge::{MergeOptions, merge};
use crate::template::{TemplateArg, TemplateNode};

// ---------------------------------- Types --------------------------------- //

/// vet untrusted JSON against a compact shape template
#[derive(Parser, Debug)]
#[command(name = "json-vet", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// type-check JSON documents against a template
    Check(CheckTarget),
    /// merge an untrusted JSON document into a trusted one
    Merge(MergeTarget),
}

#[derive(Args, Debug, Clone)]
struct TemplateSettings {
    /// template description file (JSON)
    #[arg(long, short)]
    template: PathBuf,
}

#[derive(Args, Debug)]
struct CheckTarget {
    #[command(flatten)]
    template: TemplateSettings,

    /// tolerate keys that the template does not declare
    #[arg(long, default_value_t = false)]
    ignore_extra: bool,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(Args, Debug)]
struct MergeTarget {
    #[command(flatten)]
    template: TemplateSettings,

    /// trusted current value
    #[arg(long)]
    current: PathBuf,

    /// untrusted incoming value
    #[arg(long)]
    incoming: PathBuf,

    /// tolerate keys that the template does not declare
    #[arg(long, default_value_t = false)]
    ignore_extra: bool,

    /// keep the current value wherever the incoming one has the wrong kind
    #[arg(long, default_value_t = false)]
    ignore_type: bool,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

// ------------------------------ Implementation ---------------------------- //

impl TemplateSettings {
    fn load(&self) -> Result<TemplateNode> {
        let arg: TemplateArg = read_json(&self.template)?;
        TemplateNode::compile(&arg)
            .with_context(|| format!("invalid template {}", self.template.display()))
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Check(target) => target.run(),
            Command::Merge(target) => target.run(),
        }
    }
}

impl CheckTarget {
    fn run(&self) -> Result<()> {
        let node = self.template.load()?;
        let opts = CheckOptions { ignore_extra: self.ignore_extra };

        let paths = resolve_file_path_patterns(&self.input)?;
        tracing::info!(files = paths.len(), "checking documents");

        let mut failed = 0usize;
        for path in &paths {
            let value: Value = read_json(path)?;
            match check(&node, &value, &opts) {
                Ok(()) => {
                    println!("{} {}", "ok".green(), path.display());
                }
                Err(mismatch) => {
                    failed += 1;
                    println!("{} {}: {mismatch}", "FAIL".red(), path.display());
                }
            }
        }

        if failed > 0 {
            bail!("{failed} of {} documents failed the check", paths.len());
        }
        Ok(())
    }
}

impl MergeTarget {
    fn run(&self) -> Result<()> {
        let node = self.template.load()?;
        let opts = MergeOptions {
            ignore_extra: self.ignore_extra,
            ignore_type: self.ignore_type,
        };

        let current: Value = read_json(&self.current)?;
        let incoming: Value = read_json(&self.incoming)?;

        let merged = merge(&node, &current, &incoming, &opts).with_context(|| {
            format!(
                "cannot apply {} to {}",
                self.incoming.display(),
                self.current.display()
            )
        })?;

        let rendered = serde_json::to_string_pretty(&*merged)?;
        match self.out.as_ref() {
            Some(out) => {
                if let Some(parent) = out.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(out, &rendered)
                    .with_context(|| format!("failed to write {}", out.display()))?;
                tracing::info!(out = %out.display(), "merged document written");
            }
            None => println!("{rendered}"),
        }
        Ok(())
    }
}

// ----------------------------- Internal helpers --------------------------- //

/// Parse a JSON file, naming the JSON path on failure.
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let de = &mut serde_json::Deserializer::from_str(&source);
    serde_path_to_error::deserialize(de).map_err(|err| {
        let json_path = err.path().to_string();
        anyhow::anyhow!(
            "{}: at JSON path {json_path} -> {}",
            path.display(),
            err.into_inner()
        )
    })
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // Pattern was explicitly a glob but matched nothing -> surface as an error
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
