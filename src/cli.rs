//! Thin CLI: decode YAML files against a type expression, print JSON.
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, Context};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;

use type_yaml::{LoadOptions, NameEnv, Schema, Substitution, UnknownKeys, Value};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// type-directed YAML loading: decode documents against a type expression
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// decode each input and print it as JSON
    Load(LoadOut),
    /// decode each input and report ok or the diagnostic
    Check(CheckOut),
    /// print the canonical form of a type expression
    ShowType(ShowType),
    /// read JSON values and print them as YAML
    Dump(DumpOut),
}

#[derive(Args, Debug, Clone)]
struct TypeSettings {
    /// type alias available to the expression, as NAME=EXPR (repeatable)
    #[arg(long = "alias", value_name = "NAME=EXPR")]
    aliases: Vec<String>,
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// type expression each document is decoded against (e.g. 'dict[str, list[int]]')
    #[arg(long = "type", short = 't')]
    type_expr: String,

    #[command(flatten)]
    type_settings: TypeSettings,

    /// accept several `---` separated documents per input
    #[arg(long, default_value_t = false)]
    multi_document: bool,

    /// reject mapping keys that name no record field
    #[arg(long, default_value_t = false)]
    deny_unknown_keys: bool,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct LoadOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct CheckOut {
    #[command(flatten)]
    input_settings: InputSettings,
}

#[derive(clap::Parser, Debug)]
struct ShowType {
    /// type expression
    expr: String,

    #[command(flatten)]
    type_settings: TypeSettings,
}

#[derive(clap::Parser, Debug)]
struct DumpOut {
    /// JSON input files. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl TypeSettings {
    fn name_env(&self) -> anyhow::Result<NameEnv> {
        let mut env = NameEnv::new();
        for raw in &self.aliases {
            let (name, expr) = raw
                .split_once('=')
                .ok_or_else(|| anyhow!("alias must look like NAME=EXPR, got {raw:?}"))?;
            env = env.with_alias(name.trim(), expr.trim());
        }
        Ok(env)
    }

    fn schema(&self, expr: &str) -> anyhow::Result<Schema> {
        let env = self.name_env()?;
        type_yaml::interpret(&expr.into(), &env, &Substitution::new())
            .with_context(|| format!("invalid type {expr:?}"))
    }
}

impl InputSettings {
    /// Decode every input against one shared schema, in parallel. Results
    /// keep input order.
    fn load_all(&self) -> anyhow::Result<Vec<(PathBuf, anyhow::Result<Value>)>> {
        let schema = self.type_settings.schema(&self.type_expr)?;
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;
        let unknown_keys = if self.deny_unknown_keys { UnknownKeys::Deny } else { UnknownKeys::Ignore };

        Ok(source_paths
            .into_par_iter()
            .map(|path| {
                let result = self.load_one(&schema, &path, unknown_keys);
                (path, result)
            })
            .collect())
    }

    fn load_one(&self, schema: &Schema, path: &Path, unknown_keys: UnknownKeys) -> anyhow::Result<Value> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read source file {}", path.display()))?;
        let opts = LoadOptions::new()
            .multi_document(self.multi_document)
            .unknown_keys(unknown_keys)
            .source(path.to_string_lossy());
        Ok(type_yaml::load_with(schema, &source, &opts)?)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> anyhow::Result<ExitCode> {
        match &self.cmd {
            Command::Load(target) => {
                let results = target.input_settings.load_all()?;
                let single = results.len() == 1;
                let mut failed = false;
                let mut outputs = serde_json::Map::new();
                for (path, result) in results {
                    match result {
                        Ok(value) => {
                            outputs.insert(path.to_string_lossy().to_string(), serde_json::to_value(&value)?);
                        }
                        Err(error) => {
                            failed = true;
                            report_failure(&path, &error);
                        }
                    }
                }
                let json = match (single, outputs.values().next()) {
                    (true, Some(value)) => value.clone(),
                    _ => serde_json::Value::Object(outputs),
                };
                let json_src = serde_json::to_string_pretty(&json)?;
                if let Some(out) = target.out.as_ref() {
                    if let Some(parent) = out.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(out, &json_src)
                        .with_context(|| format!("failed to write {}", out.display()))?;
                } else if !(single && failed) {
                    println!("{json_src}");
                }
                Ok(exit_code(failed))
            }
            Command::Check(target) => {
                let mut failed = false;
                for (path, result) in target.input_settings.load_all()? {
                    match result {
                        Ok(_) => println!("{}: {}", path.display(), "ok".green()),
                        Err(error) => {
                            failed = true;
                            report_failure(&path, &error);
                        }
                    }
                }
                Ok(exit_code(failed))
            }
            Command::ShowType(target) => {
                let schema = target.type_settings.schema(&target.expr)?;
                println!("{}", schema.type_to_str());
                Ok(ExitCode::SUCCESS)
            }
            Command::Dump(target) => {
                let source_paths = resolve_file_path_patterns(&target.input)
                    .context("failed to resolve input file paths")?;
                let many = source_paths.len() > 1;
                for path in source_paths {
                    let source = std::fs::read_to_string(&path)
                        .with_context(|| format!("failed to read source file {}", path.display()))?;
                    let json = serde_json::from_str::<serde_json::Value>(&source)
                        .with_context(|| format!("failed to parse JSON source file {}", path.display()))?;
                    if many {
                        println!("---");
                    }
                    print!("{}", type_yaml::dumps(&Value::from(json))?);
                }
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn report_failure(path: &Path, error: &anyhow::Error) {
    eprintln!("{} {}", format!("{}:", path.display()).bold(), "failed".red().bold());
    eprintln!("{error:#}");
}

fn exit_code(failed: bool) -> ExitCode {
    if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                matched_any = true;
                out.push(entry?);
            }
            if !matched_any {
                // an explicit glob that matched nothing is an error
                return Err(anyhow!("glob pattern matched no files: {pattern}"));
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
