//! designfirst CLI.
//!
//! Compiles Swagger definitions into route tables, validation rules and
//! policy chains.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;

use designfirst_compiler::{
    compile_definitions, exposition_routes, join_path, load_definitions, CompileOptions,
    CompiledApi,
};
use designfirst_lib::config::{ProjectConfig, CONFIG_FILE_NAME};
use designfirst_lib::output::{route_table, CompileOutput};
use designfirst_spec_parser::{parse_definition_file, ParseError};
use designfirst_telemetry::{
    log_compile_failed, log_definition_loaded, log_policies_registered, log_routes_compiled,
    LogFormat, TelemetryConfig,
};

#[derive(Parser, Debug)]
#[command(name = "designfirst", about = "Swagger definition compiler", version)]
struct Cli {
    /// Log level filter (RUST_LOG takes precedence).
    #[arg(long, global = true, env = "DESIGNFIRST_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Log format (json or pretty).
    #[arg(long, global = true, env = "DESIGNFIRST_LOG_FORMAT", default_value = "pretty")]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile definition(s) into routes, validation rules and policies.
    Compile {
        /// Input definition file(s) (YAML or JSON). Replaces the config's list.
        #[arg(short, long, num_args = 1..)]
        definition: Vec<PathBuf>,

        /// Project config file (`./designfirst.yaml` when neither this nor
        /// --definition is given).
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output file (stdout when omitted).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Maximum schema nesting depth.
        #[arg(long)]
        max_schema_depth: Option<usize>,
    },

    /// Parse definition(s) and report problems without compiling.
    ///
    /// Reports parse errors (E1001-E1004), operations without an
    /// operationId (E1020) and routes declared by several files (E1010,
    /// warning).
    Validate {
        /// Input definition file(s) (YAML or JSON).
        #[arg(short, long, required = true, num_args = 1..)]
        definition: Vec<PathBuf>,

        /// Output format (text or json).
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Print the compiled route table.
    Routes {
        /// Input definition file(s) (YAML or JSON).
        #[arg(short, long, required = true, num_args = 1..)]
        definition: Vec<PathBuf>,
    },
}

#[derive(Serialize)]
struct ValidationResult {
    file: String,
    valid: bool,
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

#[derive(Serialize)]
struct ValidationIssue {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<String>,
}

fn parse_error_code(error: &ParseError) -> &'static str {
    match error {
        ParseError::UnknownFormat => "E1001",
        ParseError::ParseError(_) => "E1002",
        ParseError::UnresolvedRef(_) => "E1003",
        ParseError::SchemaError(_) => "E1004",
        ParseError::Io(_) => "E1000",
    }
}

/// Run the validate command.
fn run_validate(definitions: &[PathBuf], output_format: &str) -> ExitCode {
    let mut results = Vec::new();
    let mut has_errors = false;

    // First file declaring each (method, path)
    let mut seen_routes: HashMap<(String, String), String> = HashMap::new();

    for path in definitions {
        let file = path.display().to_string();
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        match parse_definition_file(path) {
            Ok(document) => {
                for item in &document.paths {
                    for op in &item.operations {
                        let location = Some(format!("{}:{} {}", file, item.path, op.method));
                        if op.operation_id.is_none() {
                            errors.push(ValidationIssue {
                                code: "E1020".to_string(),
                                message: format!(
                                    "operation {} {} has no operationId",
                                    op.method, item.path
                                ),
                                location: location.clone(),
                            });
                        }

                        let full_path = join_path(&document.base_path, &item.path);
                        let key = (op.method.clone(), full_path);
                        if let Some(other) = seen_routes.get(&key) {
                            warnings.push(ValidationIssue {
                                code: "E1010".to_string(),
                                message: format!(
                                    "route {} {} is also declared in '{}'",
                                    key.0, key.1, other
                                ),
                                location,
                            });
                        } else {
                            seen_routes.insert(key, file.clone());
                        }
                    }
                }
            }
            Err(e) => errors.push(ValidationIssue {
                code: parse_error_code(&e).to_string(),
                message: e.to_string(),
                location: Some(file.clone()),
            }),
        }

        has_errors |= !errors.is_empty();
        results.push(ValidationResult {
            file,
            valid: errors.is_empty(),
            errors,
            warnings,
        });
    }

    if output_format == "json" {
        let output = serde_json::json!({
            "results": results,
            "summary": {
                "total": results.len(),
                "valid": results.iter().filter(|r| r.valid).count(),
                "invalid": results.iter().filter(|r| !r.valid).count(),
            }
        });
        match serde_json::to_string_pretty(&output) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("error: {}", e);
                return ExitCode::from(1);
            }
        }
    } else {
        for result in &results {
            if result.valid && result.warnings.is_empty() {
                eprintln!("✓ {} is valid", result.file);
            } else if result.valid {
                eprintln!("✓ {} is valid (with {} warning(s))", result.file, result.warnings.len());
            } else {
                eprintln!("✗ {} has {} error(s)", result.file, result.errors.len());
            }

            for err in &result.errors {
                match &err.location {
                    Some(loc) => eprintln!("  {} [{}]: {}", err.code, loc, err.message),
                    None => eprintln!("  {}: {}", err.code, err.message),
                }
            }
            for warn in &result.warnings {
                match &warn.location {
                    Some(loc) => eprintln!("  {} [{}]: {} (warning)", warn.code, loc, warn.message),
                    None => eprintln!("  {}: {} (warning)", warn.code, warn.message),
                }
            }
        }

        let valid_count = results.iter().filter(|r| r.valid).count();
        let total = results.len();
        eprintln!();
        eprintln!(
            "validated {} definition(s): {} valid, {} invalid",
            total,
            valid_count,
            total - valid_count
        );
    }

    if has_errors {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

/// Load and compile every definition, logging each milestone.
fn compile_all(definitions: &[PathBuf], options: &CompileOptions) -> anyhow::Result<CompiledApi> {
    let paths: Vec<&Path> = definitions.iter().map(PathBuf::as_path).collect();
    let documents = load_definitions(&paths)?;
    for (path, document) in definitions.iter().zip(&documents) {
        log_definition_loaded!(
            path = %path.display(),
            title = %document.title,
            paths = document.paths.len()
        );
    }

    let api = compile_definitions(&documents, options)?;
    log_routes_compiled!(routes = api.routes.len(), definitions = documents.len());
    log_policies_registered!(actions = api.policies.len());
    Ok(api)
}

/// The config file in the working directory, if there is one.
fn default_config_path() -> anyhow::Result<PathBuf> {
    let path = PathBuf::from(CONFIG_FILE_NAME);
    if !path.is_file() {
        anyhow::bail!(
            "no --definition or --config given and no {} in the current directory",
            CONFIG_FILE_NAME
        );
    }
    Ok(path)
}

/// Compile a project and write its output. Returns the number of
/// definitions and routes compiled.
fn compile_project(
    definitions: Vec<PathBuf>,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    max_schema_depth: Option<usize>,
) -> anyhow::Result<(usize, usize)> {
    let config = match config {
        Some(path) => Some(path),
        None if definitions.is_empty() => Some(default_config_path()?),
        None => None,
    };
    let mut project = match &config {
        Some(path) => ProjectConfig::load(path)?,
        None => ProjectConfig::default(),
    };
    if !definitions.is_empty() {
        project.definitions = definitions;
    }
    if let Some(depth) = max_schema_depth {
        project.compiler.max_schema_depth = depth;
    }

    let api = compile_all(&project.definitions, &project.compiler)?;
    let counts = (project.definitions.len(), api.routes.len());

    let output_doc = CompileOutput {
        static_routes: exposition_routes(&project.exposition, &project.definitions),
        api,
    };
    let json = output_doc.to_json()?;

    match output {
        Some(path) => std::fs::write(&path, json + "\n")
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{}", json),
    }
    Ok(counts)
}

/// Run the compile command.
fn run_compile(
    definitions: Vec<PathBuf>,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    max_schema_depth: Option<usize>,
) -> ExitCode {
    match compile_project(definitions, config, output, max_schema_depth) {
        Ok((definitions, routes)) => {
            eprintln!("compiled {} definition(s) ({} routes)", definitions, routes);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log_compile_failed!(error = %e);
            eprintln!("error: compilation failed: {:#}", e);
            ExitCode::from(1)
        }
    }
}

/// Run the routes command.
fn run_routes(definitions: &[PathBuf]) -> ExitCode {
    match compile_all(definitions, &CompileOptions::default()) {
        Ok(api) => {
            print!("{}", route_table(&api));
            ExitCode::SUCCESS
        }
        Err(e) => {
            log_compile_failed!(error = %e);
            eprintln!("error: {}", e);
            ExitCode::from(1)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let Some(log_format) = LogFormat::parse(&cli.log_format) else {
        eprintln!("error: invalid log format '{}' (expected json or pretty)", cli.log_format);
        return ExitCode::from(2);
    };
    let telemetry = TelemetryConfig::new()
        .with_log_level(cli.log_level)
        .with_log_format(log_format);
    if let Err(e) = designfirst_telemetry::init(&telemetry) {
        eprintln!("warning: {}", e);
    }

    match cli.command {
        Commands::Compile {
            definition,
            config,
            output,
            max_schema_depth,
        } => run_compile(definition, config, output, max_schema_depth),
        Commands::Validate { definition, format } => run_validate(&definition, &format),
        Commands::Routes { definition } => run_routes(&definition),
    }
}
