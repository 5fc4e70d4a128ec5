//! Template Oxide command line
//!
//! Generates templates from analysis results, validates templates and data,
//! and renders templates to PDF.
//!
//! Usage:
//!   template-oxide generate <analysis.json> [-o template.json] [--store DIR]
//!   template-oxide validate <template.json> [--data data.json]
//!   template-oxide render <template.json> [--data data.json] -o out.pdf
//!
//! Every command accepts `--config engine.json`. Set `RUST_LOG=debug` for
//! detailed logs.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use template_oxide::config::EngineConfig;
use template_oxide::fonts::{default_source, FontRegistry};
use template_oxide::render::{FontEmbedder, TemplateRenderer};
use template_oxide::storage::{FileTemplateStore, TemplateStore};
use template_oxide::template::{SchemaValidator, Template, TemplateAssembler};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Command {
    Generate,
    Validate,
    Render,
}

struct CliArgs {
    command: Command,
    input: PathBuf,
    output: Option<PathBuf>,
    data: Option<PathBuf>,
    config: Option<PathBuf>,
    store: Option<PathBuf>,
}

impl CliArgs {
    fn from_args() -> Result<Self, String> {
        let args: Vec<String> = std::env::args().collect();
        let command = match args.get(1).map(String::as_str) {
            Some("generate") => Command::Generate,
            Some("validate") => Command::Validate,
            Some("render") => Command::Render,
            Some(other) => return Err(format!("unknown command '{}'", other)),
            None => return Err("missing command".to_string()),
        };

        let mut input = None;
        let mut output = None;
        let mut data = None;
        let mut config = None;
        let mut store = None;

        let mut i = 2;
        while i < args.len() {
            match args[i].as_str() {
                "-o" | "--output" => {
                    i += 1;
                    output = args.get(i).map(PathBuf::from);
                },
                "--data" => {
                    i += 1;
                    data = args.get(i).map(PathBuf::from);
                },
                "--config" => {
                    i += 1;
                    config = args.get(i).map(PathBuf::from);
                },
                "--store" => {
                    i += 1;
                    store = args.get(i).map(PathBuf::from);
                },
                flag if flag.starts_with('-') => return Err(format!("unknown option '{}'", flag)),
                path => input = Some(PathBuf::from(path)),
            }
            i += 1;
        }

        let input = input.ok_or("missing input file")?;
        if command == Command::Render && output.is_none() {
            return Err("render needs -o <out.pdf>".to_string());
        }

        Ok(Self {
            command,
            input,
            output,
            data,
            config,
            store,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  template-oxide generate <analysis.json> [-o template.json] [--store DIR]");
    eprintln!("  template-oxide validate <template.json> [--data data.json]");
    eprintln!("  template-oxide render <template.json> [--data data.json] -o out.pdf");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <engine.json>   Engine configuration");
}

fn read_json(path: &Path) -> Result<Value, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    Ok(serde_json::from_str(&text).map_err(|e| format!("{}: {}", path.display(), e))?)
}

fn read_template(path: &Path) -> Result<Template, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    Ok(Template::from_json(&text)?)
}

fn generate(args: &CliArgs, config: &EngineConfig) -> Result<bool, Box<dyn std::error::Error>> {
    let analysis = read_json(&args.input)?;
    let outcome = TemplateAssembler::new(config).create_from_value(&analysis)?;

    for warning in &outcome.warnings {
        eprintln!("warning: {}", warning);
    }
    let Some(template) = outcome.template else {
        for error in &outcome.errors {
            eprintln!("error: {}", error);
        }
        return Ok(false);
    };

    let json = template.to_json()?;
    match &args.output {
        Some(path) => fs::write(path, json)?,
        None => println!("{}", json),
    }
    if let Some(dir) = &args.store {
        FileTemplateStore::open(dir)?.save(&template)?;
    }
    if let Some(stats) = outcome.stats {
        eprintln!(
            "Generated '{}' ({}): {} page(s), {} item(s), {} question(s)",
            template.name, template.id, stats.total_pages, stats.total_items, stats.total_questions
        );
    }
    Ok(true)
}

fn validate(args: &CliArgs, config: &EngineConfig) -> Result<bool, Box<dyn std::error::Error>> {
    let template = read_template(&args.input)?;
    let validator = SchemaValidator::new(config.layout.clone());

    let mut results = vec![("structure", validator.validate_template_structure(&template))];
    if let Some(path) = &args.data {
        results.push(("data", validator.validate_data(&template, &read_json(path)?)));
    }

    let mut valid = true;
    for (label, result) in results {
        for warning in &result.warnings {
            println!("[{}] warning: {}", label, warning);
        }
        for error in &result.errors {
            println!("[{}] error: {}", label, error);
        }
        println!("[{}] {}", label, if result.valid { "valid" } else { "INVALID" });
        valid &= result.valid;
    }
    Ok(valid)
}

fn render(args: &CliArgs, config: &EngineConfig) -> Result<bool, Box<dyn std::error::Error>> {
    let template = read_template(&args.input)?;
    let data = match &args.data {
        Some(path) => read_json(path)?,
        None => template.sample_data.clone(),
    };

    let registry = Arc::new(FontRegistry::with_defaults(default_source(&config.fonts)));
    let embedder = Arc::new(FontEmbedder::new(registry, config.fonts.clone()));
    let renderer = TemplateRenderer::new(embedder, config.layout.clone());

    let start = Instant::now();
    let output = renderer.render(&template, &data)?;
    let out_path = args.output.as_ref().ok_or("missing output path")?;
    fs::write(out_path, &output.pdf)?;

    for failure in &output.failures {
        eprintln!(
            "warning: page {}, item {} ('{}') not drawn: {}",
            failure.page + 1,
            failure.item + 1,
            failure.name,
            failure.message
        );
    }
    eprintln!(
        "Wrote {} ({} page(s), {} bytes) in {:.1} ms",
        out_path.display(),
        output.page_count,
        output.pdf.len(),
        start.elapsed().as_secs_f64() * 1000.0
    );
    Ok(output.is_complete())
}

fn main() -> ExitCode {
    env_logger::init();

    let args = match CliArgs::from_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            return ExitCode::from(2);
        },
    };

    let config = match &args.config {
        Some(path) => match EngineConfig::from_json_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}: {}", path.display(), e);
                return ExitCode::from(2);
            },
        },
        None => EngineConfig::default(),
    };

    let result = match args.command {
        Command::Generate => generate(&args, &config),
        Command::Validate => validate(&args, &config),
        Command::Render => render(&args, &config),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        },
    }
}
