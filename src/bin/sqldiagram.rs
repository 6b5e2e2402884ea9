//! Command-line interface for sqldiagram
//!
//! Usage:
//!   sqldiagram generate [--addr `<loc>`] [--base `<dir>`] [--specs `<file>`] [--offline]
//!   sqldiagram bnf [--addr `<loc>`]              - Write the EBNF extracted from sql.y
//!   sqldiagram reduce [--stmt `<name>`] ...      - Reduce EBNF to one statement's grammar
//!   sqldiagram rr                              - Render EBNF with the diagram service
//!   sqldiagram body                            - Extract `<body>` contents from HTML
//!
//! `--in` and `--out` select the input and output files; stdin and stdout otherwise.

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use regex::Regex;
use std::error::Error;
use std::io::{Read, Write};
use std::sync::Arc;

use sqldiagram::config::{Loader, Settings};
use sqldiagram::pipeline::{default_specs, load_specs, reduce, write_diagrams, Orchestrator};
use sqldiagram::render::html::inner_tag;
use sqldiagram::render::{EbnfRenderer, RailroadService, Renderer};
use sqldiagram::source::{self, fetch::fetch_text};

type CliResult = Result<(), Box<dyn Error>>;

fn cli() -> Command {
    Command::new("sqldiagram")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Generate railroad diagrams from a yacc SQL grammar")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("in")
                .long("in")
                .global(true)
                .help("Input path; stdin if absent"),
        )
        .arg(
            Arg::new("out")
                .long("out")
                .global(true)
                .help("Output path; stdout if absent"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .help("TOML file layered over the built-in settings"),
        )
        .subcommand(
            Command::new("generate")
                .about("Generate diagrams for every statement and the whole grammar")
                .arg(
                    Arg::new("addr")
                        .long("addr")
                        .help("Location of sql.y: a local path or an http(s) URL"),
                )
                .arg(
                    Arg::new("base")
                        .long("base")
                        .help("Directory the html files are written to"),
                )
                .arg(
                    Arg::new("specs")
                        .long("specs")
                        .help("YAML statement list replacing the built-in one"),
                )
                .arg(
                    Arg::new("offline")
                        .long("offline")
                        .action(ArgAction::SetTrue)
                        .help("Write EBNF listings instead of calling the diagram service"),
                ),
        )
        .subcommand(
            Command::new("bnf").about("Write EBNF extracted from sql.y").arg(
                Arg::new("addr")
                    .long("addr")
                    .help("Location of sql.y: a local path or an http(s) URL"),
            ),
        )
        .subcommand(
            Command::new("reduce")
                .about("Reduce an EBNF grammar to the productions one statement needs")
                .arg(
                    Arg::new("stmt")
                        .long("stmt")
                        .default_value("stmt_block")
                        .help("Name of the top-level statement"),
                )
                .arg(
                    Arg::new("descend")
                        .long("descend")
                        .value_parser(value_parser!(bool))
                        .default_value("true")
                        .help("Descend past --stmt"),
                )
                .arg(
                    Arg::new("inline")
                        .long("inline")
                        .value_delimiter(',')
                        .action(ArgAction::Append)
                        .help("Productions to inline"),
                )
                .arg(
                    Arg::new("include")
                        .long("include")
                        .help("Keep only alternatives of --stmt matching this regex"),
                )
                .arg(
                    Arg::new("exclude")
                        .long("exclude")
                        .help("Drop alternatives of --stmt matching this regex"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Write the reduced grammar as JSON"),
                ),
        )
        .subcommand(Command::new("rr").about("Render EBNF to an HTML page with the railroad diagram service"))
        .subcommand(Command::new("body").about("Extract HTML <body> contents"))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let matches = cli().get_matches();

    let result = match matches.subcommand() {
        Some(("generate", generate_matches)) => handle_generate_command(generate_matches).await,
        Some(("bnf", bnf_matches)) => handle_bnf_command(bnf_matches).await,
        Some(("reduce", reduce_matches)) => handle_reduce_command(reduce_matches),
        Some(("rr", rr_matches)) => handle_rr_command(rr_matches).await,
        Some(("body", body_matches)) => handle_body_command(body_matches),
        _ => unreachable!(),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_settings(matches: &ArgMatches) -> Result<Settings, Box<dyn Error>> {
    let mut loader = Loader::new();
    if let Some(path) = matches.get_one::<String>("config") {
        loader = loader.with_file(path);
    }
    if let Some(addr) = matches.try_get_one::<String>("addr").ok().flatten() {
        loader = loader.set_override("source.addr", addr.as_str())?;
    }
    if let Some(base) = matches.try_get_one::<String>("base").ok().flatten() {
        loader = loader.set_override("output.base_dir", base.as_str())?;
    }
    Ok(loader.build()?)
}

fn read_input(matches: &ArgMatches) -> Result<String, Box<dyn Error>> {
    match matches.get_one::<String>("in") {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

fn write_output(matches: &ArgMatches, content: &str) -> CliResult {
    match matches.get_one::<String>("out") {
        Some(path) => std::fs::write(path, content)?,
        None => std::io::stdout().write_all(content.as_bytes())?,
    }
    Ok(())
}

async fn extract_bnf(settings: &Settings) -> Result<String, Box<dyn Error>> {
    let yacc = fetch_text(&settings.source.addr).await?;
    Ok(source::to_ebnf(&yacc, &settings.source.bare_tokens)?)
}

/// Handle the generate command
async fn handle_generate_command(matches: &ArgMatches) -> CliResult {
    let settings = load_settings(matches)?;
    let specs = match matches.get_one::<String>("specs") {
        Some(path) => load_specs(&std::fs::read_to_string(path)?)?,
        None => default_specs()?,
    };

    let renderer: Arc<dyn Renderer> = if matches.get_flag("offline") {
        Arc::new(EbnfRenderer)
    } else {
        Arc::new(RailroadService::new(
            settings.railroad.clone(),
            settings.output.grammar_link.clone(),
        ))
    };

    let base: Arc<str> = Arc::from(extract_bnf(&settings).await?);
    let diagrams = Orchestrator::new(renderer, specs)
        .with_grammar_root(settings.output.grammar_root.clone())
        .with_grammar_file(settings.output.grammar_file.clone())
        .run(base)
        .await?;

    write_diagrams(&settings.output.base_dir, &diagrams).await?;
    tracing::info!(
        count = diagrams.len(),
        dir = %settings.output.base_dir.display(),
        "diagrams written"
    );
    Ok(())
}

/// Handle the bnf command
async fn handle_bnf_command(matches: &ArgMatches) -> CliResult {
    let settings = load_settings(matches)?;
    let ebnf = extract_bnf(&settings).await?;
    write_output(matches, &ebnf)
}

/// Handle the reduce command
fn handle_reduce_command(matches: &ArgMatches) -> CliResult {
    let stmt = matches
        .get_one::<String>("stmt")
        .map(String::as_str)
        .unwrap_or("stmt_block");
    let descend = matches.get_one::<bool>("descend").copied().unwrap_or(true);
    let inline: Vec<String> = matches
        .get_many::<String>("inline")
        .map(|names| names.filter(|name| !name.is_empty()).cloned().collect())
        .unwrap_or_default();
    let include = matches
        .get_one::<String>("include")
        .map(|pattern| Regex::new(pattern))
        .transpose()?;
    let exclude = matches
        .get_one::<String>("exclude")
        .map(|pattern| Regex::new(pattern))
        .transpose()?;

    let ebnf = read_input(matches)?;
    let reduced = reduce(
        &ebnf,
        &inline,
        stmt,
        descend,
        include.as_ref(),
        exclude.as_ref(),
    )?;

    let output = if matches.get_flag("json") {
        let mut json = serde_json::to_string_pretty(&reduced)?;
        json.push('\n');
        json
    } else {
        reduced.to_ebnf()
    };
    write_output(matches, &output)
}

/// Handle the rr command
async fn handle_rr_command(matches: &ArgMatches) -> CliResult {
    let settings = load_settings(matches)?;
    let ebnf = read_input(matches)?;
    let service = RailroadService::new(settings.railroad, settings.output.grammar_link);
    let page = service.generate(&ebnf).await?;
    write_output(matches, &page)
}

/// Handle the body command
fn handle_body_command(matches: &ArgMatches) -> CliResult {
    let html = read_input(matches)?;
    let body = inner_tag(&html, "body")?;
    write_output(matches, &body)
}
