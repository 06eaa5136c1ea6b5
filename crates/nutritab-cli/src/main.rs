// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result, anyhow};
use config::Config;
use nutritab_app::{NutrientColumn, ReferenceDataset, TableState, format_number};
use nutritab_data::DatasetSource;
use runtime::ClipboardRuntime;
use std::env;
use std::path::PathBuf;
use tracing::info;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `nutritab --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;
    let log_path = logging::init_logging(&config)?;

    let source = match &options.dataset_path {
        Some(path) => {
            nutritab_data::validate_dataset_path(path)?;
            DatasetSource::File(PathBuf::from(path))
        }
        None => config.dataset_source(),
    };
    let dataset = source
        .load()
        .with_context(|| format!("load reference dataset ({source})"))?;
    info!(%source, entries = dataset.len(), log = %log_path.display(), "starting");

    if options.list {
        print!("{}", format_dataset_listing(&dataset));
        return Ok(());
    }

    let confirmation = config.confirmation()?;
    if options.check_only {
        println!(
            "config {}: ok\ndataset {source}: {} ingredients\nlog {}",
            options.config_path.display(),
            dataset.len(),
            log_path.display()
        );
        return Ok(());
    }

    let dataset = nutritab_data::install(dataset)?;
    let mut state = TableState::new(dataset);
    let mut runtime = ClipboardRuntime::new(confirmation);
    nutritab_tui::run_app(&mut state, &mut runtime)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    dataset_path: Option<String>,
    print_config_path: bool,
    print_example: bool,
    list: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        dataset_path: None,
        print_config_path: false,
        print_example: false,
        list: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--dataset" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--dataset requires a CSV file path"))?;
                options.dataset_path = Some(value.as_ref().to_owned());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--list" => {
                options.list = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

/// Plain-text table of the reference entries, one per line.
fn format_dataset_listing(dataset: &ReferenceDataset) -> String {
    let name_width = dataset
        .entries()
        .iter()
        .map(|entry| entry.name.chars().count())
        .chain(std::iter::once("name".len()))
        .max()
        .unwrap_or(4);

    let mut out = format!("{:>4}  {:<name_width$}  {:>8}", "id", "name", "weight");
    for column in NutrientColumn::ALL {
        out.push_str(&format!("  {:>8}", column.label()));
    }
    out.push('\n');

    for entry in dataset.entries() {
        out.push_str(&format!(
            "{:>4}  {:<name_width$}  {:>8}",
            entry.id.get(),
            entry.name,
            format_number(entry.weight)
        ));
        for column in NutrientColumn::ALL {
            out.push_str(&format!("  {:>8}", format_number(entry.nutrients.get(column))));
        }
        out.push('\n');
    }
    out
}

fn print_help() {
    println!("nutritab: build a meal from reference ingredients and copy it to a spreadsheet");
    println!("  --config <path>          Use a specific config path");
    println!("  --dataset <path>         Use a specific ingredient CSV");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --list                   Print the reference ingredients and exit");
    println!("  --check                  Validate config and dataset, then exit");
    println!("  --help                   Show this help");
}
