use anyhow::Result;
use clap::{Arg, ArgAction, Command, value_parser};
use gffasta::error::Severity;
use gffasta::{ExtractConfig, GroupingOptions, run};
use log::{Level, info};
use std::path::PathBuf;

fn command() -> Command {
    Command::new("gffasta")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Assemble feature sequences from a genome FASTA based on GFF annotations.")
        .arg(
            Arg::new("annotation")
                .short('a')
                .long("annotation")
                .value_name("INPUT_GFF")
                .help("Input GFF annotation file")
                .value_parser(value_parser!(PathBuf))
                .required(true),
        )
        .arg(
            Arg::new("genome")
                .short('g')
                .long("genome")
                .value_name("DNA_FASTA")
                .help("Genome FASTA file for extracting sequences")
                .value_parser(value_parser!(PathBuf))
                .required(true),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("OUTPUT_FASTA")
                .help("Output FASTA file (defaults to stdout)")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("exclude")
                .short('x')
                .long("exclude")
                .value_name("TYPES")
                .help("Container feature types to skip (comma-separated, defaults to 'mRNA')"),
        )
        .arg(
            Arg::new("group-key")
                .short('k')
                .long("group-key")
                .value_name("KEY")
                .help("Attribute key holding the group id (defaults to the first key=value; pair)"),
        )
        .arg(
            Arg::new("no-duplicates")
                .long("no-duplicates")
                .help("Drop repeated intervals within a group")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("lenient")
                .long("lenient")
                .help("Skip malformed lines and failing groups instead of aborting")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("threads")
                .short('j')
                .long("threads")
                .value_name("N")
                .help("Worker threads used for assembly")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("level")
                .short('L')
                .long("level")
                .value_name("LEVEL")
                .help("Logging verbosity level")
                .value_parser(value_parser!(Level))
                .default_value("info"),
        )
        .arg_required_else_help(true)
}

fn config_from_matches(matches: &clap::ArgMatches) -> ExtractConfig {
    let excluded_types = matches
        .get_one::<String>("exclude")
        .map(|s| {
            s.split(',')
                .map(|item| item.trim().to_string())
                .filter(|item| !item.is_empty())
                .collect()
        })
        .unwrap_or_else(|| GroupingOptions::default().excluded_types);

    let mut config = ExtractConfig::new(
        matches.get_one::<PathBuf>("annotation").cloned().unwrap_or_default(),
        matches.get_one::<PathBuf>("genome").cloned().unwrap_or_default(),
    );
    config.output = matches.get_one::<PathBuf>("output").cloned();
    config.grouping = GroupingOptions {
        excluded_types,
        group_key: matches.get_one::<String>("group-key").cloned(),
        allow_duplicate_intervals: !matches.get_flag("no-duplicates"),
    };
    config.lenient = matches.get_flag("lenient");
    config.threads = matches.get_one::<usize>("threads").copied();
    config
}

fn main() -> Result<()> {
    let matches = command().get_matches();

    let level = matches.get_one::<Level>("level").copied().unwrap_or(Level::Info);
    simple_logger::init_with_level(level)?;

    let config = config_from_matches(&matches);
    info!("Excluded types: {:?}", config.grouping.excluded_types);

    let mut diagnostics = Vec::new();
    let result = run(&config, &mut diagnostics);

    let skipped = diagnostics.iter().filter(|d| d.severity == Severity::Warning).count();
    if skipped > 0 {
        info!("{skipped} lines or groups were skipped");
    }
    result.map(|_| ())
}
