use bnf_gen::{Grammar, GrammarConfig};
use clap::Parser;
use log::{LevelFilter, info};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Random text generator driven by an EBNF-like grammar
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the grammar file
    #[arg(help = "Path to the grammar file, one rule per line")]
    grammar_file: PathBuf,

    /// The starting non-terminal symbol
    #[arg(help = "Starting non-terminal symbol, without angle brackets")]
    start_symbol: String,

    /// Number of texts to generate
    #[arg(help = "Number of texts to generate", default_value_t = 1)]
    count: usize,

    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// Fail instead of recursing deeper than this many non-terminals
    #[arg(long)]
    max_depth: Option<usize>,

    /// JSON file with grammar configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the derivations as a JSON array
    #[arg(long)]
    json: bool,

    /// Print the parsed rule table as JSON and exit
    #[arg(long)]
    dump_rules: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let mut builder = pretty_env_logger::formatted_builder();
    match std::env::var("RUST_LOG") {
        Ok(filters) if verbose == 0 => {
            builder.parse_filters(&filters);
        }
        _ => {
            let level = match verbose {
                0 => LevelFilter::Warn,
                1 => LevelFilter::Debug,
                _ => LevelFilter::Trace,
            };
            builder.filter_level(level);
        }
    }
    builder.init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => GrammarConfig::from_json_file(path)?,
        None => GrammarConfig::default(),
    };
    if cli.max_depth.is_some() {
        config.max_recursion_depth = cli.max_depth;
    }

    info!("loading grammar from {}", cli.grammar_file.display());
    let grammar = Grammar::from_file(&cli.grammar_file, &cli.start_symbol, config)?;
    info!("loaded {} rules", grammar.rules().len());

    if cli.dump_rules {
        let rules: BTreeMap<_, _> = grammar.rules().iter().collect();
        println!("{}", serde_json::to_string_pretty(&rules)?);
        return Ok(());
    }

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut samples = Vec::with_capacity(cli.count);
    for _ in 0..cli.count {
        samples.push(grammar.generate(&mut rng)?);
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&samples)?);
    } else {
        for (i, generated) in samples.iter().enumerate() {
            println!("{}. {}", i + 1, generated);
        }
    }

    Ok(())
}
