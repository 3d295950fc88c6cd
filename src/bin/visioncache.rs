use clap::{Parser, Subcommand};
use std::path::PathBuf;
use visioncache::cli::{self as prog_cli, Command, Context, OutputMode};
use visioncache::config::AppConfig;
use visioncache::optimizer::{DEFAULT_THUMBNAIL_SIZE, OutputFormat};

#[derive(Parser, Debug)]
#[command(name = "visioncache", version, about = "Image optimizer and classification result cache", long_about = None)]
struct Cli {
    #[arg(long, help = "Path to a config file (TOML). If omitted, the default search path is used.")]
    config: Option<PathBuf>,
    #[arg(long, help = "Override the cache storage directory. Takes precedence over config/env.")]
    storage_dir: Option<PathBuf>,
    #[arg(long, help = "Emit machine-readable JSON")]
    json: bool,
    #[arg(long, conflicts_with = "json", help = "Emit terse space-separated output")]
    plain: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Resize and recompress images into an output directory")]
    Optimize {
        #[arg(required = true, help = "Image files to optimize")]
        inputs: Vec<PathBuf>,
        #[arg(long, short, default_value = "optimized", help = "Directory for the optimized files")]
        out: PathBuf,
        #[arg(long)]
        max_width: Option<u32>,
        #[arg(long)]
        max_height: Option<u32>,
        #[arg(long, help = "Encoder quality in 0.0..=1.0")]
        quality: Option<f32>,
        #[arg(long, value_parser = parse_format, help = "jpeg, png or webp")]
        format: Option<OutputFormat>,
        #[arg(long)]
        no_resize: bool,
        #[arg(long)]
        no_compression: bool,
    },
    #[command(about = "Print a JPEG thumbnail data URL")]
    Thumbnail {
        input: PathBuf,
        #[arg(long, default_value_t = DEFAULT_THUMBNAIL_SIZE)]
        size: u32,
    },
    #[command(about = "Show image format and dimensions")]
    Probe { input: PathBuf },
    #[command(about = "Report available output formats")]
    Formats,
    #[command(subcommand, about = "Inspect or modify the classification result cache")]
    Cache(CacheCommands),
}

#[derive(Subcommand, Debug)]
enum CacheCommands {
    #[command(about = "Entry count, hit rate and footprint")]
    Stats,
    #[command(about = "Look up the cached result for a file and model")]
    Lookup { input: PathBuf, model: String },
    #[command(about = "Store a JSON result for a file and model")]
    Put {
        input: PathBuf,
        model: String,
        #[arg(help = "Result as a JSON document")]
        result: String,
        #[arg(long, help = "Time to live in seconds (default from config)")]
        ttl: Option<u64>,
    },
    #[command(about = "List cached results for a model, newest first")]
    List { model: String },
    #[command(about = "Remove every entry")]
    Clear,
    #[command(name = "clear-model", about = "Remove every entry for one model")]
    ClearModel { model: String },
    #[command(about = "Purge expired entries and trim to capacity")]
    Sweep,
}

fn parse_format(s: &str) -> Result<OutputFormat, String> {
    s.parse().map_err(|e: visioncache::VisionError| e.to_string())
}

fn to_command(cmd: Commands) -> Command {
    match cmd {
        Commands::Optimize { inputs, out, max_width, max_height, quality, format, no_resize, no_compression } => {
            Command::Optimize {
                inputs,
                out_dir: out,
                max_width,
                max_height,
                quality,
                format,
                no_resize,
                no_compression,
            }
        }
        Commands::Thumbnail { input, size } => Command::Thumbnail { input, size },
        Commands::Probe { input } => Command::Probe { input },
        Commands::Formats => Command::Formats,
        Commands::Cache(c) => match c {
            CacheCommands::Stats => Command::CacheStats,
            CacheCommands::Lookup { input, model } => Command::CacheLookup { input, model },
            CacheCommands::Put { input, model, result, ttl } => {
                Command::CachePut { input, model, result_json: result, ttl_secs: ttl }
            }
            CacheCommands::List { model } => Command::CacheList { model },
            CacheCommands::Clear => Command::CacheClear,
            CacheCommands::ClearModel { model } => Command::CacheClearModel { model },
            CacheCommands::Sweep => Command::CacheSweep,
        },
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    // Precedence: CLI > env > config files > defaults
    let mut cfg = AppConfig::load(cli.config.as_deref())?;
    if let Some(dir) = cli.storage_dir {
        cfg.cache.storage_dir = Some(dir);
    }
    visioncache::init(&cfg)?;

    let ctx = Context {
        cache: visioncache::open_cache(&cfg)?,
        optimizer: visioncache::optimizer_from(&cfg),
        options: cfg.optimizer.options.clone(),
    };
    let mode = if cli.json {
        OutputMode::Json
    } else if cli.plain {
        OutputMode::Plain
    } else {
        OutputMode::Human
    };
    let mut stdout = std::io::stdout();
    let res = prog_cli::run_with_format(&ctx, to_command(cli.command), mode, &mut stdout).await;
    ctx.cache.dispose();
    res
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
