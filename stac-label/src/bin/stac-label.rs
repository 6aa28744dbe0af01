use std::env;
use std::io::{self, Write as _};
use std::path::Path;
use std::process::exit;

use anyhow::bail;
use clap::Parser;
use stac_label::args::{Args, Commands, CreateArgs, ItemOptions, LabelsArgs, OutputFormat};
use stac_label::config::{Config, read_config};
use stac_label::logging::{init_tracing, log_filter};
use stac_label_core::{analyze_labels, assemble_and_persist, assemble_item, compute_extent};
use subst::Env;
use tracing::{Level, enabled, error, info};

fn main() {
    let args = Args::parse();

    let format = args
        .log_format
        .or_else(|| env::var("STAC_LABEL_LOG_FORMAT").ok()?.parse().ok())
        .unwrap_or_default();
    if let Err(e) = init_tracing(&log_filter(env::var("RUST_LOG").ok()), format) {
        eprintln!("Unable to initialize logging: {e}");
    }

    if let Err(err) = main_int(args) {
        // Ensure the message is printed, even if the logging is disabled
        if enabled!(Level::ERROR) {
            error!("{err:#}");
        } else {
            eprintln!("{err:#}");
        }
        exit(1);
    }
}

fn main_int(args: Args) -> anyhow::Result<()> {
    match args.command {
        Commands::Create(CreateArgs {
            options,
            no_clobber,
            dry_run,
        }) => {
            let mut config = load_config(args.config.as_deref(), options)?;
            config.finalize();
            create(&config, no_clobber, dry_run)?;
        }
        Commands::Extent { file } => {
            let bbox = compute_extent(&file)?;
            println!("{}", serde_json::to_string(&bbox)?);
        }
        Commands::Labels(labels) => print_labels(labels)?,
        Commands::PrintConfig(options) => {
            let mut config = load_config(args.config.as_deref(), options)?;
            config.finalize();
            print!("{}", config.to_yaml()?);
        }
    }
    Ok(())
}

fn load_config(file: Option<&Path>, overrides: ItemOptions) -> anyhow::Result<Config> {
    let mut config = if let Some(file) = file {
        info!("Using config file {}", file.display());
        let config = read_config(file, &Env)?;
        config.warn_unrecognized();
        config
    } else {
        Config::default()
    };
    overrides.merge_into_config(&mut config);
    Ok(config)
}

fn create(config: &Config, no_clobber: bool, dry_run: bool) -> anyhow::Result<()> {
    let request = &config.item.request;
    let settings = &config.output.assembler;
    request.validate_id()?;

    if dry_run {
        let item = assemble_item(request, settings)?;
        io::stdout().lock().write_all(&item.to_json_bytes()?)?;
        return Ok(());
    }

    let destination = settings.item_path(&request.item_id);
    if no_clobber && destination.exists() {
        bail!(
            "STAC item {} already exists, remove --no-clobber to replace it",
            destination.display()
        );
    }
    let path = assemble_and_persist(request, settings)?;
    println!("{}", path.display());
    Ok(())
}

fn print_labels(args: LabelsArgs) -> anyhow::Result<()> {
    let labels = analyze_labels(&args.file, &args.description, args.tasks)?;
    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&labels)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&labels)?),
    }
    Ok(())
}
