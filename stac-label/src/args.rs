use std::path::PathBuf;

use clap::builder::Styles;
use clap::builder::styling::AnsiColor;
use clap::{Parser, Subcommand, ValueEnum};
use stac_label_core::{GeometryMode, OneOrMany};

use crate::config::Config;
use crate::logging::LogFormat;

/// Defines the styles used for the CLI help output.
const HELP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Blue.on_default().bold())
    .usage(AnsiColor::Blue.on_default().bold())
    .literal(AnsiColor::White.on_default())
    .placeholder(AnsiColor::Green.on_default());

#[derive(Parser, PartialEq, Debug)]
#[command(
    version,
    name = "stac-label",
    about = "Describe vector annotation files as STAC items using the label extension",
    after_help = "Use RUST_LOG environment variable to control logging level, e.g. RUST_LOG=debug or RUST_LOG=stac_label=debug.",
    styles = HELP_STYLES
)]
pub struct Args {
    /// YAML config file. `${VAR}` references are replaced from the environment.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    /// Log output format: full, compact, bare, pretty or json.
    /// Defaults to the `STAC_LABEL_LOG_FORMAT` environment variable, then `bare`.
    #[arg(long, global = true)]
    pub log_format: Option<LogFormat>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, PartialEq, Debug)]
pub enum Commands {
    /// Derive a STAC item from an annotation file and write it to the output directory
    #[command(name = "create", alias = "item")]
    Create(CreateArgs),
    /// Print the bounding box of an annotation file as a JSON array
    #[command(name = "extent", alias = "bbox")]
    Extent {
        /// Annotation file to read
        file: PathBuf,
    },
    /// Print the label properties derived from the attributes of an annotation file
    #[command(name = "labels")]
    Labels(LabelsArgs),
    /// Print the configuration with command line overrides applied, as YAML
    #[command(name = "print-config")]
    PrintConfig(ItemOptions),
}

#[derive(Clone, Default, PartialEq, Debug, clap::Args)]
pub struct CreateArgs {
    #[command(flatten)]
    pub options: ItemOptions,
    /// Fail if the item file already exists instead of replacing it
    #[arg(long)]
    pub no_clobber: bool,
    /// Print the item to stdout instead of writing it
    #[arg(long, conflicts_with = "no_clobber")]
    pub dry_run: bool,
}

/// Item and output settings. Each one given here overrides the config file.
#[derive(Clone, Default, PartialEq, Debug, clap::Args)]
pub struct ItemOptions {
    /// Vector annotation file (GeoJSON) to describe
    pub file: Option<PathBuf>,
    /// STAC item id, also used to name the output file
    #[arg(short, long)]
    pub id: Option<String>,
    /// Title of the label asset
    #[arg(short, long)]
    pub title: Option<String>,
    /// Where the annotation file is published. Defaults to the file path.
    #[arg(long)]
    pub asset_link: Option<String>,
    /// Collection the item belongs to
    #[arg(long)]
    pub collection: Option<String>,
    /// Free text description of the labels
    #[arg(short, long)]
    pub description: Option<String>,
    /// Label task, e.g. classification or segmentation. Can be specified multiple times.
    #[arg(long = "task")]
    pub tasks: Vec<String>,
    /// Link to the imagery the annotations were drawn on
    #[arg(long)]
    pub source_link: Option<String>,
    /// Directory the item file is written to
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Geometry written to the item
    #[arg(long, value_enum)]
    pub geometry: Option<GeometryMode>,
    /// Role of the label asset. Can be specified multiple times.
    #[arg(long = "asset-role")]
    pub asset_roles: Vec<String>,
}

impl ItemOptions {
    pub fn merge_into_config(self, config: &mut Config) {
        let item = &mut config.item.request;
        if let Some(file) = self.file {
            item.annotation_path = file;
        }
        if let Some(id) = self.id {
            item.item_id = id;
        }
        if let Some(title) = self.title {
            item.asset_title = title;
        }
        if self.asset_link.is_some() {
            item.asset_link = self.asset_link;
        }
        if self.collection.is_some() {
            item.collection_id = self.collection;
        }
        if let Some(description) = self.description {
            item.label_description = description;
        }
        if !self.tasks.is_empty() {
            item.label_tasks = OneOrMany::Many(self.tasks);
        }
        if self.source_link.is_some() {
            item.source_link = self.source_link;
        }

        let output = &mut config.output.assembler;
        if let Some(dir) = self.output_dir {
            output.output_dir = dir;
        }
        if let Some(geometry) = self.geometry {
            output.geometry = geometry;
        }
        if !self.asset_roles.is_empty() {
            output.asset_roles = self.asset_roles;
        }
    }
}

#[derive(Clone, PartialEq, Debug, clap::Args)]
pub struct LabelsArgs {
    /// Annotation file to read
    pub file: PathBuf,
    /// Free text description of the labels
    #[arg(short, long, default_value = "")]
    pub description: String,
    /// Label task, e.g. classification or segmentation. Can be specified multiple times.
    #[arg(long = "task")]
    pub tasks: Vec<String>,
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::default())]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, Debug, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}
