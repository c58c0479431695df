use crate::config::toml_config::TomlConfig;
use crate::domain::model::Role;
use crate::utils::error::Result;
use crate::utils::validation::{validate_path, Validate};
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Clone, Parser)]
#[command(name = "crs-convert")]
#[command(about = "Convert coordinate tables between reference systems and units")]
pub struct CliConfig {
    #[arg(long, global = true, help = "TOML configuration file")]
    pub config: Option<String>,

    #[arg(long, global = true, help = "CRS catalog JSON")]
    pub crs_catalog: Option<String>,

    #[arg(long, global = true, help = "Unit catalog JSON")]
    pub unit_catalog: Option<String>,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List CRS or unit candidates, optionally narrowed by a query
    List(ListArgs),
    /// Convert a CSV of x,y,z rows
    Convert(ConvertArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListTarget {
    Horizontal,
    Vertical,
    Units,
}

#[derive(Debug, Clone, Args)]
pub struct ListArgs {
    #[arg(long, value_enum, default_value_t = ListTarget::Horizontal)]
    pub axis: ListTarget,

    #[arg(long, help = "Case-insensitive substring filter")]
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct ConvertArgs {
    #[arg(long)]
    pub input: Option<String>,

    #[arg(long)]
    pub output_path: Option<String>,

    #[arg(long)]
    pub stem: Option<String>,

    #[arg(long, help = "Bundle outputs into <stem>.zip")]
    pub archive: bool,

    #[arg(long, help = "Input has no header row")]
    pub no_header: bool,

    #[arg(long)]
    pub concurrency: Option<usize>,

    #[arg(long = "in-h", value_name = "QUERY")]
    pub input_horizontal: Option<String>,

    #[arg(long = "in-v", value_name = "QUERY")]
    pub input_vertical: Option<String>,

    #[arg(long = "out-h", value_name = "QUERY")]
    pub output_horizontal: Option<String>,

    #[arg(long = "out-v", value_name = "QUERY")]
    pub output_vertical: Option<String>,
}

impl ConvertArgs {
    fn query(&self, role: Role) -> Option<&String> {
        match role {
            Role::InputHorizontal => self.input_horizontal.as_ref(),
            Role::InputVertical => self.input_vertical.as_ref(),
            Role::OutputHorizontal => self.output_horizontal.as_ref(),
            Role::OutputVertical => self.output_vertical.as_ref(),
        }
    }

    fn apply(&self, config: &mut TomlConfig) {
        if let Some(input) = &self.input {
            config.input.path = input.clone();
        }
        if let Some(path) = &self.output_path {
            config.output.path = path.clone();
        }
        if let Some(stem) = &self.stem {
            config.output.stem = stem.clone();
        }
        if self.archive {
            config.output.archive = true;
        }
        if self.no_header {
            config.input.has_header = false;
        }
        if let Some(concurrency) = self.concurrency {
            config.engine.concurrency = Some(concurrency);
        }
        for role in Role::ALL {
            if let Some(query) = self.query(role) {
                config.selection.set(role, query.clone());
            }
        }
    }
}

impl CliConfig {
    /// Loads the configuration file, if any, and layers the flags on top.
    pub fn resolve(&self) -> Result<TomlConfig> {
        let mut config = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };

        if let Some(path) = &self.crs_catalog {
            config.catalog.crs = path.clone();
        }
        if let Some(path) = &self.unit_catalog {
            config.catalog.units = path.clone();
        }
        if let Command::Convert(args) = &self.command {
            args.apply(&mut config);
        }

        config.validate()?;
        if matches!(self.command, Command::Convert(_)) {
            validate_path("input.path", &config.input.path)?;
        }
        Ok(config)
    }
}
