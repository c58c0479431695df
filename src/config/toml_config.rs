use crate::adapters::geodesy::BuiltinGeodesy;
use crate::core::ConfigProvider;
use crate::domain::model::{Identifier, Role};
use crate::utils::error::{ConvertError, Result};
use crate::utils::validation::{
    validate_file_stem, validate_finite, validate_non_empty_string, validate_path,
    validate_positive_number, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub vertical_offsets: Vec<VerticalOffsetConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_crs_catalog")]
    pub crs: String,
    #[serde(default = "default_unit_catalog")]
    pub units: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    #[serde(default)]
    pub path: String,
    #[serde(default = "default_true")]
    pub has_header: bool,
}

/// Picker query text per role, as typed into the selector.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectionConfig {
    pub input_horizontal: Option<String>,
    pub input_vertical: Option<String>,
    pub output_horizontal: Option<String>,
    pub output_vertical: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    pub concurrency: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: String,
    #[serde(default = "default_stem")]
    pub stem: String,
    #[serde(default)]
    pub archive: bool,
}

/// Constant datum shift: `dst = src + offset_m`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerticalOffsetConfig {
    pub src: String,
    pub dst: String,
    pub offset_m: f64,
}

fn default_crs_catalog() -> String {
    "data/crs.json".to_string()
}

fn default_unit_catalog() -> String {
    "data/units.json".to_string()
}

fn default_output_path() -> String {
    "./output".to_string()
}

fn default_stem() -> String {
    "converted".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            crs: default_crs_catalog(),
            units: default_unit_catalog(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            has_header: true,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            stem: default_stem(),
            archive: false,
        }
    }
}

impl SelectionConfig {
    pub fn get(&self, role: Role) -> Option<&str> {
        let query = match role {
            Role::InputHorizontal => &self.input_horizontal,
            Role::InputVertical => &self.input_vertical,
            Role::OutputHorizontal => &self.output_horizontal,
            Role::OutputVertical => &self.output_vertical,
        };
        query.as_deref()
    }

    pub fn set(&mut self, role: Role, query: String) {
        let slot = match role {
            Role::InputHorizontal => &mut self.input_horizontal,
            Role::InputVertical => &mut self.input_vertical,
            Role::OutputHorizontal => &mut self.output_horizontal,
            Role::OutputVertical => &mut self.output_vertical,
        };
        *slot = Some(query);
    }
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ConvertError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ConvertError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are
    /// left untouched.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| ConvertError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }

    pub fn concurrency(&self) -> usize {
        self.engine.concurrency.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        })
    }

    /// Geodesy provider carrying the configured vertical offsets.
    pub fn build_geodesy(&self) -> Result<BuiltinGeodesy> {
        self.vertical_offsets
            .iter()
            .try_fold(BuiltinGeodesy::new(), |geodesy, offset| {
                let src = parse_identifier("vertical_offsets.src", &offset.src)?;
                let dst = parse_identifier("vertical_offsets.dst", &offset.dst)?;
                Ok(geodesy.with_vertical_offset(src, dst, offset.offset_m))
            })
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_path("catalog.crs", &self.catalog.crs)?;
        validate_path("catalog.units", &self.catalog.units)?;
        validate_path("output.path", &self.output.path)?;
        validate_file_stem("output.stem", &self.output.stem)?;

        if let Some(concurrency) = self.engine.concurrency {
            validate_positive_number("engine.concurrency", concurrency, 1)?;
        }

        for role in Role::ALL {
            if let Some(query) = self.selection.get(role) {
                validate_non_empty_string(&format!("selection.{}", role), query)?;
            }
        }

        for offset in &self.vertical_offsets {
            parse_identifier("vertical_offsets.src", &offset.src)?;
            parse_identifier("vertical_offsets.dst", &offset.dst)?;
            validate_finite("vertical_offsets.offset_m", offset.offset_m)?;
        }

        Ok(())
    }
}

fn parse_identifier(field: &str, value: &str) -> Result<Identifier> {
    value
        .parse::<Identifier>()
        .map_err(|reason| ConvertError::InvalidConfigValue {
            field: field.to_string(),
            value: value.to_string(),
            reason,
        })
}

impl ConfigProvider for TomlConfig {
    fn crs_catalog_path(&self) -> &str {
        &self.catalog.crs
    }

    fn unit_catalog_path(&self) -> &str {
        &self.catalog.units
    }

    fn input_path(&self) -> &str {
        &self.input.path
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn output_stem(&self) -> &str {
        &self.output.stem
    }

    fn archive(&self) -> bool {
        self.output.archive
    }

    fn has_header(&self) -> bool {
        self.input.has_header
    }

    fn concurrency(&self) -> usize {
        TomlConfig::concurrency(self)
    }

    fn selection_query(&self, role: Role) -> Option<&str> {
        self.selection.get(role)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
