use {
    color_eyre::Report,
    eyre::WrapErr,
    std::path::{Path, PathBuf},
};

#[derive(Clone, Debug, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: rigpose::Config,

    pub viewer: ViewerConfig,
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct ViewerConfig {
    /// glTF file with the rigged character.
    pub model: PathBuf,

    /// Recorded input to replay.
    #[serde(default)]
    pub script: Option<PathBuf>,
}

impl Config {
    pub fn load_default() -> Result<Self, Report> {
        let path = std::env::var("RIGPOSE_CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./cfg.ron"));

        Self::load(&path)
    }

    #[tracing::instrument]
    pub fn load(path: &Path) -> Result<Self, Report> {
        let file = std::fs::File::open(path)
            .wrap_err_with(|| format!("Failed to open config '{}'", path.display()))?;
        let config = ron::de::from_reader(file)
            .wrap_err_with(|| format!("Failed to parse config '{}'", path.display()))?;
        Ok(config)
    }
}
