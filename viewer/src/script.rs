use {
    color_eyre::Report,
    eyre::WrapErr,
    rigpose::InputEvent,
    std::path::Path,
};

/// Input recorded frame by frame.
#[derive(Clone, Debug, Default, serde::Deserialize)]
pub struct Script {
    pub frames: Vec<Vec<InputEvent>>,
}

impl Script {
    #[tracing::instrument]
    pub fn load(path: &Path) -> Result<Self, Report> {
        let file = std::fs::File::open(path)
            .wrap_err_with(|| format!("Failed to open script '{}'", path.display()))?;
        let script: Script = ron::de::from_reader(file)
            .wrap_err_with(|| format!("Failed to parse script '{}'", path.display()))?;
        tracing::info!("Script with {} frames loaded", script.frames.len());
        Ok(script)
    }
}
