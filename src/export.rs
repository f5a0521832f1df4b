use crate::params::{ParamError, ParameterSet};
use crate::raster::PixelBuffer;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

const FILE_PREFIX: &str = "cosmic-shader";

#[derive(Debug, Clone, PartialEq)]
pub enum ExportError {
    Io(String),
    Json(String),
    Image(String),
    Invalid(ParamError),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
            Self::Json(msg) => write!(f, "settings JSON error: {msg}"),
            Self::Image(msg) => write!(f, "image encode error: {msg}"),
            Self::Invalid(err) => write!(f, "invalid settings: {err}"),
        }
    }
}

impl std::error::Error for ExportError {}

impl From<ParamError> for ExportError {
    fn from(err: ParamError) -> Self {
        Self::Invalid(err)
    }
}

pub fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

pub fn settings_file_name(millis: u128) -> String {
    format!("{FILE_PREFIX}-settings-{millis}.json")
}

pub fn screenshot_file_name(millis: u128) -> String {
    format!("{FILE_PREFIX}-{millis}.png")
}

/// Pretty-printed flat record of the current parameters.
pub fn settings_json(params: &ParameterSet) -> Result<String, ExportError> {
    serde_json::to_string_pretty(params).map_err(|e| ExportError::Json(e.to_string()))
}

/// Parses an exported record. Missing keys keep their defaults; the result
/// must satisfy every parameter invariant.
pub fn parse_settings(text: &str) -> Result<ParameterSet, ExportError> {
    let params: ParameterSet =
        serde_json::from_str(text).map_err(|e| ExportError::Json(e.to_string()))?;
    params.validate()?;
    Ok(params)
}

pub fn import_settings(path: &Path) -> Result<ParameterSet, ExportError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| ExportError::Io(format!("{}: {e}", path.display())))?;
    parse_settings(&text)
}

pub fn export_settings(dir: &Path, params: &ParameterSet) -> Result<PathBuf, ExportError> {
    let body = settings_json(params)?;
    let path = dir.join(settings_file_name(unix_millis()));
    write_atomic(&path, body.as_bytes())?;
    log::info!("exported settings to {}", path.display());
    Ok(path)
}

pub fn save_png(path: &Path, frame: &PixelBuffer) -> Result<(), ExportError> {
    let img = image::RgbaImage::from_raw(
        frame.width as u32,
        frame.height as u32,
        frame.pixels.clone(),
    )
    .ok_or_else(|| {
        ExportError::Image(format!(
            "pixel buffer does not match {}x{}",
            frame.width, frame.height
        ))
    })?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| ExportError::Io(e.to_string()))?;
        }
    }
    img.save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| ExportError::Image(e.to_string()))
}

pub fn save_screenshot(dir: &Path, frame: &PixelBuffer) -> Result<PathBuf, ExportError> {
    let path = dir.join(screenshot_file_name(unix_millis()));
    save_png(&path, frame)?;
    log::info!(
        "saved {}x{} screenshot to {}",
        frame.width,
        frame.height,
        path.display()
    );
    Ok(path)
}

fn write_atomic(path: &Path, body: &[u8]) -> Result<(), ExportError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| ExportError::Io(e.to_string()))?;
        }
    }
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, body).map_err(|e| ExportError::Io(e.to_string()))?;
    std::fs::rename(&tmp, path).map_err(|e| ExportError::Io(e.to_string()))
}
