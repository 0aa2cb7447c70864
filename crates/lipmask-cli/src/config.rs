use anyhow::{Context, Result};
use lipmask_core::{JawMaskMode, Occlusion, PipelineConfig};
use std::path::Path;
use std::str::FromStr;

/// Load pipeline settings: TOML file (if given), then `LIPMASK_*`
/// environment variables on top.
pub fn load(path: Option<&Path>) -> Result<PipelineConfig> {
    let mut config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => PipelineConfig::default(),
    };
    apply_env(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Override fields from variables resolved by `lookup`. Unparseable
/// values are ignored with a warning.
fn apply_env(config: &mut PipelineConfig, lookup: impl Fn(&str) -> Option<String>) {
    let non_empty = |key: &str| -> Option<String> { lookup(key).filter(|v| !v.trim().is_empty()) };

    if let Some(v) = env_parse(&non_empty, "LIPMASK_RESOLUTION") {
        config.resolution = v;
    }
    if let Some(v) = env_parse(&non_empty, "LIPMASK_AXIS_JITTER_SIGMA") {
        config.axis_jitter_sigma = v;
    }
    if let Some(v) = env_parse(&non_empty, "LIPMASK_JAW_PUSHBACK") {
        config.jaw_pushback = v;
    }
    if let Some(v) = env_parse(&non_empty, "LIPMASK_JAW_JITTER_SIGMA") {
        config.jaw_jitter_sigma = v;
    }
    if let Some(v) = env_parse(&non_empty, "LIPMASK_UNDER_NOSE_OFFSET") {
        config.under_nose_offset = v;
    }
    if let Some(v) = env_parse(&non_empty, "LIPMASK_SEED") {
        config.seed = Some(v);
    }
    if let Some(v) = non_empty("LIPMASK_JAW_MODE") {
        match v.as_str() {
            "annotate" => config.jaw_mask_mode = JawMaskMode::Annotate,
            "stencil" => config.jaw_mask_mode = JawMaskMode::Stencil,
            other => tracing::warn!(value = other, "ignoring unknown LIPMASK_JAW_MODE"),
        }
    }
    if let Some(v) = non_empty("LIPMASK_OCCLUSION") {
        match v.as_str() {
            "jaw" => config.occlusion = Occlusion::Jaw,
            "ellipse" => config.occlusion = Occlusion::Ellipse,
            other => tracing::warn!(value = other, "ignoring unknown LIPMASK_OCCLUSION"),
        }
    }
}

fn env_parse<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparseable environment override");
            None
        }
    }
}
