//! `carecache fingerprint` and `carecache analyze`.
//!
//! Both commands take exactly one of `--image PATH` or `--text QUERY`.
//! Output is JSON on stdout so it can be piped into other tools.

use anyhow::{bail, Context, Result};
use std::path::Path;

use care_cache_core::fingerprint::Input;
use care_cache_core::RecordKind;

use crate::config::Config;
use crate::engine::CareEngine;

/// Build an [`Input`] from the CLI flags.
pub fn read_input(image: Option<&Path>, text: Option<&str>) -> Result<Input> {
    match (image, text) {
        (Some(path), None) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("Failed to read image: {}", path.display()))?;
            Ok(Input::ImageBytes(bytes))
        }
        (None, Some(text)) => Ok(Input::Text(text.to_string())),
        (Some(_), Some(_)) => bail!("Pass either --image or --text, not both"),
        (None, None) => bail!("One of --image or --text is required"),
    }
}

/// Print the fingerprint of an input. Touches neither cache nor model.
pub fn run_fingerprint(config: &Config, image: Option<&Path>, text: Option<&str>) -> Result<()> {
    let input = read_input(image, text)?;
    let fingerprint =
        care_cache_core::fingerprint::fingerprint(&input, config.cache.min_image_payload)?;
    println!("{}", fingerprint);
    Ok(())
}

/// Canonicalize and localize an input, printing both records.
pub async fn run_analyze(
    config: &Config,
    kind: RecordKind,
    image: Option<&Path>,
    text: Option<&str>,
    locale: Option<&str>,
) -> Result<()> {
    let input = read_input(image, text)?;
    let locale = locale.unwrap_or(&config.cache.base_locale);

    let engine = CareEngine::from_config(config).await?;
    let analysis = engine.analyze(&input, kind, locale).await?;

    let output = serde_json::json!({
        "fingerprint": analysis.fingerprint,
        "kind": kind.as_str(),
        "canonical": analysis.canonical,
        "localized": analysis.localized,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    let stats = engine.stats();
    tracing::info!(
        hits = stats.hits(),
        misses = stats.misses,
        writes = stats.writes,
        "cache activity"
    );
    Ok(())
}
