//! Commands behind the `lingua` binary.

use std::fmt::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use lingua::config::resolve_chains_path;
use lingua_extraction::ChainRegistry;
use serde::Serialize;

/// Resolves and loads the chain registry.
///
/// # Errors
/// Returns an error if no location can be determined or the file does not load.
pub fn load_registry(explicit: Option<PathBuf>) -> anyhow::Result<(PathBuf, ChainRegistry)> {
    let path = resolve_chains_path(explicit).context("Could not determine config directory")?;
    let registry = ChainRegistry::from_path(&path)
        .with_context(|| format!("Failed to load chains from {}", path.display()))?;
    Ok((path, registry))
}

/// Problems found in a registry.
#[derive(Debug, Default, Serialize)]
pub struct CheckReport {
    /// Number of features configured.
    pub features: usize,
    /// One line per problem.
    pub problems: Vec<String>,
}

impl CheckReport {
    /// Whether the registry is usable as is.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Lints `registry`. With `require_schema`, chains without a schema count as
/// problems too.
#[must_use]
pub fn check(registry: &ChainRegistry, require_schema: bool) -> CheckReport {
    let mut problems = registry.lint(None);
    if require_schema {
        problems.extend(
            registry
                .iter()
                .filter(|(_, chain)| chain.schema.is_none())
                .map(|(feature, _)| format!("chain '{feature}' has no schema")),
        );
    }
    if registry.is_empty() {
        problems.push("no chains configured".to_string());
    }

    CheckReport {
        features: registry.len(),
        problems,
    }
}

/// Summary of one configured chain.
#[derive(Debug, Serialize)]
pub struct ChainSummary {
    /// Feature name.
    pub feature: String,
    /// Diagnostic label.
    pub label: String,
    /// `kind:model` per provider, in fallback order.
    pub providers: Vec<String>,
    /// Whether structured extraction is possible.
    pub has_schema: bool,
}

/// Summaries of every chain, ordered by feature.
#[must_use]
pub fn summarize(registry: &ChainRegistry) -> Vec<ChainSummary> {
    registry
        .iter()
        .map(|(feature, chain)| ChainSummary {
            feature: feature.to_string(),
            label: chain.display_label().to_string(),
            providers: chain
                .providers
                .iter()
                .map(|p| format!("{}:{}", p.kind(), p.model()))
                .collect(),
            has_schema: chain.schema.is_some(),
        })
        .collect()
}

/// Renders summaries as text, one block per chain.
#[must_use]
pub fn render_summaries(path: &Path, summaries: &[ChainSummary]) -> String {
    let mut out = format!("{} ({} chains)\n", path.display(), summaries.len());
    for summary in summaries {
        let _ = writeln!(
            out,
            "\n{} [{}]{}",
            summary.feature,
            summary.label,
            if summary.has_schema { " schema" } else { "" }
        );
        for (index, provider) in summary.providers.iter().enumerate() {
            let _ = writeln!(out, "  {}. {provider}", index + 1);
        }
    }
    out
}
