use anyhow::{Result, bail};
use std::collections::HashSet;

/// One requested simulation seed; `None` draws a fresh one from OS entropy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedInfo {
    pub seed: Option<u64>,
}

impl SeedInfo {
    #[must_use]
    pub const fn from_numeric(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }

    #[must_use]
    pub const fn entropy() -> Self {
        Self { seed: None }
    }

    #[must_use]
    pub fn label(&self) -> String {
        self.seed
            .map_or_else(|| "random".to_string(), |seed| seed.to_string())
    }
}

/// Resolve CLI seed tokens.
///
/// Accepts literal integers (negative values use their magnitude) and the
/// keywords `random` / `entropy`. Repeated numeric seeds collapse to one
/// run; each entropy keyword requests its own run. With no tokens the
/// `fallback` seed is used.
pub fn resolve_seed_inputs(tokens: &[String], fallback: Option<u64>) -> Result<Vec<SeedInfo>> {
    let mut resolved: Vec<SeedInfo> = Vec::new();
    let mut seen: HashSet<u64> = HashSet::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }

        if token.eq_ignore_ascii_case("random") || token.eq_ignore_ascii_case("entropy") {
            resolved.push(SeedInfo::entropy());
            continue;
        }

        let seed = if let Ok(value) = token.parse::<i64>() {
            value.unsigned_abs()
        } else if let Ok(value) = token.parse::<u64>() {
            value
        } else {
            bail!("Unrecognized seed token: {token}");
        };

        if seen.insert(seed) {
            resolved.push(SeedInfo::from_numeric(seed));
        }
    }

    if resolved.is_empty() {
        resolved.push(SeedInfo { seed: fallback });
    }

    Ok(resolved)
}
