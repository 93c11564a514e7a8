use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::level::LevelKind;

/// Runtime options read from the page URL (`?level=maze&seed=42&post=off`)
/// or, natively, from the first command-line argument in the same syntax.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub level: LevelKind,
    pub seed: Option<u64>,
    pub post_processing: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            level: LevelKind::Classic,
            seed: None,
            post_processing: true,
        }
    }
}

impl Settings {
    pub fn parse_query(query: &str) -> Self {
        let mut settings = Self::default();
        let query = query.trim().trim_start_matches('?');

        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            match key {
                "level" => match value.parse() {
                    Ok(level) => settings.level = level,
                    Err(e) => log::warn!("{e}, using {:?}", settings.level),
                },
                "seed" => match value.parse::<u64>() {
                    Ok(seed) => settings.seed = Some(seed),
                    Err(_) => log::warn!("Ignoring invalid seed {value:?}"),
                },
                "post" => match value {
                    "on" | "1" | "true" => settings.post_processing = true,
                    "off" | "0" | "false" => settings.post_processing = false,
                    _ => log::warn!("Ignoring invalid post value {value:?}"),
                },
                _ => log::debug!("Ignoring unknown setting {key:?}"),
            }
        }

        settings
    }

    /// Random source for level and texture generation; reproducible when
    /// a seed was given.
    pub fn rng(&self) -> SmallRng {
        match self.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_rng(&mut rand::rng()),
        }
    }

    #[cfg(target_arch = "wasm32")]
    pub fn from_environment() -> Self {
        let query = web_sys::window()
            .and_then(|w| w.location().search().ok())
            .unwrap_or_default();
        Self::parse_query(&query)
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_environment() -> Self {
        let query = std::env::args().nth(1).unwrap_or_default();
        Self::parse_query(&query)
    }
}
