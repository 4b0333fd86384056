use crate::domain::tuning::{
    AttachmentTuning, AudioTuning, CafeTuning, CoffeeTuning, InteractionTuning, LightTuning,
    ScenarioTuning,
};
use serde::Deserialize;
use std::{env, fmt, fs, path::PathBuf, time::Duration};

// Runtime settings (tick rate, seed, run length) plus the gameplay tuning
// sections, read from an optional TOML file and then the environment.

pub const CONFIG_PATH_VAR: &str = "CAFE_CONFIG";

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub tick_hz: u32,
    /// Fixed seed for the random source; `None` derives one from the clock.
    pub seed: Option<u64>,
    /// Seconds to run before stopping; `0` runs until Ctrl-C.
    pub run_seconds: f64,
    /// Seconds between JSON snapshots in the log; `0` disables them.
    pub snapshot_every: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_hz: 60,
            seed: None,
            run_seconds: 0.0,
            snapshot_every: 5.0,
        }
    }
}

impl SimulationConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_hz.max(1)))
    }

    pub fn run_limit(&self) -> Option<Duration> {
        if self.run_seconds > 0.0 {
            Duration::try_from_secs_f64(self.run_seconds).ok()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct CafeConfig {
    pub simulation: SimulationConfig,
    pub scenarios: ScenarioTuning,
    pub coffee: CoffeeTuning,
    pub lights: LightTuning,
    pub attachment: AttachmentTuning,
    pub interaction: InteractionTuning,
    pub audio: AudioTuning,
}

#[derive(Debug)]
pub enum ConfigError {
    Read { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "failed to read config {}: {source}", path.display())
            }
            ConfigError::Parse(e) => write!(f, "invalid config: {e}"),
            ConfigError::Invalid { field, reason } => {
                write!(f, "invalid config: {field} {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Invalid { .. } => None,
        }
    }
}

impl CafeConfig {
    /// Reads the file named by `CAFE_CONFIG` (defaults when unset), then
    /// applies `SIM_*` environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match env::var_os(CONFIG_PATH_VAR) {
            Some(path) => Self::from_file(PathBuf::from(path))?,
            None => Self::default(),
        };
        config.apply_overrides(|name| env::var(name).ok());
        Ok(config)
    }

    pub fn from_file(path: PathBuf) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "config file loaded");
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the simulation cannot run with. Every number must be
    /// finite and periodic delays must be longer than zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sim = &self.simulation;
        let sc = &self.scenarios;
        let coffee = &self.coffee;
        let lights = &self.lights;
        let att = &self.attachment;
        let reach = &self.interaction;
        let audio = &self.audio;

        let positive = [
            ("scenarios.interval", sc.interval),
            ("lights.min_flicker_interval", lights.min_flicker_interval),
            ("lights.max_flicker_interval", lights.max_flicker_interval),
            ("lights.flicker_blink", lights.flicker_blink),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(field, "must be a positive number"));
            }
        }

        let non_negative = [
            ("simulation.run_seconds", sim.run_seconds),
            ("simulation.snapshot_every", sim.snapshot_every),
            ("scenarios.guest_revert_delay", f64::from(sc.guest_revert_delay)),
            ("scenarios.thing_hide_delay", f64::from(sc.thing_hide_delay)),
            ("scenarios.rotation_threshold", f64::from(sc.rotation_threshold)),
            ("scenarios.front_distance", f64::from(sc.front_distance)),
            ("scenarios.return_speed", f64::from(sc.return_speed)),
            ("scenarios.return_epsilon", f64::from(sc.return_epsilon)),
            ("scenarios.watch_timeout", f64::from(sc.watch_timeout)),
            ("coffee.working_time", f64::from(coffee.working_time)),
            ("coffee.brew_duration", f64::from(coffee.brew_duration)),
            ("attachment.attach_speed", f64::from(att.attach_speed)),
            ("attachment.rise_height", f64::from(att.rise_height)),
            ("attachment.snap_epsilon", f64::from(att.snap_epsilon)),
            ("attachment.overlap_radius", f64::from(att.overlap_radius)),
            ("interaction.ray_distance", f64::from(reach.ray_distance)),
            ("interaction.throw_distance", f64::from(reach.throw_distance)),
            ("interaction.hold_distance", f64::from(reach.hold_distance)),
            ("audio.main_calm", f64::from(audio.main_calm)),
            ("audio.main_tense", f64::from(audio.main_tense)),
            ("audio.relax_on", f64::from(audio.relax_on)),
            ("audio.relax_off", f64::from(audio.relax_off)),
            ("audio.cafe_noise_up", f64::from(audio.cafe_noise_up)),
            ("audio.cafe_noise_down", f64::from(audio.cafe_noise_down)),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(field, "must be zero or more"));
            }
        }

        if !lights.switch_off_tilt.is_finite() {
            return Err(invalid("lights.switch_off_tilt", "must be finite"));
        }
        let vectors = [
            ("scenarios.spawn_offset", sc.spawn_offset),
            ("coffee.coffee_start_scale", coffee.coffee_start_scale),
            ("coffee.coffee_end_scale", coffee.coffee_end_scale),
            ("coffee.coffee_start_position", coffee.coffee_start_position),
            ("coffee.coffee_end_position", coffee.coffee_end_position),
        ];
        for (field, v) in vectors {
            if ![v.x, v.y, v.z].iter().all(|c| c.is_finite()) {
                return Err(invalid(field, "must be finite"));
            }
        }
        if !att.seated_rotation.iter().all(|c| c.is_finite()) {
            return Err(invalid("attachment.seated_rotation", "must be finite"));
        }
        Ok(())
    }

    /// Applies overrides from a variable lookup. Values that do not parse, or
    /// durations that are negative or not finite, are ignored with a warning
    /// and the current setting is kept.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let simulation = &mut self.simulation;
        if let Some(hz) = parse_var(&lookup, "SIM_TICK_HZ") {
            simulation.tick_hz = hz;
        }
        if let Some(seed) = parse_var(&lookup, "SIM_SEED") {
            simulation.seed = Some(seed);
        }
        if let Some(seconds) = parse_seconds(&lookup, "SIM_RUN_SECONDS") {
            simulation.run_seconds = seconds;
        }
        if let Some(seconds) = parse_seconds(&lookup, "SIM_SNAPSHOT_EVERY") {
            simulation.snapshot_every = seconds;
        }
    }

    pub fn tuning(&self) -> CafeTuning {
        CafeTuning {
            scenarios: self.scenarios,
            coffee: self.coffee,
            lights: self.lights,
            attachment: self.attachment,
            interaction: self.interaction,
            audio: self.audio,
        }
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Option<T> {
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(name, value = %raw, "ignoring unparsable override");
            None
        }
    }
}

fn parse_seconds(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<f64> {
    let seconds: f64 = parse_var(lookup, name)?;
    if seconds.is_finite() && seconds >= 0.0 {
        Some(seconds)
    } else {
        tracing::warn!(name, seconds, "ignoring out-of-range override");
        None
    }
}

fn invalid(field: &'static str, reason: &'static str) -> ConfigError {
    ConfigError::Invalid { field, reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn empty_file_gives_defaults() {
        let config = CafeConfig::from_toml_str("").expect("empty config parses");

        assert_eq!(config.simulation.tick_hz, 60);
        assert_eq!(config.simulation.seed, None);
        assert_eq!(config.scenarios.interval, 60.0);
        assert_eq!(config.coffee.working_time, 10.0);
        assert_eq!(config.interaction.serve_reward, 100);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = CafeConfig::from_toml_str(
            r#"
            [simulation]
            seed = 7
            run_seconds = 30.0

            [scenarios]
            interval = 5.0
            thing_from_the_back = false
            "#,
        )
        .expect("partial config parses");

        assert_eq!(config.simulation.seed, Some(7));
        assert_eq!(config.simulation.tick_hz, 60);
        assert_eq!(config.simulation.run_limit(), Some(Duration::from_secs(30)));
        assert_eq!(config.scenarios.interval, 5.0);
        assert!(!config.scenarios.thing_from_the_back);
        assert!(config.scenarios.guest_replacement);
        assert_eq!(config.tuning().scenarios.guest_revert_delay, 3.0);
    }

    #[test]
    fn malformed_toml_is_an_error() {
        let err = CafeConfig::from_toml_str("[simulation\ntick_hz = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().starts_with("invalid config"));
    }

    #[test]
    fn zero_flicker_timings_are_rejected() {
        let err = CafeConfig::from_toml_str(
            r#"
            [lights]
            min_flicker_interval = 0.0
            max_flicker_interval = 0.0
            flicker_blink = 0.0
            "#,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "lights.min_flicker_interval",
                ..
            }
        ));

        let err = CafeConfig::from_toml_str("[lights]\nflicker_blink = 0.0").unwrap_err();
        assert!(err.to_string().contains("lights.flicker_blink"));
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let err = CafeConfig::from_toml_str("[lights]\nmax_flicker_interval = nan").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));

        let err = CafeConfig::from_toml_str("[simulation]\nrun_seconds = inf").unwrap_err();
        assert!(err.to_string().contains("simulation.run_seconds"));

        let err = CafeConfig::from_toml_str(
            "[scenarios]\nspawn_offset = { x = nan, y = 0.0, z = 0.0 }",
        )
        .unwrap_err();
        assert!(err.to_string().contains("scenarios.spawn_offset"));
    }

    #[test]
    fn non_finite_overrides_are_skipped() {
        let vars: HashMap<&str, &str> =
            [("SIM_RUN_SECONDS", "inf"), ("SIM_SNAPSHOT_EVERY", "NaN")]
                .into_iter()
                .collect();
        let mut config = CafeConfig::default();
        config.simulation.run_seconds = 12.0;

        config.apply_overrides(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.simulation.run_seconds, 12.0);
        assert_eq!(config.simulation.snapshot_every, 5.0);
        assert_eq!(config.simulation.run_limit(), Some(Duration::from_secs(12)));

        config.simulation.run_seconds = f64::INFINITY;
        assert_eq!(config.simulation.run_limit(), None);
    }

    #[test]
    fn missing_file_reports_the_path() {
        let err = CafeConfig::from_file(PathBuf::from("/nonexistent/cafe.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/cafe.toml"));
    }

    #[test]
    fn environment_overrides_win_and_bad_values_are_skipped() {
        let vars: HashMap<&str, &str> = [
            ("SIM_TICK_HZ", "30"),
            ("SIM_SEED", "99"),
            ("SIM_RUN_SECONDS", "not-a-number"),
            ("SIM_SNAPSHOT_EVERY", "0"),
        ]
        .into_iter()
        .collect();
        let mut config = CafeConfig::default();
        config.simulation.run_seconds = 12.0;

        config.apply_overrides(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.simulation.tick_hz, 30);
        assert_eq!(config.simulation.seed, Some(99));
        assert_eq!(config.simulation.run_seconds, 12.0);
        assert_eq!(config.simulation.snapshot_every, 0.0);
        assert_eq!(
            config.simulation.tick_interval(),
            Duration::from_secs_f64(1.0 / 30.0)
        );
    }
}
