use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, ensure};

use frogpile::{DefaultLevel, MAX_SNAPSHOT_ENTITIES, PlatformDef, SessionConfig, StaticWorld};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub tick_rate: u32,
    pub max_clients: usize,
    /// Ticks between snapshot broadcasts.
    pub snapshot_send_rate: u32,
    /// Tick batches buffered for the outbound task before new ones are dropped.
    pub outbound_capacity: usize,
    pub client_timeout: Duration,
    pub allow_map_edits: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_rate: frogpile::DEFAULT_TICK_RATE,
            max_clients: 32,
            snapshot_send_rate: 1,
            outbound_capacity: 64,
            client_timeout: Duration::from_secs(30),
            allow_map_edits: false,
        }
    }
}

impl ServerConfig {
    /// Every live entity must fit the single-datagram snapshot.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.tick_rate > 0, "tick rate must be positive");
        ensure!(self.snapshot_send_rate > 0, "snapshot send rate must be positive");
        ensure!(self.outbound_capacity > 0, "outbound capacity must be positive");
        ensure!(
            (1..=MAX_SNAPSHOT_ENTITIES).contains(&self.max_clients),
            "max clients must be between 1 and {}, got {}",
            MAX_SNAPSHOT_ENTITIES,
            self.max_clients
        );
        Ok(())
    }
}

/// Reads a level file (a JSON list of `{width, height, x, y}`), or builds the
/// stock level when no path is given.
pub fn load_map(
    path: Option<&Path>,
    viewport_width: f32,
    viewport_height: f32,
) -> Result<StaticWorld> {
    let Some(path) = path else {
        return DefaultLevel::new(viewport_width, viewport_height)
            .build()
            .context("building default level");
    };

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading map file {}", path.display()))?;
    parse_map(&text).with_context(|| format!("loading map file {}", path.display()))
}

fn parse_map(text: &str) -> Result<StaticWorld> {
    let defs: Vec<PlatformDef> = serde_json::from_str(text).context("invalid map JSON")?;
    Ok(StaticWorld::from_defs(&defs)?)
}

/// Reads session tuning from a JSON file. Missing fields keep their defaults.
pub fn load_session_config(path: Option<&Path>) -> Result<SessionConfig> {
    let Some(path) = path else {
        return Ok(SessionConfig::default());
    };

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    parse_session_config(&text).with_context(|| format!("loading config file {}", path.display()))
}

fn parse_session_config(text: &str) -> Result<SessionConfig> {
    let config: SessionConfig = serde_json::from_str(text).context("invalid config JSON")?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_platform_list() {
        let world = parse_map(
            r#"[{"width": 1920, "height": 100, "x": 0, "y": 980},
                {"width": 150, "height": 20, "x": 600, "y": 400}]"#,
        )
        .unwrap();

        assert_eq!(world.len(), 2);
        assert_eq!(world.ground().rect.y, 980.0);
    }

    #[test]
    fn client_cap_is_bounded_by_snapshot_size() {
        assert!(ServerConfig::default().validate().is_ok());

        let at_limit = ServerConfig {
            max_clients: MAX_SNAPSHOT_ENTITIES,
            ..Default::default()
        };
        assert!(at_limit.validate().is_ok());

        let oversized = ServerConfig {
            max_clients: 200,
            ..Default::default()
        };
        assert!(oversized.validate().is_err());

        let empty = ServerConfig {
            max_clients: 0,
            ..Default::default()
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn session_config_file_sets_grab_band() {
        let config = parse_session_config(
            r#"{"grab": {"vertical_band": 40, "held_accepts_intents": false}}"#,
        )
        .unwrap();

        assert_eq!(config.grab.vertical_band, 40.0);
        assert!(!config.grab.held_accepts_intents);
        assert_eq!(config.grab.reach, 180.0);
        assert_eq!(config.physics.gravity, 1.0);
    }

    #[test]
    fn invalid_session_config_file_is_rejected() {
        assert!(parse_session_config(r#"{"physics": {"friction": 1.5}}"#).is_err());
        assert!(parse_session_config("not json").is_err());
        assert!(load_session_config(None).is_ok());
    }

    #[test]
    fn empty_map_is_rejected() {
        assert!(parse_map("[]").is_err());
    }

    #[test]
    fn missing_path_uses_default_level() {
        let world = load_map(None, 1920.0, 1080.0).unwrap();
        assert_eq!(world.len(), 7);
    }
}
