//! Tunables for a play session. Defaults reproduce the classic 30 second game.

use crate::error::{Error, Result};

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GameConfig {
    pub duration_ms: f64,
    /// Pixels a note falls per applied motion update.
    pub fall_speed_px: f64,
    /// Minimum spacing between applied motion updates (~60 Hz).
    pub frame_interval_ms: f64,
    /// Hit line position as a fraction of the play-area height.
    pub hit_line_ratio: f64,
    /// A lane refuses new notes while any of its notes is above this offset.
    pub min_spawn_spacing_px: f64,
    pub note_height_min_px: u32, // inclusive
    pub note_height_max_px: u32, // exclusive
    pub spawn_delay_min_ms: f64, // inclusive
    pub spawn_delay_max_ms: f64, // exclusive
    pub hit_points_base: i64,
    pub hit_points_bonus: i64,
    /// Subtracted from the score on every miss outcome.
    pub miss_penalty: i64,
    pub hit_removal_delay_ms: f64,
    pub miss_removal_delay_ms: f64,
    pub log_level: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            duration_ms: 30_000.0,
            fall_speed_px: 3.0,
            frame_interval_ms: 1000.0 / 60.0,
            hit_line_ratio: 0.85,
            min_spawn_spacing_px: 100.0,
            note_height_min_px: 10,
            note_height_max_px: 70,
            spawn_delay_min_ms: 500.0,
            spawn_delay_max_ms: 1500.0,
            hit_points_base: 10,
            hit_points_bonus: 10,
            miss_penalty: 5,
            hit_removal_delay_ms: 200.0,
            miss_removal_delay_ms: 500.0,
            log_level: "info".to_string(),
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("duration_ms", self.duration_ms),
            ("fall_speed_px", self.fall_speed_px),
            ("frame_interval_ms", self.frame_interval_ms),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(Error::InvalidConfig(format!("{name} must be positive")));
            }
        }
        if !(self.hit_line_ratio > 0.0 && self.hit_line_ratio <= 1.0) {
            return Err(Error::InvalidConfig(
                "hit_line_ratio must be in (0, 1]".to_string(),
            ));
        }
        if self.note_height_min_px == 0 || self.note_height_min_px >= self.note_height_max_px {
            return Err(Error::InvalidConfig(
                "note height range is empty".to_string(),
            ));
        }
        if !(self.spawn_delay_min_ms >= 0.0 && self.spawn_delay_min_ms < self.spawn_delay_max_ms) {
            return Err(Error::InvalidConfig(
                "spawn delay range is empty".to_string(),
            ));
        }
        if self.miss_penalty < 0 {
            return Err(Error::InvalidConfig(
                "miss_penalty is a magnitude and must not be negative".to_string(),
            ));
        }
        self.level_filter()?;
        Ok(())
    }

    pub fn level_filter(&self) -> Result<log::LevelFilter> {
        self.log_level
            .parse()
            .map_err(|_| Error::InvalidConfig(format!("unknown log level '{}'", self.log_level)))
    }

    /// Y coordinate of the hit line for a play area `play_height` pixels tall.
    pub fn hit_line_y(&self, play_height: f64) -> f64 {
        play_height * self.hit_line_ratio
    }

    #[cfg(feature = "serde_json")]
    pub fn from_json(json: &str) -> Result<Self> {
        let cfg: GameConfig =
            serde_json::from_str(json).map_err(|e| Error::ConfigParse(e.to_string()))?;
        if let Err(err) = cfg.validate() {
            log::warn!("rejecting config: {err}");
            return Err(err);
        }
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = GameConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.hit_line_y(600.0), 510.0);
    }

    #[test]
    fn rejects_empty_height_range() {
        let cfg = GameConfig {
            note_height_min_px: 70,
            note_height_max_px: 70,
            ..GameConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn rejects_bad_ratio_and_level() {
        let cfg = GameConfig {
            hit_line_ratio: 1.5,
            ..GameConfig::default()
        };
        assert!(cfg.validate().is_err());
        let cfg = GameConfig {
            log_level: "loud".to_string(),
            ..GameConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[cfg(feature = "serde_json")]
    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = GameConfig::from_json(r#"{ "duration_ms": 10000, "log_level": "debug" }"#)
            .expect("valid config");
        assert_eq!(cfg.duration_ms, 10_000.0);
        assert_eq!(cfg.fall_speed_px, 3.0);
        assert_eq!(cfg.level_filter().unwrap(), log::LevelFilter::Debug);
    }

    #[cfg(feature = "serde_json")]
    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            GameConfig::from_json("{ nope"),
            Err(Error::ConfigParse(_))
        ));
        assert!(matches!(
            GameConfig::from_json(r#"{ "fall_speed_px": 0 }"#),
            Err(Error::InvalidConfig(_))
        ));
    }
}
