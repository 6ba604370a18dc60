//! Hysteresis and cooldown over a noisy region coefficient.
//!
//! `Released -> Pressed` when `coefficient >= enter_threshold` and at least
//! `cooldown_secs` have passed since the previous press. `Pressed ->
//! Released` when `coefficient < exit_threshold`. Events are emitted only on
//! transitions.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ConfigError, InputError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebounceConfig {
    pub enter_threshold: f64,
    /// Must be strictly below `enter_threshold`.
    pub exit_threshold: f64,
    /// Minimum seconds between two Pressed transitions.
    pub cooldown_secs: f64,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            enter_threshold: 0.10,
            exit_threshold: 0.05,
            cooldown_secs: 1.0,
        }
    }
}

impl DebounceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("enter_threshold", self.enter_threshold),
            ("exit_threshold", self.exit_threshold),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidThreshold {
                    name,
                    value,
                    range: "[0, 1]",
                });
            }
        }
        if self.exit_threshold >= self.enter_threshold {
            return Err(ConfigError::ThresholdOrder {
                enter: self.enter_threshold,
                exit: self.exit_threshold,
            });
        }
        if !self.cooldown_secs.is_finite() || self.cooldown_secs < 0.0 {
            return Err(ConfigError::NegativeCooldown(self.cooldown_secs));
        }
        Ok(())
    }
}

/// One region measurement: coefficient in `[0, 1]` and a timestamp in
/// seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionSample {
    pub coefficient: f64,
    pub timestamp: f64,
}

impl RegionSample {
    pub fn new(coefficient: f64, timestamp: f64) -> Self {
        Self {
            coefficient,
            timestamp,
        }
    }

    pub fn validate(&self) -> Result<(), InputError> {
        if !self.coefficient.is_finite() || !(0.0..=1.0).contains(&self.coefficient) {
            return Err(InputError::CoefficientOutOfRange(self.coefficient));
        }
        if !self.timestamp.is_finite() {
            return Err(InputError::NonFiniteTimestamp(self.timestamp));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonState {
    #[default]
    Released,
    Pressed,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DebounceEvent {
    /// State entered by this transition.
    pub kind: ButtonState,
    pub timestamp: f64,
    pub coefficient: f64,
}

/// Two-state debouncer. Its only state is the current [`ButtonState`] and
/// the timestamp of the last Pressed transition.
#[derive(Debug, Clone)]
pub struct EventDebouncer {
    config: DebounceConfig,
    state: ButtonState,
    last_press: Option<f64>,
}

impl EventDebouncer {
    pub fn new(config: DebounceConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            state: ButtonState::Released,
            last_press: None,
        })
    }

    pub fn config(&self) -> &DebounceConfig {
        &self.config
    }

    pub fn state(&self) -> ButtonState {
        self.state
    }

    pub fn is_pressed(&self) -> bool {
        self.state == ButtonState::Pressed
    }

    /// Timestamp of the most recent Pressed transition.
    pub fn last_press(&self) -> Option<f64> {
        self.last_press
    }

    pub fn reset(&mut self) {
        self.state = ButtonState::Released;
        self.last_press = None;
    }

    /// Feed one sample. A malformed sample leaves the state untouched.
    pub fn update(&mut self, sample: RegionSample) -> Result<Option<DebounceEvent>, InputError> {
        sample.validate()?;
        let RegionSample {
            coefficient,
            timestamp,
        } = sample;

        match self.state {
            ButtonState::Released => {
                if coefficient < self.config.enter_threshold {
                    return Ok(None);
                }
                let cooled_down = match self.last_press {
                    // A clock going backwards counts as no elapsed time.
                    Some(last) => (timestamp - last).max(0.0) >= self.config.cooldown_secs,
                    None => true,
                };
                if !cooled_down {
                    return Ok(None);
                }
                self.state = ButtonState::Pressed;
                self.last_press = Some(timestamp);
            }
            ButtonState::Pressed => {
                if coefficient >= self.config.exit_threshold {
                    return Ok(None);
                }
                self.state = ButtonState::Released;
            }
        }

        info!(state = ?self.state, timestamp, coefficient, "debounce transition");
        Ok(Some(DebounceEvent {
            kind: self.state,
            timestamp,
            coefficient,
        }))
    }
}
