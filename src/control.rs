//! Hand-tracking control state.
//!
//! Pure math over normalized landmark coordinates. Each `HandControl` owns
//! its configuration; two independent players in one process never share
//! state through this module.

use serde::{Deserialize, Serialize};

/// Wrist distance (normalized units) below which two hands count as shaking.
pub const HANDSHAKE_DISTANCE: f32 = 0.15;

/// Steering configuration. All tunable at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Output scale applied after clamping.
    pub speed: f32,
    /// Mirror the horizontal axis. On by default: camera images are
    /// mirrored, so a hand moving right appears to move left.
    pub invert_x: bool,
    pub invert_y: bool,
    /// Vertical rest position in [0, 1]; holding the hand here steers
    /// neither up nor down.
    pub neutral_y: f32,
    /// Deflections smaller than this snap to zero so a resting hand does
    /// not drift.
    pub deadzone: f32,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            speed: 1.0,
            invert_x: true,
            invert_y: false,
            neutral_y: 0.5,
            deadzone: 0.1,
        }
    }
}

/// A landmark position in normalized [0, 1] image coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another landmark.
    pub fn distance(&self, other: &Landmark) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// A steering deflection, each axis in [-speed, speed].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Steering {
    pub x: f32,
    pub y: f32,
}

/// Maps hand landmarks to steering deflections.
#[derive(Debug, Clone, Default)]
pub struct HandControl {
    config: ControlConfig,
}

impl HandControl {
    pub fn new(config: ControlConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ControlConfig {
        &self.config
    }

    /// Replace the configuration. Takes effect on the next frame.
    pub fn set_config(&mut self, config: ControlConfig) {
        self.config = config;
    }

    /// Steering deflection for the pointing fingertip position.
    ///
    /// Horizontal centers on 0.5; vertical centers on the configured
    /// neutral. Both axes pass through the deadzone, clamp to [-1, 1] and
    /// scale by speed.
    pub fn steering(&self, tip: Landmark) -> Steering {
        let mut x = (tip.x - 0.5) * 2.0;
        let mut y = (tip.y - self.config.neutral_y) * 2.0;

        if self.config.invert_x {
            x = -x;
        }
        if self.config.invert_y {
            y = -y;
        }

        Steering {
            x: self.shape(x),
            y: self.shape(y),
        }
    }

    /// True when two wrists are close enough to count as a handshake.
    pub fn is_handshake(&self, left_wrist: Landmark, right_wrist: Landmark) -> bool {
        left_wrist.distance(&right_wrist) < HANDSHAKE_DISTANCE
    }

    fn shape(&self, v: f32) -> f32 {
        if v.abs() < self.config.deadzone {
            return 0.0;
        }
        v.clamp(-1.0, 1.0) * self.config.speed
    }
}
