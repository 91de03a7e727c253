//! Renderer and input tuning.

use serde::{Deserialize, Serialize};

/// Progressive render configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Recursion budget of the first pass of a cycle, plus one. Each pass
    /// renders cells of 2^(depth - 1) subdivisions per quadrant axis.
    pub initial_depth: u32,
    /// While moving, a cycle ends once its passes exceed one frame at this
    /// rate.
    pub target_fps: f64,
    /// Workers only look at the abort flag above this recursion depth.
    pub abort_check_depth: u32,
}

impl RenderConfig {
    /// Frame budget in seconds while the viewer is moving.
    pub fn frame_budget(&self) -> f64 {
        if self.target_fps > 0.0 {
            1.0 / self.target_fps
        } else {
            f64::INFINITY
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            initial_depth: 7,
            target_fps: 30.0,
            abort_check_depth: 5,
        }
    }
}

/// How raw input maps to camera motion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Degrees of rotation per pixel of mouse travel
    pub look_sensitivity: f64,
    /// World units per frame at full speed
    pub move_speed: f64,
    /// Speed multiplier while the slow modifier is held
    pub slow_factor: f64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            look_sensitivity: 0.5,
            move_speed: 0.3,
            slow_factor: 0.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RenderConfig::default();
        assert_eq!(config.initial_depth, 7);
        assert_eq!(config.abort_check_depth, 5);
        assert!((config.frame_budget() - 1.0 / 30.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_fps_has_no_budget() {
        let config = RenderConfig {
            target_fps: 0.0,
            ..RenderConfig::default()
        };
        assert_eq!(config.frame_budget(), f64::INFINITY);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: RenderConfig = serde_json::from_str(r#"{ "target_fps": 60 }"#).expect("json");
        assert_eq!(config.target_fps, 60.0);
        assert_eq!(config.initial_depth, 7);

        let input: InputConfig = serde_json::from_str("{}").expect("json");
        assert_eq!(input, InputConfig::default());
    }
}
