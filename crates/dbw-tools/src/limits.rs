//! # 指令限幅
//!
//! 在下发前把上层给出的百分比/角速度夹到配置范围内。

use crate::config::{CommandLimits, VehicleParams};

/// 把 `value` 限制在 `[lower, upper]` 内
///
/// NaN 被映射为下限，保证输出总是有限值（前提是边界有限）。
pub fn bounded_value(lower: f64, upper: f64, value: f64) -> f64 {
    value.max(lower).min(upper)
}

impl CommandLimits {
    /// 油门踏板百分比
    pub fn clamp_throttle(&self, pedal: f64) -> f64 {
        bounded_value(self.throttle_min, self.throttle_max, pedal)
    }

    /// 制动踏板百分比
    pub fn clamp_brake(&self, pedal: f64) -> f64 {
        bounded_value(self.brake_min, self.brake_max, pedal)
    }

    /// 转向百分比（左正右负）
    pub fn clamp_steering(&self, percent: f64) -> f64 {
        bounded_value(-self.steering_max, self.steering_max, percent)
    }
}

impl VehicleParams {
    /// 转向百分比 → 方向盘转角（rad）
    pub fn steering_angle(&self, percent: f64) -> f64 {
        self.max_steer_angle * percent / 100.0
    }

    /// 角速度百分比 → 转向角速度（rad/s），夹在最小/最大角速度之间
    pub fn steering_rate(&self, rate_percent: f64) -> f64 {
        bounded_value(
            self.min_steer_angle_rate,
            self.max_steer_angle_rate,
            self.max_steer_angle_rate * rate_percent / 100.0,
        )
    }
}
