//! # 车辆配置
//!
//! 控制器初始化所需的静态配置：车型参数、指令限幅、看门狗周期。
//!
//! 配置文件路径（由 CLI 决定）：
//! - Linux: `~/.config/dbw/vehicle.toml`
//! - macOS: `~/Library/Application Support/dbw/vehicle.toml`
//! - Windows: `%APPDATA%\dbw\vehicle.toml`

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// 配置中声明的驾驶模式
///
/// 只是一个"车辆支持该模式"的声明；控制器启动后始终处于手动模式，
/// 急停模式不能出现在配置里。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrivingModeSetting {
    Manual,
    CompleteAutoDrive,
    AutoSteerOnly,
    AutoSpeedOnly,
}

/// 车型参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleParams {
    /// 最大方向盘转角（rad），转向百分比以它为 100%
    pub max_steer_angle: f64,

    /// 最小转向角速度（rad/s）
    pub min_steer_angle_rate: f64,

    /// 最大转向角速度（rad/s）
    pub max_steer_angle_rate: f64,

    /// 未指定角速度时使用的转向角速度（rad/s）
    pub default_steer_angle_rate: f64,
}

impl Default for VehicleParams {
    fn default() -> Self {
        Self {
            // 470°
            max_steer_angle: 8.2030,
            min_steer_angle_rate: 0.0,
            // 400°/s
            max_steer_angle_rate: 6.9813,
            // 200°/s
            default_steer_angle_rate: 3.4907,
        }
    }
}

/// 指令限幅（百分比）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandLimits {
    pub throttle_min: f64,
    pub throttle_max: f64,
    pub brake_min: f64,
    pub brake_max: f64,
    /// 转向百分比绝对值上限
    pub steering_max: f64,
}

impl Default for CommandLimits {
    fn default() -> Self {
        Self {
            throttle_min: 0.0,
            throttle_max: 100.0,
            brake_min: 0.0,
            brake_max: 100.0,
            steering_max: 100.0,
        }
    }
}

/// 安全看门狗设置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchdogSettings {
    /// 巡检周期（ms）
    pub period_ms: u64,

    /// 连续失败多少次后进入急停
    pub max_fail_attempts: u32,

    /// 进入自动模式时同步健康检查的等待上限（ms）
    pub response_wait_ms: u64,
}

impl Default for WatchdogSettings {
    fn default() -> Self {
        Self {
            period_ms: 50,
            max_fail_attempts: 10,
            response_wait_ms: 200,
        }
    }
}

/// 车辆配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleConfig {
    /// 必填：缺失时控制器初始化失败
    pub driving_mode: Option<DrivingModeSetting>,

    #[serde(default)]
    pub vehicle: VehicleParams,

    #[serde(default)]
    pub limits: CommandLimits,

    #[serde(default)]
    pub watchdog: WatchdogSettings,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            driving_mode: Some(DrivingModeSetting::CompleteAutoDrive),
            vehicle: VehicleParams::default(),
            limits: CommandLimits::default(),
            watchdog: WatchdogSettings::default(),
        }
    }
}

impl VehicleConfig {
    /// 从 TOML 字符串解析（不做校验）
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// 序列化为 TOML 字符串
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// 从文件加载配置（不做校验）
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// 保存配置到文件
    ///
    /// 父目录不存在时自动创建。
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    /// 校验数值范围
    ///
    /// 不检查 `driving_mode` 是否存在：那是初始化阶段的错误。
    pub fn validate(&self) -> Result<(), ConfigError> {
        let v = &self.vehicle;
        if !(v.max_steer_angle.is_finite() && v.max_steer_angle > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "vehicle.max_steer_angle must be positive, got {}",
                v.max_steer_angle
            )));
        }
        for (name, rate) in [
            ("min_steer_angle_rate", v.min_steer_angle_rate),
            ("max_steer_angle_rate", v.max_steer_angle_rate),
            ("default_steer_angle_rate", v.default_steer_angle_rate),
        ] {
            if !rate.is_finite() {
                return Err(ConfigError::Invalid(format!(
                    "vehicle.{name} must be finite, got {rate}"
                )));
            }
        }
        if v.min_steer_angle_rate < 0.0 || v.min_steer_angle_rate > v.max_steer_angle_rate {
            return Err(ConfigError::Invalid(format!(
                "steer angle rate bounds are inverted: [{}, {}]",
                v.min_steer_angle_rate, v.max_steer_angle_rate
            )));
        }
        if v.default_steer_angle_rate < v.min_steer_angle_rate
            || v.default_steer_angle_rate > v.max_steer_angle_rate
        {
            return Err(ConfigError::Invalid(format!(
                "vehicle.default_steer_angle_rate {} is outside [{}, {}]",
                v.default_steer_angle_rate, v.min_steer_angle_rate, v.max_steer_angle_rate
            )));
        }

        let l = &self.limits;
        check_percent_range("throttle", l.throttle_min, l.throttle_max)?;
        check_percent_range("brake", l.brake_min, l.brake_max)?;
        if !(0.0..=100.0).contains(&l.steering_max) {
            return Err(ConfigError::Invalid(format!(
                "limits.steering_max must be within 0..=100, got {}",
                l.steering_max
            )));
        }

        let w = &self.watchdog;
        if w.period_ms == 0 {
            return Err(ConfigError::Invalid(
                "watchdog.period_ms must be non-zero".to_string(),
            ));
        }
        if w.max_fail_attempts == 0 {
            return Err(ConfigError::Invalid(
                "watchdog.max_fail_attempts must be non-zero".to_string(),
            ));
        }

        Ok(())
    }
}

fn check_percent_range(name: &str, min: f64, max: f64) -> Result<(), ConfigError> {
    if !(0.0..=100.0).contains(&min) || !(0.0..=100.0).contains(&max) || min > max {
        return Err(ConfigError::Invalid(format!(
            "limits.{name} bounds must satisfy 0 <= min <= max <= 100, got [{min}, {max}]"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = VehicleConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.watchdog.period_ms, 50);
        assert_eq!(config.watchdog.max_fail_attempts, 10);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config = VehicleConfig::from_toml_str(r#"driving_mode = "auto_steer_only""#).unwrap();
        assert_eq!(config.driving_mode, Some(DrivingModeSetting::AutoSteerOnly));
        assert_eq!(config.vehicle, VehicleParams::default());
        assert_eq!(config.limits, CommandLimits::default());
    }

    #[test]
    fn test_missing_driving_mode_parses_as_none() {
        let config = VehicleConfig::from_toml_str(
            r#"
[watchdog]
period_ms = 20
"#,
        )
        .unwrap();
        assert_eq!(config.driving_mode, None);
        assert_eq!(config.watchdog.period_ms, 20);
        assert_eq!(config.watchdog.max_fail_attempts, 10);
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        let result = VehicleConfig::from_toml_str(r#"driving_mode = "emergency""#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = VehicleConfig::default();
        config.vehicle.max_steer_angle = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = VehicleConfig::default();
        config.limits.brake_min = 60.0;
        config.limits.brake_max = 40.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = VehicleConfig::default();
        config.watchdog.max_fail_attempts = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = VehicleConfig::default();
        config.vehicle.default_steer_angle_rate = 100.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("default_steer_angle_rate"));

        // 非有限的角速度会被原样写入转向帧
        let mut config = VehicleConfig::default();
        config.vehicle.max_steer_angle_rate = f64::INFINITY;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_steer_angle_rate"));

        let mut config = VehicleConfig::default();
        config.vehicle.default_steer_angle_rate = f64::NAN;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("default_steer_angle_rate"));

        let mut config = VehicleConfig::default();
        config.vehicle.min_steer_angle_rate = f64::NAN;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_infinite_rate_in_toml_is_rejected() {
        let config = VehicleConfig::from_toml_str(
            r#"
driving_mode = "complete_auto_drive"

[vehicle]
max_steer_angle_rate = inf
default_steer_angle_rate = inf
"#,
        )
        .unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("vehicle.toml");

        let mut config = VehicleConfig::default();
        config.limits.throttle_max = 80.0;
        config.save_to_file(&path).unwrap();

        let loaded = VehicleConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let result = VehicleConfig::load_from_file(dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
