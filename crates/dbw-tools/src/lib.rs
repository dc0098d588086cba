//! # DBW Tools - 共享配置与限幅工具
//!
//! **依赖原则**: 不依赖 `dbw-driver`，驱动层与 CLI 共用这里的配置结构
//!
//! ## 包含模块
//!
//! - `config` - 车辆配置（TOML 读写 + 校验）
//! - `limits` - 指令限幅（纯函数）
//!
//! ## 使用示例
//!
//! ```
//! use dbw_tools::{DrivingModeSetting, VehicleConfig};
//!
//! let config = VehicleConfig::from_toml_str(
//!     r#"
//! driving_mode = "complete_auto_drive"
//!
//! [vehicle]
//! max_steer_angle = 8.2
//! "#,
//! )
//! .unwrap();
//! assert_eq!(config.driving_mode, Some(DrivingModeSetting::CompleteAutoDrive));
//! assert!(config.validate().is_ok());
//! ```

pub mod config;
pub mod limits;

// 重新导出常用类型
pub use config::{
    CommandLimits, ConfigError, DrivingModeSetting, VehicleConfig, VehicleParams,
    WatchdogSettings,
};
pub use limits::bounded_value;
