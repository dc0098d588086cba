//! 驱动层错误类型定义

use crate::mode::DrivingMode;
use dbw_can::CanError;
use dbw_tools::ConfigError;
use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// CAN 层错误（帧未注册、发送失败等）
    #[error("CAN error: {0}")]
    Can(#[from] CanError),

    /// 配置文件错误
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// 初始化前缺少必要配置（初始化失败，不留下部分状态）
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// 重复初始化
    #[error("Controller already initialized")]
    AlreadyInitialized,

    /// 尚未初始化
    #[error("Controller not initialized")]
    NotInitialized,

    /// 看门狗已在运行
    #[error("Controller already started")]
    AlreadyStarted,

    /// 进入自动模式前的健康检查失败（此时已处于急停模式）
    #[error("Health check failed while entering {mode:?}")]
    HealthCheckFailed { mode: DrivingMode },

    /// 急停状态下请求进入自动模式（须先回到手动模式）
    #[error("Cannot enter {requested:?} from Emergency mode, switch to Manual first")]
    EmergencyLatched { requested: DrivingMode },

    /// 看门狗线程错误（启动失败等）
    #[error("Watchdog thread error: {0}")]
    WatchdogThread(String),
}

/// 看门狗检测到的安全故障
///
/// 这些故障从不返回给调用方：看门狗直接写入故障码并切换到急停，
/// 这里的类型只用于日志与诊断。
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyFault {
    /// 执行器连续无响应
    #[error("{unit} unit unresponsive for {consecutive_failures} consecutive checks")]
    ActuatorUnresponsive {
        unit: ActuatorUnit,
        consecutive_failures: u32,
    },

    /// 底盘自检报告错误
    #[error("Chassis self-check reported an error")]
    ChassisSelfCheckFailed,
}

/// 执行器通道
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorUnit {
    /// 横向（转向）
    Steering,
    /// 纵向（油门/制动）
    Speed,
}

impl std::fmt::Display for ActuatorUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActuatorUnit::Steering => write!(f, "Steering"),
            ActuatorUnit::Speed => write!(f, "Speed"),
        }
    }
}
