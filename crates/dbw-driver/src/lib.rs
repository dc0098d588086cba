//! 驱动层模块
//!
//! 线控底盘的监督控制核心：
//! - 驾驶模式状态机（进入自动模式前做健康检查）
//! - 安全看门狗（独立线程，连续失败后强制急停）
//! - 底盘状态聚合（遥测快照 → 标准化状态 + 接管建议）
//! - 指令闸门（按模式放行执行器指令，并限幅）
//! - 故障状态（故障码 + 故障掩码）
//!
//! 帧的编解码与周期发送由外部的 [`FrameTransmitter`](dbw_can::FrameTransmitter)
//! 负责，这里只决定"什么时候允许发什么"。

mod builder;
pub mod chassis;
pub mod command;
mod controller;
mod error;
pub mod fault;
pub mod gate;
pub mod health;
pub mod mode;
pub mod state_machine;
pub mod watchdog;

pub use builder::ControllerBuilder;
pub use chassis::{Advice, ChassisStatus, EngageAdvice, GearPosition};
pub use command::{CommandIntent, ControlCommand, Signal};
pub use controller::{REQUIRED_COMMANDS, VehicleController};
pub use error::{ActuatorUnit, DriverError, SafetyFault};
pub use fault::{ErrorCode, FaultTracker};
pub use gate::{CommandGate, GateOutcome};
pub use health::{CheckFlags, HealthProbe, UnimplementedProbe};
pub use mode::{AtomicDrivingMode, DrivingMode};
pub use state_machine::DrivingModeStateMachine;
pub use watchdog::{SafetyWatchdog, WatchdogCounters, WatchdogHandle};
