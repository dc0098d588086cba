//! # DBW CAN Layer
//!
//! 控制器与 CAN 总线之间的协作者抽象：
//!
//! - [`FrameTransmitter`]：外部帧发送器（周期发送调度由实现方负责）
//! - [`MessageManager`]：以 [`FrameId`] 为键的类型化帧注册表 + 遥测快照
//! - `mock`（feature）：记录型发送器，用于测试与仿真

use thiserror::Error;

// 重新导出协议层类型
pub use dbw_protocol::{
    ChassisDetail, CommandMessage, FrameId, OutgoingCommand, ProtocolError, Report,
};

mod message_manager;
pub use message_manager::MessageManager;

#[cfg(feature = "mock")]
pub mod mock;

/// CAN 层统一错误类型
#[derive(Error, Debug)]
pub enum CanError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("Frame {0} is not registered")]
    FrameNotRegistered(FrameId),
    #[error("Frame {0} holds a command of a different type")]
    FrameTypeMismatch(FrameId),
    #[error("Transmitter not running")]
    NotRunning,
    /// 发送器后端拒绝了该帧
    #[error("Transmit failed: {0}")]
    Transmit(String),
}

/// 外部帧发送器
///
/// 真实实现通常持有一个 TX 线程，按各帧的周期把 [`MessageManager`]
/// 中的控制帧发到总线上。控制器只通过这三个方法与它交互。
pub trait FrameTransmitter: Send + Sync {
    /// 发送器是否已启动
    ///
    /// 安全看门狗在发送器启动之前不会开始巡检。
    fn is_running(&self) -> bool;

    /// 立即刷新一次周期帧（使能/复位之后调用，不等下一个周期）
    fn update(&self);

    /// 下发一条已通过模式检查与限幅的控制帧
    fn transmit(&self, command: OutgoingCommand) -> Result<(), CanError>;
}
