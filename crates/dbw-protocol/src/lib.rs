//! # DBW Protocol
//!
//! 线控底盘（drive-by-wire）帧定义（无硬件依赖）
//!
//! ## 模块
//!
//! - `ids`: 帧 ID 枚举定义
//! - `control`: 控制帧（下发指令）结构体
//! - `feedback`: 反馈帧（上报数据）结构体与底盘快照
//!
//! ## 边界
//!
//! 本 crate 只描述**类型化**的帧内容（使能位、踏板开度、转向角等），
//! 不定义具体的字节布局。位级编解码由外部帧编解码库负责。

pub mod control;
pub mod feedback;
pub mod ids;

// 重新导出常用类型
pub use control::*;
pub use feedback::*;
pub use ids::*;

use thiserror::Error;

/// 协议错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Invalid CAN ID: 0x{id:X}")]
    InvalidCanId { id: u32 },

    #[error("Invalid value for field {field}: {value}")]
    InvalidValue { field: String, value: u8 },

    #[error("Frame 0x{id:X} is not a command frame")]
    NotACommand { id: u32 },
}
