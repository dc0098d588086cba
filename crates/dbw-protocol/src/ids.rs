//! 帧 ID 枚举定义
//!
//! 所有控制帧与反馈帧的 CAN ID，并提供 ID 分类功能。

use crate::ProtocolError;
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// 控制帧 ID 范围
pub const COMMAND_BASE_ID: u32 = 0x100;
pub const COMMAND_END_ID: u32 = 0x1FF;

/// 反馈帧 ID 范围
pub const REPORT_BASE_ID: u32 = 0x200;
pub const REPORT_END_ID: u32 = 0x4FF;

/// 帧 ID
///
/// 注册表（`MessageManager`）以此枚举为键，替代按数值 ID 做运行时类型判断。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, IntoPrimitive, TryFromPrimitive,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u32)]
pub enum FrameId {
    // ======================== 控制帧 ========================
    /// 油门指令
    AccelCmd = 0x100,
    /// 制动指令
    BrakeCmd = 0x104,
    /// 大灯指令
    HeadlightCmd = 0x118,
    /// 喇叭指令
    HornCmd = 0x11C,
    /// 驻车制动指令
    ParkingBrakeCmd = 0x124,
    /// 换挡指令
    ShiftCmd = 0x128,
    /// 转向指令
    SteeringCmd = 0x12C,
    /// 转向灯指令
    TurnCmd = 0x130,

    // ======================== 反馈帧 ========================
    /// 油门反馈
    AccelRpt = 0x200,
    /// 制动反馈
    BrakeRpt = 0x204,
    /// 驻车制动反馈
    ParkingBrakeRpt = 0x224,
    /// 挡位反馈
    ShiftRpt = 0x228,
    /// 转向反馈
    SteeringRpt = 0x22C,
    /// 车速反馈
    VehicleSpeedRpt = 0x400,
}

impl FrameId {
    /// 所有控制帧 ID（按 ID 升序）
    pub const COMMANDS: [FrameId; 8] = [
        FrameId::AccelCmd,
        FrameId::BrakeCmd,
        FrameId::HeadlightCmd,
        FrameId::HornCmd,
        FrameId::ParkingBrakeCmd,
        FrameId::ShiftCmd,
        FrameId::SteeringCmd,
        FrameId::TurnCmd,
    ];

    /// 从原始 CAN ID 转换
    pub fn from_raw(id: u32) -> Result<Self, ProtocolError> {
        Self::try_from(id).map_err(|_| ProtocolError::InvalidCanId { id })
    }

    /// 原始 CAN ID
    pub fn raw(self) -> u32 {
        self.into()
    }

    /// 是否为控制帧
    pub fn is_command(self) -> bool {
        (COMMAND_BASE_ID..=COMMAND_END_ID).contains(&self.raw())
    }

    /// 是否为反馈帧
    pub fn is_report(self) -> bool {
        (REPORT_BASE_ID..=REPORT_END_ID).contains(&self.raw())
    }
}

impl std::fmt::Display for FrameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}(0x{:03X})", self, self.raw())
    }
}
