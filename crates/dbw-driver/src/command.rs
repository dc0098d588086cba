//! 命令类型定义
//!
//! - [`CommandIntent`]：单条执行器意图，经 [`CommandGate`](crate::gate::CommandGate)
//!   检查后下发
//! - [`ControlCommand`]：上层控制模块每个周期给出的完整控制量

use crate::chassis::GearPosition;
use dbw_protocol::{HeadlightMode, TurnSignalCmd};

/// 单条执行器意图
///
/// 数值均为上层单位：转向与角速度为百分比，踏板为 0 ~ 100 的百分比。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommandIntent {
    /// 转向（%，左正右负），使用默认转向角速度
    Steer { angle: f64 },
    /// 转向（%）+ 转向角速度（最大角速度的 %）
    SteerWithRate { angle: f64, rate: f64 },
    /// 油门踏板（%）
    Throttle { pedal: f64 },
    /// 制动踏板（%）
    Brake { pedal: f64 },
    Gear(GearPosition),
    TurnSignal(TurnSignalCmd),
    Horn(bool),
    Beam(HeadlightMode),
    ParkingBrake(bool),
}

impl CommandIntent {
    /// 命令名（日志用）
    pub fn name(&self) -> &'static str {
        match self {
            CommandIntent::Steer { .. } => "steer",
            CommandIntent::SteerWithRate { .. } => "steer_with_rate",
            CommandIntent::Throttle { .. } => "throttle",
            CommandIntent::Brake { .. } => "brake",
            CommandIntent::Gear(_) => "gear",
            CommandIntent::TurnSignal(_) => "turn_signal",
            CommandIntent::Horn(_) => "horn",
            CommandIntent::Beam(_) => "beam",
            CommandIntent::ParkingBrake(_) => "parking_brake",
        }
    }

    /// 数值是否全部有限
    pub fn is_finite(&self) -> bool {
        match *self {
            CommandIntent::Steer { angle } => angle.is_finite(),
            CommandIntent::SteerWithRate { angle, rate } => angle.is_finite() && rate.is_finite(),
            CommandIntent::Throttle { pedal } | CommandIntent::Brake { pedal } => pedal.is_finite(),
            _ => true,
        }
    }
}

/// 车身信号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Signal {
    pub turn_signal: TurnSignalCmd,
    pub high_beam: bool,
    pub low_beam: bool,
    pub horn: bool,
}

impl Signal {
    /// 远光优先于近光
    pub fn beam(&self) -> HeadlightMode {
        if self.high_beam {
            HeadlightMode::High
        } else if self.low_beam {
            HeadlightMode::Low
        } else {
            HeadlightMode::Off
        }
    }
}

/// 上层控制模块的单周期控制量
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlCommand {
    /// 油门踏板（%）
    pub throttle: f64,
    /// 制动踏板（%）
    pub brake: f64,
    /// 转向目标（%）
    pub steering_target: f64,
    /// 转向角速度（最大角速度的 %），缺省时使用默认角速度
    pub steering_rate: Option<f64>,
    /// 缺省时不下发换挡
    pub gear_location: Option<GearPosition>,
    pub parking_brake: bool,
    pub signal: Signal,
}

impl ControlCommand {
    /// 转向意图
    pub fn steer_intent(&self) -> CommandIntent {
        match self.steering_rate {
            Some(rate) => CommandIntent::SteerWithRate {
                angle: self.steering_target,
                rate,
            },
            None => CommandIntent::Steer {
                angle: self.steering_target,
            },
        }
    }
}
