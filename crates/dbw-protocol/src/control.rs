//! 控制帧结构体定义
//!
//! 每个控制帧都有一个"安全基线"（[`Default`]）：未使能、踏板为零、
//! 挡位/灯光为 None。急停或退出自动驾驶时，所有控制帧复位到基线。

use crate::ProtocolError;
use crate::feedback::ShiftPosition;
use crate::ids::FrameId;
use num_enum::IntoPrimitive;

/// 控制帧 Trait
///
/// 把具体结构体与 [`OutgoingCommand`] 的枚举变体绑定起来，
/// 注册表据此按类型取出对应的帧，不需要运行时类型判断。
pub trait CommandMessage: Copy + Default + std::fmt::Debug {
    /// 帧 ID
    const ID: FrameId;

    /// 复位到安全基线
    fn reset(&mut self) {
        *self = Self::default();
    }

    /// 包装为 [`OutgoingCommand`]
    fn into_command(self) -> OutgoingCommand;

    /// 从 [`OutgoingCommand`] 中取出（变体不匹配时返回 `None`）
    fn from_command(command: &OutgoingCommand) -> Option<&Self>;

    /// 从 [`OutgoingCommand`] 中可变取出
    fn from_command_mut(command: &mut OutgoingCommand) -> Option<&mut Self>;
}

/// 油门指令 (0x100)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccelCmd {
    pub enable: bool,
    /// 油门踏板开度：0.0 ~ 1.0
    pub accel_cmd: f64,
}

/// 制动指令 (0x104)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BrakeCmd {
    pub enable: bool,
    /// 制动踏板开度：0.0 ~ 1.0
    pub brake_cmd: f64,
}

/// 换挡指令 (0x128)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShiftCmd {
    pub enable: bool,
    pub shift_cmd: ShiftPosition,
}

/// 转向指令 (0x12C)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SteeringCmd {
    pub enable: bool,
    /// 目标转向角（rad），左正右负
    pub position: f64,
    /// 转向角速度（rad/s）
    pub rotation_rate: f64,
}

/// 转向灯编码
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum TurnSignalCmd {
    Right = 0,
    None = 1,
    Left = 2,
    Hazard = 3,
}

impl Default for TurnSignalCmd {
    fn default() -> Self {
        TurnSignalCmd::None
    }
}

/// 转向灯指令 (0x130)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TurnCmd {
    pub turn_signal_cmd: TurnSignalCmd,
}

/// 喇叭指令 (0x11C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HornCmd {
    pub horn_cmd: bool,
}

/// 大灯模式编码
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum HeadlightMode {
    Off = 0,
    Low = 1,
    High = 2,
}

impl Default for HeadlightMode {
    fn default() -> Self {
        HeadlightMode::Off
    }
}

/// 大灯指令 (0x118)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HeadlightCmd {
    pub headlight_cmd: HeadlightMode,
}

/// 驻车制动指令 (0x124)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParkingBrakeCmd {
    pub parking_brake_cmd: bool,
}

// 执行器类控制帧的使能位
macro_rules! impl_enable {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $ty {
                /// 设置使能位
                pub fn set_enable(&mut self, enable: bool) -> &mut Self {
                    self.enable = enable;
                    self
                }
            }
        )*
    };
}

impl_enable!(AccelCmd, BrakeCmd, ShiftCmd, SteeringCmd);

/// 待发送的控制帧（类型化）
///
/// 交给外部帧发送器的唯一形态：已经过模式检查与限幅。
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OutgoingCommand {
    Accel(AccelCmd),
    Brake(BrakeCmd),
    Shift(ShiftCmd),
    Steering(SteeringCmd),
    Turn(TurnCmd),
    Horn(HornCmd),
    Headlight(HeadlightCmd),
    ParkingBrake(ParkingBrakeCmd),
}

macro_rules! impl_command_message {
    ($ty:ty, $variant:ident, $id:expr) => {
        impl CommandMessage for $ty {
            const ID: FrameId = $id;

            fn into_command(self) -> OutgoingCommand {
                OutgoingCommand::$variant(self)
            }

            fn from_command(command: &OutgoingCommand) -> Option<&Self> {
                match command {
                    OutgoingCommand::$variant(inner) => Some(inner),
                    _ => None,
                }
            }

            fn from_command_mut(command: &mut OutgoingCommand) -> Option<&mut Self> {
                match command {
                    OutgoingCommand::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

impl_command_message!(AccelCmd, Accel, FrameId::AccelCmd);
impl_command_message!(BrakeCmd, Brake, FrameId::BrakeCmd);
impl_command_message!(ShiftCmd, Shift, FrameId::ShiftCmd);
impl_command_message!(SteeringCmd, Steering, FrameId::SteeringCmd);
impl_command_message!(TurnCmd, Turn, FrameId::TurnCmd);
impl_command_message!(HornCmd, Horn, FrameId::HornCmd);
impl_command_message!(HeadlightCmd, Headlight, FrameId::HeadlightCmd);
impl_command_message!(ParkingBrakeCmd, ParkingBrake, FrameId::ParkingBrakeCmd);

impl OutgoingCommand {
    /// 指定控制帧的安全基线
    pub fn baseline(id: FrameId) -> Result<Self, ProtocolError> {
        let command = match id {
            FrameId::AccelCmd => AccelCmd::default().into_command(),
            FrameId::BrakeCmd => BrakeCmd::default().into_command(),
            FrameId::ShiftCmd => ShiftCmd::default().into_command(),
            FrameId::SteeringCmd => SteeringCmd::default().into_command(),
            FrameId::TurnCmd => TurnCmd::default().into_command(),
            FrameId::HornCmd => HornCmd::default().into_command(),
            FrameId::HeadlightCmd => HeadlightCmd::default().into_command(),
            FrameId::ParkingBrakeCmd => ParkingBrakeCmd::default().into_command(),
            other => return Err(ProtocolError::NotACommand { id: other.raw() }),
        };
        Ok(command)
    }

    /// 帧 ID
    pub fn id(&self) -> FrameId {
        match self {
            OutgoingCommand::Accel(_) => AccelCmd::ID,
            OutgoingCommand::Brake(_) => BrakeCmd::ID,
            OutgoingCommand::Shift(_) => ShiftCmd::ID,
            OutgoingCommand::Steering(_) => SteeringCmd::ID,
            OutgoingCommand::Turn(_) => TurnCmd::ID,
            OutgoingCommand::Horn(_) => HornCmd::ID,
            OutgoingCommand::Headlight(_) => HeadlightCmd::ID,
            OutgoingCommand::ParkingBrake(_) => ParkingBrakeCmd::ID,
        }
    }

    /// 复位到安全基线
    pub fn reset(&mut self) {
        match self {
            OutgoingCommand::Accel(c) => c.reset(),
            OutgoingCommand::Brake(c) => c.reset(),
            OutgoingCommand::Shift(c) => c.reset(),
            OutgoingCommand::Steering(c) => c.reset(),
            OutgoingCommand::Turn(c) => c.reset(),
            OutgoingCommand::Horn(c) => c.reset(),
            OutgoingCommand::Headlight(c) => c.reset(),
            OutgoingCommand::ParkingBrake(c) => c.reset(),
        }
    }
}
