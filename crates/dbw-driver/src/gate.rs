//! 指令闸门
//!
//! 每条执行器意图先检查当前驾驶模式：
//!
//! | 意图 | 允许的模式 |
//! |------|-----------|
//! | 转向 | CompleteAutoDrive / AutoSteerOnly |
//! | 油门 / 制动 / 挡位 / 驻车制动 | CompleteAutoDrive / AutoSpeedOnly |
//! | 转向灯 / 喇叭 / 大灯 | 任一自动模式 |
//!
//! 不允许时记录日志并丢弃（不是错误），不会调用发送器。
//! 允许时先限幅，写入注册表中对应的控制帧，再把完整的帧交给发送器。

use crate::chassis::GearPosition;
use crate::command::CommandIntent;
use crate::error::DriverError;
use crate::mode::DrivingMode;
use crate::state_machine::DrivingModeStateMachine;
use dbw_can::{CommandMessage, FrameTransmitter, MessageManager, OutgoingCommand};
use dbw_protocol::{
    AccelCmd, BrakeCmd, HeadlightCmd, HornCmd, ParkingBrakeCmd, ShiftCmd, ShiftPosition,
    SteeringCmd, TurnCmd,
};
use dbw_tools::{CommandLimits, VehicleParams};
use std::sync::Arc;
use tracing::{error, trace, warn};

/// 闸门处理结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateOutcome {
    /// 已限幅并交给发送器
    Forwarded(OutgoingCommand),
    /// 当前模式不允许该指令
    Dropped { mode: DrivingMode },
    /// 数值非有限（NaN / 无穷）
    Rejected,
}

impl GateOutcome {
    pub fn is_forwarded(&self) -> bool {
        matches!(self, GateOutcome::Forwarded(_))
    }
}

/// 指令是否允许在该模式下下发
pub fn permitted(intent: &CommandIntent, mode: DrivingMode) -> bool {
    match intent {
        CommandIntent::Steer { .. } | CommandIntent::SteerWithRate { .. } => {
            mode.steering_automated()
        },
        CommandIntent::Throttle { .. }
        | CommandIntent::Brake { .. }
        | CommandIntent::Gear(_)
        | CommandIntent::ParkingBrake(_) => mode.speed_automated(),
        CommandIntent::TurnSignal(_) | CommandIntent::Horn(_) | CommandIntent::Beam(_) => {
            mode.is_automated()
        },
    }
}

/// 指令闸门
pub struct CommandGate {
    machine: Arc<DrivingModeStateMachine>,
    messages: Arc<MessageManager>,
    transmitter: Arc<dyn FrameTransmitter>,
    limits: CommandLimits,
    params: VehicleParams,
}

impl CommandGate {
    pub fn new(
        machine: Arc<DrivingModeStateMachine>,
        messages: Arc<MessageManager>,
        transmitter: Arc<dyn FrameTransmitter>,
        limits: CommandLimits,
        params: VehicleParams,
    ) -> Self {
        Self {
            machine,
            messages,
            transmitter,
            limits,
            params,
        }
    }

    /// 检查并下发一条意图
    ///
    /// # 错误
    /// - `DriverError::Can`: 控制帧未注册或发送器返回错误
    pub fn issue(&self, intent: CommandIntent) -> Result<GateOutcome, DriverError> {
        let mode = self.machine.mode();
        if !permitted(&intent, mode) {
            warn!(
                "Dropped {} command: not permitted in {:?} mode",
                intent.name(),
                mode
            );
            return Ok(GateOutcome::Dropped { mode });
        }
        if !intent.is_finite() {
            warn!("Rejected {} command with non-finite value: {:?}", intent.name(), intent);
            return Ok(GateOutcome::Rejected);
        }

        let command = self.write(intent)?;
        self.transmitter.transmit(command)?;
        trace!("Forwarded {:?}", command);
        Ok(GateOutcome::Forwarded(command))
    }

    // 限幅后写入注册表，返回写入后的完整帧
    fn write(&self, intent: CommandIntent) -> Result<OutgoingCommand, DriverError> {
        let command = match intent {
            CommandIntent::Steer { angle } => {
                let rate = self.params.default_steer_angle_rate;
                self.write_steering(angle, rate)?
            },
            CommandIntent::SteerWithRate { angle, rate } => {
                let rate = self.params.steering_rate(rate);
                self.write_steering(angle, rate)?
            },
            CommandIntent::Throttle { pedal } => {
                let pedal = self.limits.clamp_throttle(pedal);
                self.messages.with_command::<AccelCmd, _>(|cmd| {
                    cmd.accel_cmd = pedal / 100.0;
                    cmd.into_command()
                })?
            },
            CommandIntent::Brake { pedal } => {
                let pedal = self.limits.clamp_brake(pedal);
                self.messages.with_command::<BrakeCmd, _>(|cmd| {
                    cmd.brake_cmd = pedal / 100.0;
                    cmd.into_command()
                })?
            },
            CommandIntent::Gear(gear) => {
                let position = shift_position(gear);
                self.messages.with_command::<ShiftCmd, _>(|cmd| {
                    cmd.shift_cmd = position;
                    cmd.into_command()
                })?
            },
            CommandIntent::TurnSignal(signal) => {
                self.messages.with_command::<TurnCmd, _>(|cmd| {
                    cmd.turn_signal_cmd = signal;
                    cmd.into_command()
                })?
            },
            CommandIntent::Horn(on) => self.messages.with_command::<HornCmd, _>(|cmd| {
                cmd.horn_cmd = on;
                cmd.into_command()
            })?,
            CommandIntent::Beam(mode) => {
                self.messages.with_command::<HeadlightCmd, _>(|cmd| {
                    cmd.headlight_cmd = mode;
                    cmd.into_command()
                })?
            },
            CommandIntent::ParkingBrake(on) => {
                self.messages.with_command::<ParkingBrakeCmd, _>(|cmd| {
                    cmd.parking_brake_cmd = on;
                    cmd.into_command()
                })?
            },
        };
        Ok(command)
    }

    fn write_steering(&self, percent: f64, rate: f64) -> Result<OutgoingCommand, DriverError> {
        let position = self.params.steering_angle(self.limits.clamp_steering(percent));
        let command = self.messages.with_command::<SteeringCmd, _>(|cmd| {
            cmd.position = position;
            cmd.rotation_rate = rate;
            cmd.into_command()
        })?;
        Ok(command)
    }
}

/// 挡位 → 换挡指令编码
fn shift_position(gear: GearPosition) -> ShiftPosition {
    match gear {
        GearPosition::Neutral => ShiftPosition::Neutral,
        GearPosition::Reverse => ShiftPosition::Reverse,
        GearPosition::Drive => ShiftPosition::ForwardHigh,
        GearPosition::Parking => ShiftPosition::Park,
        GearPosition::Low => ShiftPosition::Low,
        GearPosition::None => ShiftPosition::None,
        GearPosition::Invalid => {
            error!("Gear command is invalid, commanding None");
            ShiftPosition::None
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_table() {
        let steer = CommandIntent::Steer { angle: 0.0 };
        let brake = CommandIntent::Brake { pedal: 0.0 };
        let gear = CommandIntent::Gear(GearPosition::Drive);
        let horn = CommandIntent::Horn(true);
        let epb = CommandIntent::ParkingBrake(true);

        assert!(permitted(&steer, DrivingMode::CompleteAutoDrive));
        assert!(permitted(&steer, DrivingMode::AutoSteerOnly));
        assert!(!permitted(&steer, DrivingMode::AutoSpeedOnly));
        assert!(!permitted(&steer, DrivingMode::Manual));
        assert!(!permitted(&steer, DrivingMode::Emergency));

        for intent in [brake, gear, epb] {
            assert!(permitted(&intent, DrivingMode::CompleteAutoDrive));
            assert!(permitted(&intent, DrivingMode::AutoSpeedOnly));
            assert!(!permitted(&intent, DrivingMode::AutoSteerOnly));
            assert!(!permitted(&intent, DrivingMode::Manual));
        }

        assert!(permitted(&horn, DrivingMode::AutoSteerOnly));
        assert!(permitted(&horn, DrivingMode::AutoSpeedOnly));
        assert!(!permitted(&horn, DrivingMode::Manual));
        assert!(!permitted(&horn, DrivingMode::Emergency));
    }

    #[test]
    fn test_shift_position_mapping() {
        assert_eq!(shift_position(GearPosition::Drive), ShiftPosition::ForwardHigh);
        assert_eq!(shift_position(GearPosition::Parking), ShiftPosition::Park);
        assert_eq!(shift_position(GearPosition::Invalid), ShiftPosition::None);
        assert_eq!(shift_position(GearPosition::None), ShiftPosition::None);
    }
}
