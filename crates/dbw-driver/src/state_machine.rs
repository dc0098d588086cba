//! 驾驶模式状态机
//!
//! 唯一允许修改驾驶模式的地方，看门狗触发急停也走这里的 [`emergency`]。
//!
//! ```text
//!            enable_*（健康检查通过）
//!   Manual ───────────────────────────► CompleteAutoDrive / AutoSteerOnly / AutoSpeedOnly
//!     ▲                                        │
//!     │ disable_auto_mode                      │ 健康检查失败 / 看门狗 / emergency()
//!     │                                        ▼
//!     └────────────────────────────────── Emergency
//! ```
//!
//! [`emergency`]: DrivingModeStateMachine::emergency

use crate::error::DriverError;
use crate::fault::{ErrorCode, FaultTracker};
use crate::health::{CheckFlags, HealthProbe};
use crate::mode::{AtomicDrivingMode, DrivingMode};
use dbw_can::{FrameTransmitter, MessageManager};
use dbw_protocol::{AccelCmd, BrakeCmd, ShiftCmd, SteeringCmd};
use std::sync::Arc;
use tracing::{error, info, warn};

/// 驾驶模式状态机
pub struct DrivingModeStateMachine {
    mode: AtomicDrivingMode,
    faults: Arc<FaultTracker>,
    messages: Arc<MessageManager>,
    transmitter: Arc<dyn FrameTransmitter>,
    probe: Arc<dyn HealthProbe>,
}

impl std::fmt::Debug for DrivingModeStateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrivingModeStateMachine")
            .field("mode", &self.mode.get())
            .finish_non_exhaustive()
    }
}

impl DrivingModeStateMachine {
    /// 创建状态机（初始为手动模式）
    pub fn new(
        faults: Arc<FaultTracker>,
        messages: Arc<MessageManager>,
        transmitter: Arc<dyn FrameTransmitter>,
        probe: Arc<dyn HealthProbe>,
    ) -> Self {
        Self {
            mode: AtomicDrivingMode::new(DrivingMode::Manual),
            faults,
            messages,
            transmitter,
            probe,
        }
    }

    /// 当前驾驶模式
    pub fn mode(&self) -> DrivingMode {
        self.mode.get()
    }

    /// 按目标模式分派到对应的切换操作
    pub fn request(&self, target: DrivingMode) -> Result<(), DriverError> {
        match target {
            DrivingMode::Manual => {
                self.disable_auto_mode();
                Ok(())
            },
            DrivingMode::CompleteAutoDrive => self.enable_auto_mode(),
            DrivingMode::AutoSteerOnly => self.enable_steering_only_mode(),
            DrivingMode::AutoSpeedOnly => self.enable_speed_only_mode(),
            DrivingMode::Emergency => {
                self.emergency();
                Ok(())
            },
        }
    }

    /// 进入完全自动驾驶
    ///
    /// 使能全部执行器，立即刷新一次发送器，然后同步等待转向与纵向
    /// 执行器的响应。任一无响应：进入急停，故障码置为 `ChassisError`。
    /// 处于急停时直接拒绝，不改动任何控制帧；急停只能经 `disable_auto_mode` 解除。
    pub fn enable_auto_mode(&self) -> Result<(), DriverError> {
        if self.mode() == DrivingMode::CompleteAutoDrive {
            info!("Already in CompleteAutoDrive mode");
            return Ok(());
        }
        self.ensure_not_latched(DrivingMode::CompleteAutoDrive)?;

        self.arm(true, true)?;
        self.transmitter.update();
        self.enter_if_responsive(DrivingMode::CompleteAutoDrive, CheckFlags::ALL)
    }

    /// 进入仅横向自动
    ///
    /// 已处于完全自动驾驶时视为满足请求，不收窄控制范围。
    pub fn enable_steering_only_mode(&self) -> Result<(), DriverError> {
        let mode = self.mode();
        if matches!(
            mode,
            DrivingMode::CompleteAutoDrive | DrivingMode::AutoSteerOnly
        ) {
            info!("Already in {:?} mode, steering is automated", mode);
            return Ok(());
        }
        self.ensure_not_latched(DrivingMode::AutoSteerOnly)?;

        self.arm(true, false)?;
        self.transmitter.update();
        self.enter_if_responsive(DrivingMode::AutoSteerOnly, CheckFlags::STEER)
    }

    /// 进入仅纵向自动
    ///
    /// 已处于完全自动驾驶时视为满足请求，不收窄控制范围。
    pub fn enable_speed_only_mode(&self) -> Result<(), DriverError> {
        let mode = self.mode();
        if matches!(
            mode,
            DrivingMode::CompleteAutoDrive | DrivingMode::AutoSpeedOnly
        ) {
            info!("Already in {:?} mode, speed is automated", mode);
            return Ok(());
        }
        self.ensure_not_latched(DrivingMode::AutoSpeedOnly)?;

        self.arm(false, true)?;
        self.transmitter.update();
        self.enter_if_responsive(DrivingMode::AutoSpeedOnly, CheckFlags::SPEED)
    }

    /// 退出自动驾驶（总是成功）
    ///
    /// 所有控制帧复位到安全基线，回到手动模式并清除故障码。
    pub fn disable_auto_mode(&self) {
        self.messages.reset_send_messages();
        self.transmitter.update();
        self.mode.set(DrivingMode::Manual);
        self.faults.set_error_code(ErrorCode::NoError);
        info!("Switch to Manual mode ok");
    }

    /// 急停（幂等）
    ///
    /// 从任意模式进入急停，并把所有控制帧复位到安全基线。
    pub fn emergency(&self) {
        let previous = self.mode.set(DrivingMode::Emergency);
        self.messages.reset_send_messages();
        if previous != DrivingMode::Emergency {
            warn!("Entered Emergency mode (was {:?})", previous);
        }
    }

    fn ensure_not_latched(&self, target: DrivingMode) -> Result<(), DriverError> {
        if self.mode() == DrivingMode::Emergency {
            warn!("Refusing to switch to {:?} mode: Emergency is latched", target);
            return Err(DriverError::EmergencyLatched { requested: target });
        }
        Ok(())
    }

    fn enter_if_responsive(
        &self,
        target: DrivingMode,
        flags: CheckFlags,
    ) -> Result<(), DriverError> {
        if !self.probe.check_response(flags, true) {
            error!("Failed to switch to {:?} mode: no response on {:?}", target, flags);
            self.emergency();
            self.faults.set_error_code(ErrorCode::ChassisError);
            return Err(DriverError::HealthCheckFailed { mode: target });
        }

        self.mode.set(target);
        info!("Switch to {:?} mode ok", target);
        Ok(())
    }

    // 纵向包含油门、制动与挡位
    fn arm(&self, steering: bool, speed: bool) -> Result<(), DriverError> {
        self.messages
            .with_command::<AccelCmd, _>(|cmd| {
                cmd.set_enable(speed);
            })?;
        self.messages
            .with_command::<BrakeCmd, _>(|cmd| {
                cmd.set_enable(speed);
            })?;
        self.messages
            .with_command::<ShiftCmd, _>(|cmd| {
                cmd.set_enable(speed);
            })?;
        self.messages
            .with_command::<SteeringCmd, _>(|cmd| {
                cmd.set_enable(steering);
            })?;
        Ok(())
    }
}
