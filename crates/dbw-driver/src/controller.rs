//! 车辆控制器
//!
//! 对外的 [`VehicleController`]：把状态机、指令闸门、看门狗与故障状态
//! 组装在一起，并管理初始化 → 启动 → 停止的生命周期。

use crate::chassis::{ChassisStatus, aggregate};
use crate::command::{CommandIntent, ControlCommand};
use crate::error::DriverError;
use crate::fault::{ErrorCode, FaultTracker};
use crate::gate::{CommandGate, GateOutcome};
use crate::health::HealthProbe;
use crate::mode::DrivingMode;
use crate::state_machine::DrivingModeStateMachine;
use crate::watchdog::{SafetyWatchdog, WatchdogCounters, WatchdogHandle};
use dbw_can::{FrameId, FrameTransmitter, MessageManager};
use dbw_tools::{VehicleConfig, VehicleParams};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// 初始化时必须已注册的控制帧
pub const REQUIRED_COMMANDS: [FrameId; 4] = [
    FrameId::AccelCmd,
    FrameId::BrakeCmd,
    FrameId::ShiftCmd,
    FrameId::SteeringCmd,
];

// 初始化成功后才存在的部分
struct Runtime {
    config: VehicleConfig,
    configured_mode: DrivingMode,
    gate: CommandGate,
    watchdog: Arc<SafetyWatchdog>,
}

/// 车辆控制器
///
/// # 生命周期
///
/// ```text
/// new/build ──► init(config) ──► start() ──► stop()
/// ```
///
/// - `init` 之前：只能查询状态、急停
/// - `start` 之后：看门狗线程运行，直到 `stop` 或 drop
pub struct VehicleController {
    messages: Arc<MessageManager>,
    transmitter: Arc<dyn FrameTransmitter>,
    probe: Arc<dyn HealthProbe>,
    faults: Arc<FaultTracker>,
    machine: Arc<DrivingModeStateMachine>,
    runtime: Option<Runtime>,
    watchdog: Option<WatchdogHandle>,
}

impl VehicleController {
    /// 创建未初始化的控制器（手动模式）
    ///
    /// 通常通过 [`ControllerBuilder`](crate::ControllerBuilder) 构造。
    pub fn new(
        messages: Arc<MessageManager>,
        transmitter: Arc<dyn FrameTransmitter>,
        probe: Arc<dyn HealthProbe>,
    ) -> Self {
        let faults = Arc::new(FaultTracker::new());
        let machine = Arc::new(DrivingModeStateMachine::new(
            faults.clone(),
            messages.clone(),
            transmitter.clone(),
            probe.clone(),
        ));
        Self {
            messages,
            transmitter,
            probe,
            faults,
            machine,
            runtime: None,
            watchdog: None,
        }
    }

    /// 初始化
    ///
    /// 校验配置与帧注册表，全部通过后才保存状态；失败时控制器保持未初始化。
    ///
    /// # 错误
    /// - `DriverError::AlreadyInitialized`: 重复初始化
    /// - `DriverError::Config`: 配置数值非法
    /// - `DriverError::Configuration`: 未设置驾驶模式，或必需的控制帧未注册
    pub fn init(&mut self, config: VehicleConfig) -> Result<(), DriverError> {
        if self.runtime.is_some() {
            warn!("Controller has already been initialized");
            return Err(DriverError::AlreadyInitialized);
        }

        let Some(setting) = config.driving_mode else {
            error!("Vehicle config has no driving mode");
            return Err(DriverError::Configuration(
                "driving_mode is not set".to_string(),
            ));
        };
        config.validate()?;

        for id in REQUIRED_COMMANDS {
            if !self.messages.is_registered(id) {
                error!("Required command frame {} is not registered", id);
                return Err(DriverError::Configuration(format!(
                    "{} is not registered",
                    id
                )));
            }
        }

        let gate = CommandGate::new(
            self.machine.clone(),
            self.messages.clone(),
            self.transmitter.clone(),
            config.limits.clone(),
            config.vehicle.clone(),
        );
        let watchdog = Arc::new(SafetyWatchdog::new(
            self.machine.clone(),
            self.faults.clone(),
            self.probe.clone(),
            config.watchdog.clone(),
        ));

        let configured_mode = DrivingMode::from(setting);
        self.runtime = Some(Runtime {
            config,
            configured_mode,
            gate,
            watchdog,
        });
        info!(
            "Controller initialized (configured driving mode: {:?})",
            configured_mode
        );
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.runtime.is_some()
    }

    /// 启动看门狗线程
    pub fn start(&mut self) -> Result<(), DriverError> {
        let runtime = self.runtime.as_ref().ok_or(DriverError::NotInitialized)?;
        if self.watchdog.is_some() {
            return Err(DriverError::AlreadyStarted);
        }

        let handle = runtime.watchdog.clone().spawn(self.transmitter.clone())?;
        self.watchdog = Some(handle);
        info!("Controller started");
        Ok(())
    }

    /// 停止看门狗线程（阻塞直到线程退出）
    pub fn stop(&mut self) {
        if self.runtime.is_none() {
            error!("Controller stop() called before init()");
            return;
        }
        if let Some(handle) = self.watchdog.take() {
            handle.stop();
            info!("Controller stopped");
        }
    }

    pub fn is_started(&self) -> bool {
        self.watchdog.is_some()
    }

    /// 当前驾驶模式
    pub fn mode(&self) -> DrivingMode {
        self.machine.mode()
    }

    /// 配置中声明的驾驶模式（初始化后可用）
    pub fn configured_mode(&self) -> Option<DrivingMode> {
        self.runtime.as_ref().map(|r| r.configured_mode)
    }

    pub fn config(&self) -> Option<&VehicleConfig> {
        self.runtime.as_ref().map(|r| &r.config)
    }

    /// 当前底盘状态
    ///
    /// # 注意
    ///
    /// 处于 [`DrivingMode::Emergency`] 时，本方法会先把故障码清为
    /// [`ErrorCode::NoError`]：急停状态只通过 `driving_mode` 表达，
    /// 不会同时体现在 `error_code` 上。判断是否急停请检查
    /// `status.driving_mode == DrivingMode::Emergency`，不要依赖故障码。
    pub fn chassis(&self) -> ChassisStatus {
        let mode = self.machine.mode();
        if mode == DrivingMode::Emergency {
            self.faults.set_error_code(ErrorCode::NoError);
        }

        let params = self
            .runtime
            .as_ref()
            .map(|r| r.config.vehicle.clone())
            .unwrap_or_else(VehicleParams::default);
        let mut status = aggregate(
            &self.messages.sensor_data(),
            mode,
            self.faults.error_code(),
            self.faults.error_mask(),
            &params,
        );
        status.engine_started = self.runtime.is_some();
        status
    }

    /// 请求切换驾驶模式
    ///
    /// 进入自动模式时会同步等待健康检查（有上限）；失败时控制器已处于急停。
    /// 急停中只接受切回 [`DrivingMode::Manual`]（或再次急停），其他请求返回
    /// [`DriverError::EmergencyLatched`]。
    pub fn request_mode(&self, mode: DrivingMode) -> Result<(), DriverError> {
        self.runtime()?;
        self.machine.request(mode)
    }

    /// 下发单条执行器意图
    pub fn issue(&self, intent: CommandIntent) -> Result<GateOutcome, DriverError> {
        self.runtime()?.gate.issue(intent)
    }

    /// 应用一个周期的控制量
    ///
    /// 手动与急停模式下不做任何事。顺序：挡位、制动、油门、转向、
    /// 大灯、喇叭、转向灯、驻车制动；未被自动控制的通道跳过。
    pub fn update(&self, command: &ControlCommand) -> Result<(), DriverError> {
        let gate = &self.runtime()?.gate;
        let mode = self.machine.mode();
        if !mode.is_automated() {
            debug!("Ignoring control command in {:?} mode", mode);
            return Ok(());
        }

        if mode.speed_automated() {
            if let Some(gear) = command.gear_location {
                gate.issue(CommandIntent::Gear(gear))?;
            }
            gate.issue(CommandIntent::Brake {
                pedal: command.brake,
            })?;
            gate.issue(CommandIntent::Throttle {
                pedal: command.throttle,
            })?;
        }
        if mode.steering_automated() {
            gate.issue(command.steer_intent())?;
        }

        gate.issue(CommandIntent::Beam(command.signal.beam()))?;
        gate.issue(CommandIntent::Horn(command.signal.horn))?;
        gate.issue(CommandIntent::TurnSignal(command.signal.turn_signal))?;
        if mode.speed_automated() {
            gate.issue(CommandIntent::ParkingBrake(command.parking_brake))?;
        }
        Ok(())
    }

    /// 立即急停（任意时刻可用，包括初始化之前）
    pub fn force_emergency(&self) {
        self.machine.emergency();
    }

    pub fn set_chassis_error_mask(&self, mask: u32) {
        self.faults.set_error_mask(mask);
    }

    pub fn chassis_error_mask(&self) -> u32 {
        self.faults.error_mask()
    }

    pub fn error_code(&self) -> ErrorCode {
        self.faults.error_code()
    }

    /// 看门狗连续失败计数（未初始化时为 0）
    pub fn watchdog_counters(&self) -> WatchdogCounters {
        self.runtime
            .as_ref()
            .map(|r| r.watchdog.counters())
            .unwrap_or_default()
    }

    /// 帧注册表（RX 侧通过它写入反馈）
    pub fn messages(&self) -> &Arc<MessageManager> {
        &self.messages
    }

    fn runtime(&self) -> Result<&Runtime, DriverError> {
        self.runtime.as_ref().ok_or(DriverError::NotInitialized)
    }
}
