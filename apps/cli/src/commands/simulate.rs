//! 仿真命令
//!
//! 在仿真底盘上运行完整的监督控制器：进入自动模式，按简单的速度/转向
//! 曲线下发控制量，每个周期以 JSON 行输出底盘状态，Ctrl+C 或到时退出。

use crate::commands::config::{default_config_path, load_config};
use crate::sim::{SimProbe, SimTransmitter};
use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use crossbeam_channel::{bounded, select, tick};
use dbw_can::MessageManager;
use dbw_driver::{
    ChassisStatus, ControlCommand, ControllerBuilder, DrivingMode, GearPosition, Signal,
};
use dbw_protocol::TurnSignalCmd;
use dbw_tools::VehicleConfig;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// 转向灯触发阈值（%）
const TURN_SIGNAL_THRESHOLD: f64 = 10.0;

/// 请求进入的驾驶模式
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    Manual,
    CompleteAutoDrive,
    AutoSteerOnly,
    AutoSpeedOnly,
}

impl From<ModeArg> for DrivingMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Manual => DrivingMode::Manual,
            ModeArg::CompleteAutoDrive => DrivingMode::CompleteAutoDrive,
            ModeArg::AutoSteerOnly => DrivingMode::AutoSteerOnly,
            ModeArg::AutoSpeedOnly => DrivingMode::AutoSpeedOnly,
        }
    }
}

/// 仿真命令参数
#[derive(Args, Debug)]
pub struct SimulateCommand {
    /// 配置文件路径（缺省时使用默认路径，文件不存在则使用内置默认配置）
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 驾驶模式（覆盖配置中的 driving_mode）
    #[arg(short, long, value_enum)]
    pub mode: Option<ModeArg>,

    /// 运行时长（秒），0 表示直到 Ctrl+C
    #[arg(short, long, default_value_t = 5)]
    pub duration: u64,

    /// 控制频率（Hz）
    #[arg(short, long, default_value_t = 10)]
    pub rate: u32,

    /// 目标车速（m/s）
    #[arg(long, default_value_t = 5.0)]
    pub target_speed: f64,

    /// 指定秒数后转向执行器失去响应（演示看门狗急停）
    #[arg(long)]
    pub fail_steering_after: Option<f64>,
}

impl SimulateCommand {
    pub fn execute(&self) -> Result<()> {
        let config = self.load_config()?;
        let period = Duration::from_secs_f64(1.0 / f64::from(self.rate.max(1)));
        let fail_after = self
            .fail_steering_after
            .map(Duration::try_from_secs_f64)
            .transpose()
            .context("--fail-steering-after 必须是非负秒数")?;

        let messages = Arc::new(MessageManager::with_all_commands());
        let tx = Arc::new(SimTransmitter::new(messages.clone()));
        let probe = Arc::new(SimProbe::new(
            messages.clone(),
            Duration::from_millis(config.watchdog.response_wait_ms),
            fail_after,
        ));
        let mut controller = ControllerBuilder::new()
            .messages(messages)
            .transmitter(tx.clone())
            .probe(probe)
            .config(config)
            .build()?;

        tx.start();
        controller.start()?;

        let mode = self
            .mode
            .map(DrivingMode::from)
            .or(controller.configured_mode())
            .unwrap_or_default();
        if let Err(e) = controller.request_mode(mode) {
            warn!("Failed to enter {:?}: {}", mode, e);
        }

        let (stop_tx, stop_rx) = bounded::<()>(1);
        ctrlc::set_handler(move || {
            let _ = stop_tx.try_send(());
        })
        .context("设置 Ctrl+C 处理失败")?;

        info!("Simulation running at {} Hz, press Ctrl+C to stop", self.rate);
        let ticker = tick(period);
        let start = Instant::now();
        loop {
            select! {
                recv(stop_rx) -> _ => {
                    info!("Interrupted");
                    break;
                },
                recv(ticker) -> _ => {},
            }

            let elapsed = start.elapsed();
            if self.duration > 0 && elapsed >= Duration::from_secs(self.duration) {
                break;
            }

            let status = controller.chassis();
            let command = drive_profile(&status, elapsed, self.target_speed);
            controller.update(&command)?;
            tx.step(period);

            let line = serde_json::json!({
                "t": elapsed.as_secs_f64(),
                "status": controller.chassis(),
                "watchdog": controller.watchdog_counters(),
            });
            println!("{}", serde_json::to_string(&line)?);
        }

        if controller.mode().is_automated() {
            controller.request_mode(DrivingMode::Manual)?;
        }
        controller.stop();
        tx.stop();
        info!("Simulation finished in {:?} mode", controller.mode());
        Ok(())
    }

    fn load_config(&self) -> Result<VehicleConfig> {
        if let Some(path) = &self.config {
            return load_config(path);
        }
        let path = default_config_path()?;
        if path.exists() {
            load_config(&path)
        } else {
            info!("No config at {}, using defaults", path.display());
            Ok(VehicleConfig::default())
        }
    }
}

/// 简单驾驶曲线：加速到目标车速后保持，转向按正弦摆动
pub fn drive_profile(
    status: &ChassisStatus,
    elapsed: Duration,
    target_speed: f64,
) -> ControlCommand {
    let error = target_speed - status.speed_mps;
    let (throttle, brake) = if error > 0.0 {
        ((error * 10.0).min(40.0), 0.0)
    } else {
        (0.0, (-error * 20.0).min(60.0))
    };

    let steering_target = 20.0 * (elapsed.as_secs_f64() * 0.5).sin();
    let turn_signal = if steering_target > TURN_SIGNAL_THRESHOLD {
        TurnSignalCmd::Left
    } else if steering_target < -TURN_SIGNAL_THRESHOLD {
        TurnSignalCmd::Right
    } else {
        TurnSignalCmd::None
    };

    ControlCommand {
        throttle,
        brake,
        steering_target,
        steering_rate: None,
        gear_location: Some(GearPosition::Drive),
        parking_brake: false,
        signal: Signal {
            turn_signal,
            low_beam: true,
            ..Default::default()
        },
    }
}
