//! 仿真底盘
//!
//! 没有真实总线时，用一个回显型发送器把控制帧写回反馈快照，
//! 再配一个读取反馈使能位的健康检查，整套控制器即可脱离硬件运行。

use dbw_can::{
    CanError, CommandMessage, FrameTransmitter, MessageManager, OutgoingCommand, Report,
};
use dbw_driver::{CheckFlags, HealthProbe};
use dbw_protocol::{
    AccelRpt, BrakeRpt, ParkingBrakeRpt, ShiftRpt, SteeringRpt, VehicleSpeedRpt,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// 满油门加速度（m/s²）
const MAX_ACCEL: f64 = 3.0;
/// 满制动减速度（m/s²）
const MAX_DECEL: f64 = 6.0;
/// 带使能检查的轮询间隔
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// 回显型发送器
///
/// `transmit` 和 `update` 都把控制帧立即反映到反馈快照中；
/// `step` 根据当前油门/制动积分车速。
#[derive(Debug)]
pub struct SimTransmitter {
    messages: Arc<MessageManager>,
    running: AtomicBool,
    /// 车速（m/s）
    speed: Mutex<f64>,
}

impl SimTransmitter {
    pub fn new(messages: Arc<MessageManager>) -> Self {
        Self {
            messages,
            running: AtomicBool::new(false),
            speed: Mutex::new(0.0),
        }
    }

    pub fn start(&self) {
        self.running.store(true, Ordering::Release);
        info!("Simulated transmitter started");
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    /// 推进车辆模型 `dt`
    pub fn step(&self, dt: Duration) {
        let detail = self.messages.sensor_data();
        let throttle = detail.accel_output().unwrap_or(0.0);
        let brake = detail.brake_output().unwrap_or(0.0);
        let accel = throttle * MAX_ACCEL - brake * MAX_DECEL;
        let speed = {
            let mut speed = self.speed.lock();
            *speed = (*speed + accel * dt.as_secs_f64()).max(0.0);
            *speed
        };

        self.messages.update_report(Report::VehicleSpeed(VehicleSpeedRpt {
            vehicle_speed: Some(speed),
            vehicle_speed_valid: true,
        }));
    }

    fn echo(&self, command: &OutgoingCommand) {
        let report = match *command {
            OutgoingCommand::Accel(cmd) => Report::Accel(AccelRpt {
                enabled: cmd.enable,
                override_active: false,
                output_value: Some(cmd.accel_cmd),
            }),
            OutgoingCommand::Brake(cmd) => Report::Brake(BrakeRpt {
                enabled: cmd.enable,
                override_active: false,
                output_value: Some(cmd.brake_cmd),
            }),
            OutgoingCommand::Shift(cmd) => Report::Shift(ShiftRpt {
                enabled: cmd.enable,
                output_value: Some(cmd.shift_cmd.into()),
            }),
            OutgoingCommand::Steering(cmd) => Report::Steering(SteeringRpt {
                enabled: cmd.enable,
                override_active: false,
                output_value: Some(cmd.position),
            }),
            OutgoingCommand::ParkingBrake(cmd) => Report::ParkingBrake(ParkingBrakeRpt {
                parking_brake_on: Some(cmd.parking_brake_cmd),
            }),
            OutgoingCommand::Turn(_) | OutgoingCommand::Horn(_) | OutgoingCommand::Headlight(_) => {
                return;
            },
        };
        self.messages.update_report(report);
    }
}

impl FrameTransmitter for SimTransmitter {
    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn update(&self) {
        for command in self.messages.send_messages() {
            self.echo(&command);
        }
    }

    fn transmit(&self, command: OutgoingCommand) -> Result<(), CanError> {
        if !self.is_running() {
            return Err(CanError::NotRunning);
        }
        self.echo(&command);
        Ok(())
    }
}

/// 读取反馈使能位的健康检查
///
/// `fail_steering_after` 到期后转向反馈不再被视为使能，用来演示看门狗急停。
#[derive(Debug)]
pub struct SimProbe {
    messages: Arc<MessageManager>,
    response_wait: Duration,
    started: Instant,
    fail_steering_after: Option<Duration>,
}

impl SimProbe {
    pub fn new(
        messages: Arc<MessageManager>,
        response_wait: Duration,
        fail_steering_after: Option<Duration>,
    ) -> Self {
        Self {
            messages,
            response_wait,
            started: Instant::now(),
            fail_steering_after,
        }
    }

    fn steering_failed(&self) -> bool {
        self.fail_steering_after
            .is_some_and(|after| self.started.elapsed() >= after)
    }

    fn responsive(&self, flags: CheckFlags) -> bool {
        let detail = self.messages.sensor_data();
        let steer_ok = !flags.contains(CheckFlags::STEER)
            || (!self.steering_failed() && detail.steering_rpt.is_some_and(|r| r.enabled));
        let speed_ok = !flags.contains(CheckFlags::SPEED)
            || (detail.accel_rpt.is_some_and(|r| r.enabled)
                && detail.brake_rpt.is_some_and(|r| r.enabled));
        steer_ok && speed_ok
    }
}

impl HealthProbe for SimProbe {
    fn check_response(&self, flags: CheckFlags, need_wait: bool) -> bool {
        if !need_wait {
            return self.responsive(flags);
        }

        let deadline = Instant::now() + self.response_wait;
        loop {
            if self.responsive(flags) {
                return true;
            }
            if Instant::now() >= deadline {
                debug!("No response for {:?} within {:?}", flags, self.response_wait);
                return false;
            }
            spin_sleep::sleep(POLL_INTERVAL);
        }
    }
}
