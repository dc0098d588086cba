//! 安全看门狗
//!
//! 独立线程，按固定周期（默认 50ms）巡检执行器：
//!
//! 1. 读取当前模式快照
//! 2. 横向自动时检查转向执行器，纵向自动时检查油门/制动执行器
//!    （非阻塞）。失败则对应计数 +1，成功或该通道未被自动控制则清零
//! 3. 任一计数达到阈值（默认 10）：故障码置为 `ManualIntervention`
//! 4. 底盘自检报错：故障码置为 `ChassisError`
//! 5. 触发且当前不是急停：经状态机进入急停（复位所有控制帧）
//! 6. 睡眠到本周期结束；超时则记录日志，不追赶
//!
//! 最坏检测延迟约为 阈值 × 周期（默认 500ms）。

use crate::error::{ActuatorUnit, DriverError, SafetyFault};
use crate::fault::{ErrorCode, FaultTracker};
use crate::health::{CheckFlags, HealthProbe};
use crate::mode::DrivingMode;
use crate::state_machine::DrivingModeStateMachine;
use dbw_can::FrameTransmitter;
use dbw_tools::WatchdogSettings;
use smallvec::SmallVec;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{error, info, trace, warn};

/// 单次巡检发现的故障
pub type TickFaults = SmallVec<[SafetyFault; 2]>;

/// 连续失败计数快照（只读）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WatchdogCounters {
    pub steering_failures: u32,
    pub speed_failures: u32,
}

/// 安全看门狗
///
/// 计数器只在 [`tick`](Self::tick) 中修改；外部通过
/// [`counters`](Self::counters) 只读访问。
pub struct SafetyWatchdog {
    machine: Arc<DrivingModeStateMachine>,
    faults: Arc<FaultTracker>,
    probe: Arc<dyn HealthProbe>,
    settings: WatchdogSettings,
    steering_failures: AtomicU32,
    speed_failures: AtomicU32,
}

impl SafetyWatchdog {
    pub fn new(
        machine: Arc<DrivingModeStateMachine>,
        faults: Arc<FaultTracker>,
        probe: Arc<dyn HealthProbe>,
        settings: WatchdogSettings,
    ) -> Self {
        Self {
            machine,
            faults,
            probe,
            settings,
            steering_failures: AtomicU32::new(0),
            speed_failures: AtomicU32::new(0),
        }
    }

    pub fn counters(&self) -> WatchdogCounters {
        WatchdogCounters {
            steering_failures: self.steering_failures.load(Ordering::Relaxed),
            speed_failures: self.speed_failures.load(Ordering::Relaxed),
        }
    }

    pub fn period(&self) -> Duration {
        Duration::from_millis(self.settings.period_ms)
    }

    /// 执行一次巡检（不睡眠）
    ///
    /// 返回本次发现的故障；故障已写入故障码，必要时已进入急停。
    pub fn tick(&self) -> TickFaults {
        let mode = self.machine.mode();
        let mut faults = TickFaults::new();

        if let Some(fault) = self.check_unit(
            ActuatorUnit::Steering,
            mode.steering_automated(),
            &self.steering_failures,
        ) {
            faults.push(fault);
        }
        if let Some(fault) = self.check_unit(
            ActuatorUnit::Speed,
            mode.speed_automated(),
            &self.speed_failures,
        ) {
            faults.push(fault);
        }
        if !faults.is_empty() {
            self.faults.set_error_code(ErrorCode::ManualIntervention);
        }

        if self.probe.check_chassis_error() {
            self.faults.set_error_code(ErrorCode::ChassisError);
            faults.push(SafetyFault::ChassisSelfCheckFailed);
        }

        if !faults.is_empty() && mode != DrivingMode::Emergency {
            for fault in &faults {
                error!("Watchdog: {}", fault);
            }
            self.machine.emergency();
        }

        faults
    }

    fn check_unit(
        &self,
        unit: ActuatorUnit,
        automated: bool,
        counter: &AtomicU32,
    ) -> Option<SafetyFault> {
        let flag = match unit {
            ActuatorUnit::Steering => CheckFlags::STEER,
            ActuatorUnit::Speed => CheckFlags::SPEED,
        };

        if automated && !self.probe.check_response(flag, false) {
            let failures = counter.load(Ordering::Relaxed).saturating_add(1);
            counter.store(failures, Ordering::Relaxed);
            trace!("Watchdog: {} check failed ({} in a row)", unit, failures);
            if failures >= self.settings.max_fail_attempts {
                return Some(SafetyFault::ActuatorUnresponsive {
                    unit,
                    consecutive_failures: failures,
                });
            }
        } else {
            counter.store(0, Ordering::Relaxed);
        }
        None
    }

    /// 启动看门狗线程
    ///
    /// 线程先等待发送器进入运行状态（期间仍响应停止信号），
    /// 然后按周期巡检，直到 [`WatchdogHandle::stop`] 被调用。
    pub fn spawn(
        self: Arc<Self>,
        transmitter: Arc<dyn FrameTransmitter>,
    ) -> Result<WatchdogHandle, DriverError> {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_thread = stop.clone();

        let thread = std::thread::Builder::new()
            .name("dbw-watchdog".to_string())
            .spawn(move || self.run(transmitter.as_ref(), &stop_thread))
            .map_err(|e| DriverError::WatchdogThread(e.to_string()))?;

        Ok(WatchdogHandle {
            stop,
            thread: Some(thread),
        })
    }

    fn run(&self, transmitter: &dyn FrameTransmitter, stop: &AtomicBool) {
        while !transmitter.is_running() {
            if stop.load(Ordering::Acquire) {
                trace!("Watchdog: stopped before transmitter started");
                return;
            }
            spin_sleep::sleep(Duration::from_millis(1));
        }
        info!("Watchdog started, period {:?}", self.period());

        let period = self.period();
        loop {
            // Acquire: 看到 false 时，stop() 之前的写入均可见
            if stop.load(Ordering::Acquire) {
                break;
            }

            let start = Instant::now();
            self.tick();

            let elapsed = start.elapsed();
            if elapsed < period {
                spin_sleep::sleep(period - elapsed);
            } else {
                warn!(
                    "Watchdog loop overrun: iteration took {:?} (period {:?})",
                    elapsed, period
                );
            }
        }

        trace!("Watchdog: loop exited");
    }
}

/// 看门狗线程句柄
///
/// drop 时自动停止并等待线程退出。
#[derive(Debug)]
pub struct WatchdogHandle {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl WatchdogHandle {
    /// 通知线程退出并阻塞等待
    ///
    /// 线程在当前周期结束后退出，最长阻塞约一个周期
    /// （加上正在进行的健康检查耗时）。
    pub fn stop(mut self) {
        self.shutdown();
    }

    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(|t| t.is_finished())
    }

    fn shutdown(&mut self) {
        // Release: 与线程中的 Acquire 配对
        self.stop.store(true, Ordering::Release);
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            error!("Watchdog thread panicked");
        }
    }
}

impl Drop for WatchdogHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
