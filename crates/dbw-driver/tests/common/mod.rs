//! 集成测试辅助
//!
//! 可控的健康检查 + 快速创建测试用控制器。

#![allow(dead_code)]

use dbw_can::MessageManager;
use dbw_can::mock::MockTransmitter;
use dbw_driver::{CheckFlags, ControllerBuilder, HealthProbe, VehicleController};
use dbw_tools::VehicleConfig;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// 可在运行时切换结果的健康检查
///
/// `need_wait = true` 的检查（进入自动模式）与看门狗的周期检查分开控制。
#[derive(Debug)]
pub struct TestProbe {
    pub entry_ok: AtomicBool,
    pub steer_ok: AtomicBool,
    pub speed_ok: AtomicBool,
    pub chassis_error: AtomicBool,
    pub polls: AtomicUsize,
}

impl Default for TestProbe {
    fn default() -> Self {
        Self {
            entry_ok: AtomicBool::new(true),
            steer_ok: AtomicBool::new(true),
            speed_ok: AtomicBool::new(true),
            chassis_error: AtomicBool::new(false),
            polls: AtomicUsize::new(0),
        }
    }
}

impl TestProbe {
    pub fn healthy() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl HealthProbe for TestProbe {
    fn check_response(&self, flags: CheckFlags, need_wait: bool) -> bool {
        if need_wait {
            return self.entry_ok.load(Ordering::SeqCst);
        }
        self.polls.fetch_add(1, Ordering::SeqCst);
        let steer = !flags.contains(CheckFlags::STEER) || self.steer_ok.load(Ordering::SeqCst);
        let speed = !flags.contains(CheckFlags::SPEED) || self.speed_ok.load(Ordering::SeqCst);
        steer && speed
    }

    fn check_chassis_error(&self) -> bool {
        self.chassis_error.load(Ordering::SeqCst)
    }
}

pub struct TestRig {
    pub controller: VehicleController,
    pub tx: Arc<MockTransmitter>,
    pub probe: Arc<TestProbe>,
    pub messages: Arc<MessageManager>,
}

/// 已初始化的控制器（看门狗周期 5ms，加快测试）
pub fn rig() -> TestRig {
    rig_with(VehicleConfig::default(), 5)
}

pub fn rig_with(mut config: VehicleConfig, period_ms: u64) -> TestRig {
    config.watchdog.period_ms = period_ms;
    let tx = Arc::new(MockTransmitter::running());
    let probe = TestProbe::healthy();
    let messages = Arc::new(MessageManager::with_all_commands());
    let controller = ControllerBuilder::new()
        .messages(messages.clone())
        .transmitter(tx.clone())
        .probe(probe.clone())
        .config(config)
        .build()
        .unwrap();
    TestRig {
        controller,
        tx,
        probe,
        messages,
    }
}

/// 轮询直到条件成立或超时
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    condition()
}
