//! Mock 发送器
//!
//! 不连接任何硬件：记录每一条下发的控制帧与刷新次数，
//! 并允许测试切换"运行中"状态或注入发送失败。

use crate::{CanError, FrameTransmitter};
use dbw_protocol::{FrameId, OutgoingCommand};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// 记录型发送器
#[derive(Debug, Default)]
pub struct MockTransmitter {
    running: AtomicBool,
    fail_transmit: AtomicBool,
    update_count: AtomicU64,
    transmitted: Mutex<Vec<OutgoingCommand>>,
}

impl MockTransmitter {
    /// 创建一个已处于运行状态的发送器
    pub fn running() -> Self {
        let transmitter = Self::default();
        transmitter.set_running(true);
        transmitter
    }

    /// 创建一个未启动的发送器
    pub fn stopped() -> Self {
        Self::default()
    }

    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    /// 之后的 `transmit` 调用返回设备错误
    pub fn set_fail_transmit(&self, fail: bool) {
        self.fail_transmit.store(fail, Ordering::SeqCst);
    }

    /// 已下发的全部控制帧（按调用顺序）
    pub fn transmitted(&self) -> Vec<OutgoingCommand> {
        self.transmitted.lock().clone()
    }

    /// 某一帧 ID 最近一次下发的内容
    pub fn last_transmitted(&self, id: FrameId) -> Option<OutgoingCommand> {
        self.transmitted
            .lock()
            .iter()
            .rev()
            .find(|command| command.id() == id)
            .copied()
    }

    pub fn transmit_count(&self) -> usize {
        self.transmitted.lock().len()
    }

    pub fn update_count(&self) -> u64 {
        self.update_count.load(Ordering::SeqCst)
    }

    pub fn clear(&self) {
        self.transmitted.lock().clear();
        self.update_count.store(0, Ordering::SeqCst);
    }
}

impl FrameTransmitter for MockTransmitter {
    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn update(&self) {
        self.update_count.fetch_add(1, Ordering::SeqCst);
    }

    fn transmit(&self, command: OutgoingCommand) -> Result<(), CanError> {
        if self.fail_transmit.load(Ordering::SeqCst) {
            return Err(CanError::Transmit("mock transmit failure".to_string()));
        }
        self.transmitted.lock().push(command);
        Ok(())
    }
}
