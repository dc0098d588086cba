//! 故障状态
//!
//! 故障码与故障掩码相互独立，各自由一把锁保护；
//! 任何锁都不会跨越健康检查调用持有。

use parking_lot::Mutex;

/// 底盘故障码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorCode {
    #[default]
    NoError,
    /// 执行器连续无响应，需要人工接管
    ManualIntervention,
    /// 底盘自检失败或进入自动模式时健康检查失败
    ChassisError,
}

/// 故障状态存储
#[derive(Debug, Default)]
pub struct FaultTracker {
    code: Mutex<ErrorCode>,
    mask: Mutex<u32>,
}

impl FaultTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error_code(&self) -> ErrorCode {
        *self.code.lock()
    }

    pub fn set_error_code(&self, code: ErrorCode) {
        *self.code.lock() = code;
    }

    pub fn error_mask(&self) -> u32 {
        *self.mask.lock()
    }

    pub fn set_error_mask(&self, mask: u32) {
        *self.mask.lock() = mask;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_code_and_mask_are_independent() {
        let tracker = FaultTracker::new();
        assert_eq!(tracker.error_code(), ErrorCode::NoError);
        assert_eq!(tracker.error_mask(), 0);

        tracker.set_error_mask(0b101);
        assert_eq!(tracker.error_code(), ErrorCode::NoError);

        tracker.set_error_code(ErrorCode::ChassisError);
        assert_eq!(tracker.error_mask(), 0b101);
        assert_eq!(tracker.error_code(), ErrorCode::ChassisError);
    }

    #[test]
    fn test_concurrent_writers() {
        let tracker = Arc::new(FaultTracker::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let tracker = tracker.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        tracker.set_error_mask(1 << i);
                        tracker.set_error_code(ErrorCode::ManualIntervention);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(tracker.error_code(), ErrorCode::ManualIntervention);
        assert!(tracker.error_mask().is_power_of_two());
    }
}
