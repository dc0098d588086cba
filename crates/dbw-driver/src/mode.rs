//! 驾驶模式定义
//!
//! 当前模式由调用线程（模式切换、下发指令）与看门狗线程共同读写，
//! 因此以原子值保存，读写都不持锁。

use dbw_tools::DrivingModeSetting;
use std::sync::atomic::{AtomicU8, Ordering};

/// 驾驶模式
///
/// # 模式说明
///
/// - **Manual**: 手动驾驶（初始模式），拒绝一切执行器指令
/// - **CompleteAutoDrive**: 横向 + 纵向均由自动驾驶控制
/// - **AutoSteerOnly**: 仅横向（转向）自动
/// - **AutoSpeedOnly**: 仅纵向（油门/制动/挡位）自动
/// - **Emergency**: 急停，直到 `disable_auto_mode` 回到手动模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum DrivingMode {
    #[default]
    Manual = 0,
    CompleteAutoDrive = 1,
    AutoSteerOnly = 2,
    AutoSpeedOnly = 3,
    Emergency = 4,
}

impl DrivingMode {
    /// 从 u8 转换
    ///
    /// 无效值视为 Emergency（安全侧）。
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Manual,
            1 => Self::CompleteAutoDrive,
            2 => Self::AutoSteerOnly,
            3 => Self::AutoSpeedOnly,
            _ => Self::Emergency,
        }
    }

    /// 转换为 u8
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// 是否处于任一自动模式
    pub fn is_automated(self) -> bool {
        matches!(
            self,
            Self::CompleteAutoDrive | Self::AutoSteerOnly | Self::AutoSpeedOnly
        )
    }

    /// 横向（转向）是否由自动驾驶控制
    pub fn steering_automated(self) -> bool {
        matches!(self, Self::CompleteAutoDrive | Self::AutoSteerOnly)
    }

    /// 纵向（油门/制动/挡位）是否由自动驾驶控制
    pub fn speed_automated(self) -> bool {
        matches!(self, Self::CompleteAutoDrive | Self::AutoSpeedOnly)
    }
}

impl From<DrivingModeSetting> for DrivingMode {
    fn from(setting: DrivingModeSetting) -> Self {
        match setting {
            DrivingModeSetting::Manual => Self::Manual,
            DrivingModeSetting::CompleteAutoDrive => Self::CompleteAutoDrive,
            DrivingModeSetting::AutoSteerOnly => Self::AutoSteerOnly,
            DrivingModeSetting::AutoSpeedOnly => Self::AutoSpeedOnly,
        }
    }
}

/// 驾驶模式（原子版本，用于线程间共享）
///
/// # 示例
///
/// ```
/// use dbw_driver::mode::{AtomicDrivingMode, DrivingMode};
///
/// let mode = AtomicDrivingMode::new(DrivingMode::Manual);
/// mode.set(DrivingMode::Emergency);
/// assert_eq!(mode.get(), DrivingMode::Emergency);
/// ```
#[derive(Debug, Default)]
pub struct AtomicDrivingMode {
    inner: AtomicU8,
}

impl AtomicDrivingMode {
    pub fn new(mode: DrivingMode) -> Self {
        Self {
            inner: AtomicU8::new(mode.as_u8()),
        }
    }

    /// 获取当前模式
    pub fn get(&self) -> DrivingMode {
        DrivingMode::from_u8(self.inner.load(Ordering::Acquire))
    }

    /// 设置模式，返回旧模式
    ///
    /// 调用线程与看门狗可能并发写入，后写者生效。
    pub fn set(&self, mode: DrivingMode) -> DrivingMode {
        DrivingMode::from_u8(self.inner.swap(mode.as_u8(), Ordering::AcqRel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driving_mode_conversions() {
        for mode in [
            DrivingMode::Manual,
            DrivingMode::CompleteAutoDrive,
            DrivingMode::AutoSteerOnly,
            DrivingMode::AutoSpeedOnly,
            DrivingMode::Emergency,
        ] {
            assert_eq!(DrivingMode::from_u8(mode.as_u8()), mode);
        }
        assert_eq!(DrivingMode::from_u8(200), DrivingMode::Emergency); // 无效值
    }

    #[test]
    fn test_path_predicates() {
        assert!(DrivingMode::CompleteAutoDrive.steering_automated());
        assert!(DrivingMode::CompleteAutoDrive.speed_automated());
        assert!(DrivingMode::AutoSteerOnly.steering_automated());
        assert!(!DrivingMode::AutoSteerOnly.speed_automated());
        assert!(!DrivingMode::AutoSpeedOnly.steering_automated());
        assert!(DrivingMode::AutoSpeedOnly.speed_automated());
        assert!(!DrivingMode::Manual.is_automated());
        assert!(!DrivingMode::Emergency.is_automated());
    }

    #[test]
    fn test_atomic_driving_mode() {
        let mode = AtomicDrivingMode::default();
        assert_eq!(mode.get(), DrivingMode::Manual);

        let previous = mode.set(DrivingMode::AutoSpeedOnly);
        assert_eq!(previous, DrivingMode::Manual);
        assert_eq!(mode.get(), DrivingMode::AutoSpeedOnly);
    }

    #[test]
    fn test_from_setting() {
        assert_eq!(
            DrivingMode::from(DrivingModeSetting::AutoSteerOnly),
            DrivingMode::AutoSteerOnly
        );
    }
}
