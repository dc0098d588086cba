//! 执行器健康检查
//!
//! 健康检查由具体车型实现（通常是等待执行器反馈帧中的使能位）。
//! 控制器只关心"是否在限定时间内有响应"。

use std::fmt;
use std::ops::BitOr;

/// 健康检查位
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CheckFlags(u8);

impl CheckFlags {
    pub const NONE: Self = Self(0);
    /// 横向（转向）执行器
    pub const STEER: Self = Self(1);
    /// 纵向（油门/制动）执行器
    pub const SPEED: Self = Self(2);
    pub const ALL: Self = Self(Self::STEER.0 | Self::SPEED.0);

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for CheckFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Debug for CheckFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.contains(Self::STEER), self.contains(Self::SPEED)) {
            (true, true) => write!(f, "STEER | SPEED"),
            (true, false) => write!(f, "STEER"),
            (false, true) => write!(f, "SPEED"),
            (false, false) => write!(f, "NONE"),
        }
    }
}

/// 执行器健康检查
///
/// # 阻塞行为
///
/// - `need_wait = true`：进入自动模式时调用，允许阻塞，
///   但实现必须有自己的超时上限（配置中的 `response_wait_ms`）
/// - `need_wait = false`：看门狗每个周期调用，只能读缓存状态，不可阻塞
pub trait HealthProbe: Send + Sync {
    /// `flags` 中的每个执行器是否都有响应
    fn check_response(&self, flags: CheckFlags, need_wait: bool) -> bool;

    /// 底盘自检是否报告错误
    fn check_chassis_error(&self) -> bool {
        false
    }
}

/// 未提供健康检查实现时使用的占位
///
/// 所有检查都失败：没有健康检查就不能进入自动模式。
#[derive(Debug, Default, Clone, Copy)]
pub struct UnimplementedProbe;

impl HealthProbe for UnimplementedProbe {
    fn check_response(&self, _flags: CheckFlags, _need_wait: bool) -> bool {
        false
    }
}
