//! 反馈帧结构体定义
//!
//! 执行器与传感器上报的数据，以及聚合后的底盘快照 [`ChassisDetail`]。
//! 每个字段都可能缺失（尚未收到对应反馈帧），因此使用 `Option` 表示。

use crate::ProtocolError;
use crate::ids::FrameId;
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// 挡位编码（换挡指令与挡位反馈共用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ShiftPosition {
    Park = 0,
    Reverse = 1,
    Neutral = 2,
    ForwardHigh = 3,
    Low = 4,
    /// 仅出现在反馈中：换挡过程中
    BetweenGears = 5,
    /// 仅出现在反馈中：换挡机构故障
    Error = 6,
    None = 7,
}

// 不使用 `#[default]`：num_enum 会把它当作未知编码的兜底值
impl Default for ShiftPosition {
    fn default() -> Self {
        ShiftPosition::None
    }
}

impl ShiftPosition {
    /// 从原始编码转换
    pub fn from_raw(value: u8) -> Result<Self, ProtocolError> {
        Self::try_from(value).map_err(|_| ProtocolError::InvalidValue {
            field: "ShiftPosition".to_string(),
            value,
        })
    }
}

/// 车速反馈 (0x400)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VehicleSpeedRpt {
    /// 车速（m/s）
    pub vehicle_speed: Option<f64>,
    pub vehicle_speed_valid: bool,
}

/// 油门反馈 (0x200)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccelRpt {
    pub enabled: bool,
    pub override_active: bool,
    /// 实际输出值
    pub output_value: Option<f64>,
}

/// 制动反馈 (0x204)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BrakeRpt {
    pub enabled: bool,
    pub override_active: bool,
    /// 实际输出值
    pub output_value: Option<f64>,
}

/// 挡位反馈 (0x228)
///
/// `output_value` 保留原始编码：固件可能上报本端未知的值，
/// 由聚合层决定如何映射（未知值映射为无效挡位）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShiftRpt {
    pub enabled: bool,
    pub output_value: Option<u8>,
}

impl ShiftRpt {
    /// 解析后的挡位（缺失或未知编码时返回 `None`）
    pub fn position(&self) -> Option<ShiftPosition> {
        self.output_value.and_then(|v| ShiftPosition::from_raw(v).ok())
    }
}

/// 转向反馈 (0x22C)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SteeringRpt {
    pub enabled: bool,
    pub override_active: bool,
    /// 实际转向角（rad）
    pub output_value: Option<f64>,
}

/// 驻车制动反馈 (0x224)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParkingBrakeRpt {
    pub parking_brake_on: Option<bool>,
}

/// 单个反馈帧（已解码）
///
/// 原始帧到结构体的解码由外部完成，这里只接收解码结果。
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Report {
    VehicleSpeed(VehicleSpeedRpt),
    Accel(AccelRpt),
    Brake(BrakeRpt),
    Shift(ShiftRpt),
    Steering(SteeringRpt),
    ParkingBrake(ParkingBrakeRpt),
}

impl Report {
    /// 对应的帧 ID
    pub fn id(&self) -> FrameId {
        match self {
            Report::VehicleSpeed(_) => FrameId::VehicleSpeedRpt,
            Report::Accel(_) => FrameId::AccelRpt,
            Report::Brake(_) => FrameId::BrakeRpt,
            Report::Shift(_) => FrameId::ShiftRpt,
            Report::Steering(_) => FrameId::SteeringRpt,
            Report::ParkingBrake(_) => FrameId::ParkingBrakeRpt,
        }
    }
}

/// 底盘原始遥测快照
///
/// 每类反馈只保留最新一帧。任一字段为 `None` 表示尚未收到该反馈。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChassisDetail {
    pub vehicle_speed_rpt: Option<VehicleSpeedRpt>,
    pub accel_rpt: Option<AccelRpt>,
    pub brake_rpt: Option<BrakeRpt>,
    pub shift_rpt: Option<ShiftRpt>,
    pub steering_rpt: Option<SteeringRpt>,
    pub parking_brake_rpt: Option<ParkingBrakeRpt>,
}

impl ChassisDetail {
    /// 用一帧反馈覆盖快照中的对应部分
    pub fn apply(&mut self, report: Report) {
        match report {
            Report::VehicleSpeed(r) => self.vehicle_speed_rpt = Some(r),
            Report::Accel(r) => self.accel_rpt = Some(r),
            Report::Brake(r) => self.brake_rpt = Some(r),
            Report::Shift(r) => self.shift_rpt = Some(r),
            Report::Steering(r) => self.steering_rpt = Some(r),
            Report::ParkingBrake(r) => self.parking_brake_rpt = Some(r),
        }
    }

    /// 车速（m/s）
    pub fn vehicle_speed(&self) -> Option<f64> {
        self.vehicle_speed_rpt.and_then(|r| r.vehicle_speed)
    }

    /// 油门输出
    pub fn accel_output(&self) -> Option<f64> {
        self.accel_rpt.and_then(|r| r.output_value)
    }

    /// 制动输出
    pub fn brake_output(&self) -> Option<f64> {
        self.brake_rpt.and_then(|r| r.output_value)
    }

    /// 挡位原始编码
    pub fn shift_output(&self) -> Option<u8> {
        self.shift_rpt.and_then(|r| r.output_value)
    }

    /// 转向输出（rad）
    pub fn steering_output(&self) -> Option<f64> {
        self.steering_rpt.and_then(|r| r.output_value)
    }

    /// 驻车制动状态
    pub fn parking_brake_on(&self) -> Option<bool> {
        self.parking_brake_rpt.and_then(|r| r.parking_brake_on)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_position_from_raw() {
        assert_eq!(ShiftPosition::from_raw(2).unwrap(), ShiftPosition::Neutral);
        assert_eq!(ShiftPosition::from_raw(3).unwrap(), ShiftPosition::ForwardHigh);
        assert!(ShiftPosition::from_raw(42).is_err());
        assert_eq!(u8::from(ShiftPosition::None), 7);
    }

    #[test]
    fn test_shift_rpt_unknown_code() {
        let rpt = ShiftRpt {
            enabled: true,
            output_value: Some(0xAA),
        };
        assert_eq!(rpt.position(), None);

        let rpt = ShiftRpt {
            enabled: true,
            output_value: Some(1),
        };
        assert_eq!(rpt.position(), Some(ShiftPosition::Reverse));
    }

    #[test]
    fn test_empty_detail_has_no_values() {
        let detail = ChassisDetail::default();
        assert_eq!(detail.vehicle_speed(), None);
        assert_eq!(detail.accel_output(), None);
        assert_eq!(detail.brake_output(), None);
        assert_eq!(detail.shift_output(), None);
        assert_eq!(detail.steering_output(), None);
        assert_eq!(detail.parking_brake_on(), None);
    }

    #[test]
    fn test_apply_overwrites_latest() {
        let mut detail = ChassisDetail::default();
        detail.apply(Report::Brake(BrakeRpt {
            output_value: Some(0.2),
            ..Default::default()
        }));
        detail.apply(Report::Brake(BrakeRpt {
            output_value: Some(0.3),
            ..Default::default()
        }));
        assert_eq!(detail.brake_output(), Some(0.3));
        assert_eq!(detail.accel_output(), None);
    }

    #[test]
    fn test_report_present_but_field_missing() {
        let mut detail = ChassisDetail::default();
        detail.apply(Report::VehicleSpeed(VehicleSpeedRpt {
            vehicle_speed: None,
            vehicle_speed_valid: false,
        }));
        assert!(detail.vehicle_speed_rpt.is_some());
        assert_eq!(detail.vehicle_speed(), None);
    }

    #[test]
    fn test_report_ids() {
        assert_eq!(
            Report::Steering(SteeringRpt::default()).id(),
            FrameId::SteeringRpt
        );
        assert_eq!(
            Report::ParkingBrake(ParkingBrakeRpt::default()).id(),
            FrameId::ParkingBrakeRpt
        );
    }
}
