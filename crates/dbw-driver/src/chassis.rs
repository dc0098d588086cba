//! 底盘状态聚合
//!
//! 把原始遥测快照 [`ChassisDetail`] 与当前模式/故障状态合成为
//! 上层规划控制使用的 [`ChassisStatus`]。聚合是纯函数：
//! 每次查询重新计算，从不增量修改。

use crate::fault::ErrorCode;
use crate::mode::DrivingMode;
use dbw_can::ChassisDetail;
use dbw_protocol::ShiftPosition;
use dbw_tools::VehicleParams;

/// 不建议接管时的固定原因
pub const DISALLOW_ENGAGE_REASON: &str =
    "CANBUS not ready, firmware error or emergency button pressed!";

/// 挡位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GearPosition {
    Neutral,
    Drive,
    Reverse,
    Parking,
    Low,
    /// 挡位反馈存在但编码无法识别
    Invalid,
    /// 尚未收到挡位反馈
    #[default]
    None,
}

impl GearPosition {
    /// 挡位反馈编码 → 挡位
    ///
    /// 只有空挡/倒挡/前进挡会被识别，其余编码（包括驻车、低速挡、
    /// 换挡中、故障）一律视为无效。
    pub fn from_report(raw: Option<u8>) -> Self {
        let Some(raw) = raw else {
            return GearPosition::None;
        };
        match ShiftPosition::from_raw(raw) {
            Ok(ShiftPosition::Neutral) => GearPosition::Neutral,
            Ok(ShiftPosition::Reverse) => GearPosition::Reverse,
            Ok(ShiftPosition::ForwardHigh) => GearPosition::Drive,
            _ => GearPosition::Invalid,
        }
    }
}

/// 接管建议
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Advice {
    ReadyToEngage,
    DisallowEngage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngageAdvice {
    pub advice: Advice,
    /// 仅在 `DisallowEngage` 时给出
    pub reason: Option<String>,
}

impl EngageAdvice {
    pub fn ready() -> Self {
        Self {
            advice: Advice::ReadyToEngage,
            reason: None,
        }
    }

    pub fn disallow() -> Self {
        Self {
            advice: Advice::DisallowEngage,
            reason: Some(DISALLOW_ENGAGE_REASON.to_string()),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.advice == Advice::ReadyToEngage
    }
}

/// 底盘状态
///
/// 缺失的遥测字段以默认值填充：数值为 0，挡位为 [`GearPosition::None`]，
/// 驻车制动为 `false`。
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChassisStatus {
    pub driving_mode: DrivingMode,
    pub error_code: ErrorCode,
    pub chassis_error_mask: u32,
    /// 初始化后恒为 true
    pub engine_started: bool,
    /// 车速（m/s）
    pub speed_mps: f64,
    /// 油门（%）
    pub throttle_percentage: f64,
    /// 制动（%）
    pub brake_percentage: f64,
    pub gear_location: GearPosition,
    /// 转向（%），相对最大方向盘转角，左正右负
    pub steering_percentage: f64,
    pub parking_brake: bool,
    pub engage_advice: EngageAdvice,
}

/// 由遥测快照与当前模式/故障状态计算底盘状态
pub fn aggregate(
    detail: &ChassisDetail,
    driving_mode: DrivingMode,
    error_code: ErrorCode,
    chassis_error_mask: u32,
    params: &VehicleParams,
) -> ChassisStatus {
    let speed_mps = detail.vehicle_speed().unwrap_or(0.0);
    // 踏板反馈为 0.0 ~ 1.0
    let throttle_percentage = detail.accel_output().map_or(0.0, |v| v * 100.0);
    let brake_percentage = detail.brake_output().map_or(0.0, |v| v * 100.0);
    let gear_location = GearPosition::from_report(detail.shift_output());
    let steering_percentage = match detail.steering_output() {
        Some(angle) if params.max_steer_angle > 0.0 => angle * 100.0 / params.max_steer_angle,
        _ => 0.0,
    };
    let parking_brake = detail.parking_brake_on().unwrap_or(false);

    let engage_advice = if chassis_error_mask == 0
        && !parking_brake
        && throttle_percentage == 0.0
        && brake_percentage != 0.0
    {
        EngageAdvice::ready()
    } else {
        EngageAdvice::disallow()
    };

    ChassisStatus {
        driving_mode,
        error_code,
        chassis_error_mask,
        engine_started: true,
        speed_mps,
        throttle_percentage,
        brake_percentage,
        gear_location,
        steering_percentage,
        parking_brake,
        engage_advice,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbw_protocol::{AccelRpt, BrakeRpt, ParkingBrakeRpt, Report, ShiftRpt, SteeringRpt};

    fn params() -> VehicleParams {
        VehicleParams {
            max_steer_angle: 8.0,
            ..Default::default()
        }
    }

    fn detail_with_pedals(throttle: f64, brake: f64) -> ChassisDetail {
        let mut detail = ChassisDetail::default();
        detail.apply(Report::Accel(AccelRpt {
            output_value: Some(throttle),
            ..Default::default()
        }));
        detail.apply(Report::Brake(BrakeRpt {
            output_value: Some(brake),
            ..Default::default()
        }));
        detail
    }

    #[test]
    fn test_empty_snapshot_uses_defaults() {
        let status = aggregate(
            &ChassisDetail::default(),
            DrivingMode::Manual,
            ErrorCode::NoError,
            0,
            &params(),
        );
        assert_eq!(status.speed_mps, 0.0);
        assert_eq!(status.throttle_percentage, 0.0);
        assert_eq!(status.brake_percentage, 0.0);
        assert_eq!(status.steering_percentage, 0.0);
        assert_eq!(status.gear_location, GearPosition::None);
        assert!(!status.parking_brake);
        assert!(status.engine_started);
        // 制动为 0，不建议接管
        assert_eq!(status.engage_advice, EngageAdvice::disallow());
    }

    #[test]
    fn test_ready_to_engage() {
        let detail = detail_with_pedals(0.0, 0.125);
        let status = aggregate(
            &detail,
            DrivingMode::Manual,
            ErrorCode::NoError,
            0,
            &params(),
        );
        assert_eq!(status.brake_percentage, 12.5);
        assert!(status.engage_advice.is_ready());
        assert_eq!(status.engage_advice.reason, None);
    }

    #[test]
    fn test_error_mask_disallows_engage() {
        let detail = detail_with_pedals(0.0, 0.125);
        let status = aggregate(
            &detail,
            DrivingMode::Manual,
            ErrorCode::NoError,
            0x4,
            &params(),
        );
        assert_eq!(status.engage_advice.advice, Advice::DisallowEngage);
        assert_eq!(
            status.engage_advice.reason.as_deref(),
            Some(DISALLOW_ENGAGE_REASON)
        );
        assert_eq!(status.chassis_error_mask, 0x4);
    }

    #[test]
    fn test_throttle_or_parking_brake_disallows_engage() {
        let detail = detail_with_pedals(0.05, 0.2);
        let status = aggregate(&detail, DrivingMode::Manual, ErrorCode::NoError, 0, &params());
        assert!(!status.engage_advice.is_ready());

        let mut detail = detail_with_pedals(0.0, 0.2);
        detail.apply(Report::ParkingBrake(ParkingBrakeRpt {
            parking_brake_on: Some(true),
        }));
        let status = aggregate(&detail, DrivingMode::Manual, ErrorCode::NoError, 0, &params());
        assert!(status.parking_brake);
        assert!(!status.engage_advice.is_ready());
    }

    #[test]
    fn test_steering_percentage() {
        let mut detail = ChassisDetail::default();
        detail.apply(Report::Steering(SteeringRpt {
            output_value: Some(-2.0),
            ..Default::default()
        }));
        let status = aggregate(&detail, DrivingMode::Manual, ErrorCode::NoError, 0, &params());
        assert!((status.steering_percentage + 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_gear_mapping() {
        assert_eq!(GearPosition::from_report(None), GearPosition::None);
        assert_eq!(GearPosition::from_report(Some(2)), GearPosition::Neutral);
        assert_eq!(GearPosition::from_report(Some(1)), GearPosition::Reverse);
        assert_eq!(GearPosition::from_report(Some(3)), GearPosition::Drive);
        // 驻车、低速挡、换挡中均不识别
        assert_eq!(GearPosition::from_report(Some(0)), GearPosition::Invalid);
        assert_eq!(GearPosition::from_report(Some(4)), GearPosition::Invalid);
        assert_eq!(GearPosition::from_report(Some(5)), GearPosition::Invalid);
        // 未知编码
        assert_eq!(GearPosition::from_report(Some(0xEE)), GearPosition::Invalid);

        let mut detail = ChassisDetail::default();
        detail.apply(Report::Shift(ShiftRpt {
            enabled: true,
            output_value: Some(3),
        }));
        let status = aggregate(&detail, DrivingMode::Manual, ErrorCode::NoError, 0, &params());
        assert_eq!(status.gear_location, GearPosition::Drive);
    }

    #[test]
    fn test_mode_and_code_pass_through() {
        let status = aggregate(
            &ChassisDetail::default(),
            DrivingMode::AutoSpeedOnly,
            ErrorCode::ManualIntervention,
            0,
            &params(),
        );
        assert_eq!(status.driving_mode, DrivingMode::AutoSpeedOnly);
        assert_eq!(status.error_code, ErrorCode::ManualIntervention);
    }
}
