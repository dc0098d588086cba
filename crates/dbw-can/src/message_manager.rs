//! 帧注册表
//!
//! [`MessageManager`] 同时承担两件事：
//!
//! - **发送侧**：保存每个已注册控制帧的最新内容，供发送器周期发送；
//!   急停/退出自动驾驶时整体复位到安全基线。
//! - **接收侧**：保存最新的遥测快照 [`ChassisDetail`]，RX 侧写入，
//!   状态查询时无锁读取（ArcSwap）。

use crate::CanError;
use arc_swap::ArcSwap;
use dbw_protocol::{ChassisDetail, CommandMessage, FrameId, OutgoingCommand, Report};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// 类型化帧注册表
///
/// # 示例
///
/// ```
/// use dbw_can::MessageManager;
/// use dbw_protocol::{FrameId, SteeringCmd};
///
/// let manager = MessageManager::with_commands([FrameId::SteeringCmd]).unwrap();
/// manager
///     .with_command::<SteeringCmd, _>(|cmd| {
///         cmd.set_enable(true);
///     })
///     .unwrap();
/// assert!(manager.command::<SteeringCmd>().unwrap().enable);
/// ```
#[derive(Debug)]
pub struct MessageManager {
    send_messages: Mutex<BTreeMap<FrameId, OutgoingCommand>>,
    sensor_data: ArcSwap<ChassisDetail>,
}

impl Default for MessageManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageManager {
    /// 创建空注册表（未注册任何控制帧）
    pub fn new() -> Self {
        Self {
            send_messages: Mutex::new(BTreeMap::new()),
            sensor_data: ArcSwap::from_pointee(ChassisDetail::default()),
        }
    }

    /// 创建并注册给定的控制帧
    pub fn with_commands(ids: impl IntoIterator<Item = FrameId>) -> Result<Self, CanError> {
        let manager = Self::new();
        for id in ids {
            manager.register(id)?;
        }
        Ok(manager)
    }

    /// 注册全部控制帧
    pub fn with_all_commands() -> Self {
        let manager = Self::new();
        {
            let mut messages = manager.send_messages.lock();
            for id in FrameId::COMMANDS {
                if let Ok(baseline) = OutgoingCommand::baseline(id) {
                    messages.insert(id, baseline);
                }
            }
        }
        manager
    }

    /// 注册一个控制帧（初始值为安全基线）
    ///
    /// 重复注册会把该帧复位到基线。
    pub fn register(&self, id: FrameId) -> Result<(), CanError> {
        let baseline = OutgoingCommand::baseline(id)?;
        self.send_messages.lock().insert(id, baseline);
        debug!("Registered command frame {}", id);
        Ok(())
    }

    /// 控制帧是否已注册
    pub fn is_registered(&self, id: FrameId) -> bool {
        self.send_messages.lock().contains_key(&id)
    }

    /// 按类型修改已注册的控制帧
    ///
    /// # 错误
    /// - `CanError::FrameNotRegistered`: 该帧未注册
    pub fn with_command<T, R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R, CanError>
    where
        T: CommandMessage,
    {
        let mut messages = self.send_messages.lock();
        let slot = messages
            .get_mut(&T::ID)
            .ok_or(CanError::FrameNotRegistered(T::ID))?;
        let command = T::from_command_mut(slot).ok_or(CanError::FrameTypeMismatch(T::ID))?;
        Ok(f(command))
    }

    /// 按类型读取已注册控制帧的副本
    pub fn command<T: CommandMessage>(&self) -> Result<T, CanError> {
        self.with_command::<T, _>(|cmd| *cmd)
    }

    /// 按 ID 读取已注册控制帧的副本
    pub fn snapshot(&self, id: FrameId) -> Result<OutgoingCommand, CanError> {
        self.send_messages
            .lock()
            .get(&id)
            .copied()
            .ok_or(CanError::FrameNotRegistered(id))
    }

    /// 所有已注册控制帧的副本（按 ID 升序）
    pub fn send_messages(&self) -> Vec<OutgoingCommand> {
        self.send_messages.lock().values().copied().collect()
    }

    /// 所有控制帧复位到安全基线
    pub fn reset_send_messages(&self) {
        let mut messages = self.send_messages.lock();
        for command in messages.values_mut() {
            command.reset();
        }
        trace!("Reset {} command frames to baseline", messages.len());
    }

    /// 最新遥测快照
    pub fn sensor_data(&self) -> ChassisDetail {
        **self.sensor_data.load()
    }

    /// 写入一帧已解码的反馈
    pub fn update_report(&self, report: Report) {
        self.sensor_data.rcu(|current| {
            let mut next = **current;
            next.apply(report);
            next
        });
    }

    /// 清空遥测快照
    pub fn clear_sensor_data(&self) {
        self.sensor_data.store(ChassisDetail::default().into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbw_protocol::{AccelCmd, BrakeCmd, BrakeRpt, HornCmd, SteeringCmd, VehicleSpeedRpt};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_unregistered_frame_is_reported() {
        let manager = MessageManager::with_commands([FrameId::AccelCmd]).unwrap();
        let result = manager.with_command::<BrakeCmd, _>(|cmd| cmd.brake_cmd = 0.5);
        assert!(matches!(
            result,
            Err(CanError::FrameNotRegistered(FrameId::BrakeCmd))
        ));
        assert!(manager.is_registered(FrameId::AccelCmd));
        assert!(!manager.is_registered(FrameId::BrakeCmd));
    }

    #[test]
    fn test_register_rejects_report_id() {
        let manager = MessageManager::new();
        assert!(matches!(
            manager.register(FrameId::SteeringRpt),
            Err(CanError::Protocol(_))
        ));
    }

    #[test]
    fn test_with_command_mutates_slot() {
        let manager = MessageManager::with_all_commands();
        manager
            .with_command::<AccelCmd, _>(|cmd| {
                cmd.set_enable(true);
                cmd.accel_cmd = 0.3;
            })
            .unwrap();

        let accel = manager.command::<AccelCmd>().unwrap();
        assert!(accel.enable);
        assert!((accel.accel_cmd - 0.3).abs() < f64::EPSILON);
        assert_eq!(
            manager.snapshot(FrameId::AccelCmd).unwrap(),
            OutgoingCommand::Accel(accel)
        );
    }

    #[test]
    fn test_reset_send_messages() {
        let manager = MessageManager::with_all_commands();
        manager
            .with_command::<SteeringCmd, _>(|cmd| {
                cmd.set_enable(true);
                cmd.position = -0.8;
            })
            .unwrap();
        manager
            .with_command::<HornCmd, _>(|cmd| cmd.horn_cmd = true)
            .unwrap();

        manager.reset_send_messages();

        assert_eq!(
            manager.command::<SteeringCmd>().unwrap(),
            SteeringCmd::default()
        );
        assert!(!manager.command::<HornCmd>().unwrap().horn_cmd);
        assert_eq!(manager.send_messages().len(), FrameId::COMMANDS.len());
    }

    #[test]
    fn test_sensor_data_updates() {
        let manager = MessageManager::new();
        assert_eq!(manager.sensor_data(), ChassisDetail::default());

        manager.update_report(Report::VehicleSpeed(VehicleSpeedRpt {
            vehicle_speed: Some(4.5),
            vehicle_speed_valid: true,
        }));
        manager.update_report(Report::Brake(BrakeRpt {
            output_value: Some(0.1),
            ..Default::default()
        }));

        let detail = manager.sensor_data();
        assert_eq!(detail.vehicle_speed(), Some(4.5));
        assert_eq!(detail.brake_output(), Some(0.1));

        manager.clear_sensor_data();
        assert_eq!(manager.sensor_data(), ChassisDetail::default());
    }

    #[test]
    fn test_concurrent_report_updates_are_not_lost() {
        let manager = Arc::new(MessageManager::new());
        let speed_writer = {
            let manager = manager.clone();
            thread::spawn(move || {
                for i in 0..200 {
                    manager.update_report(Report::VehicleSpeed(VehicleSpeedRpt {
                        vehicle_speed: Some(i as f64),
                        vehicle_speed_valid: true,
                    }));
                }
            })
        };
        let brake_writer = {
            let manager = manager.clone();
            thread::spawn(move || {
                for i in 0..200 {
                    manager.update_report(Report::Brake(BrakeRpt {
                        output_value: Some(i as f64),
                        ..Default::default()
                    }));
                }
            })
        };
        speed_writer.join().unwrap();
        brake_writer.join().unwrap();

        let detail = manager.sensor_data();
        assert_eq!(detail.vehicle_speed(), Some(199.0));
        assert_eq!(detail.brake_output(), Some(199.0));
    }
}
