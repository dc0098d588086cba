//! Builder 模式实现
//!
//! 提供链式构造 `VehicleController` 实例的便捷方式。

use crate::controller::VehicleController;
use crate::error::DriverError;
use crate::health::{HealthProbe, UnimplementedProbe};
use dbw_can::{FrameTransmitter, MessageManager};
use dbw_tools::VehicleConfig;
use std::sync::Arc;
use tracing::warn;

/// VehicleController Builder（链式构造）
///
/// # Example
///
/// ```
/// use dbw_can::mock::MockTransmitter;
/// use dbw_driver::ControllerBuilder;
/// use dbw_tools::VehicleConfig;
/// use std::sync::Arc;
///
/// let controller = ControllerBuilder::new()
///     .transmitter(Arc::new(MockTransmitter::running()))
///     .config(VehicleConfig::default())
///     .build()
///     .unwrap();
/// assert!(controller.is_initialized());
/// ```
#[derive(Default)]
pub struct ControllerBuilder {
    /// 帧注册表（默认注册全部控制帧）
    messages: Option<Arc<MessageManager>>,
    /// 帧发送器（必需）
    transmitter: Option<Arc<dyn FrameTransmitter>>,
    /// 健康检查（默认 [`UnimplementedProbe`]，所有检查失败）
    probe: Option<Arc<dyn HealthProbe>>,
    /// 设置后 `build` 会直接完成初始化
    config: Option<VehicleConfig>,
}

impl ControllerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置帧注册表（可选）
    pub fn messages(mut self, messages: Arc<MessageManager>) -> Self {
        self.messages = Some(messages);
        self
    }

    /// 设置帧发送器
    pub fn transmitter(mut self, transmitter: Arc<dyn FrameTransmitter>) -> Self {
        self.transmitter = Some(transmitter);
        self
    }

    /// 设置健康检查实现（可选）
    pub fn probe(mut self, probe: Arc<dyn HealthProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// 设置车辆配置（可选）
    pub fn config(mut self, config: VehicleConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// 构建控制器
    ///
    /// # 错误
    /// - `DriverError::Configuration`: 未设置帧发送器
    /// - 设置了配置时，返回 [`VehicleController::init`] 的错误
    pub fn build(self) -> Result<VehicleController, DriverError> {
        let transmitter = self.transmitter.ok_or_else(|| {
            DriverError::Configuration("frame transmitter is not set".to_string())
        })?;
        let messages = self
            .messages
            .unwrap_or_else(|| Arc::new(MessageManager::with_all_commands()));
        let probe = self.probe.unwrap_or_else(|| {
            warn!("No health probe configured, automated modes will be refused");
            Arc::new(UnimplementedProbe)
        });

        let mut controller = VehicleController::new(messages, transmitter, probe);
        if let Some(config) = self.config {
            controller.init(config)?;
        }
        Ok(controller)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbw_can::mock::MockTransmitter;

    #[test]
    fn test_build_requires_transmitter() {
        let result = ControllerBuilder::new().build();
        assert!(matches!(result, Err(DriverError::Configuration(_))));
    }

    #[test]
    fn test_build_without_config_is_uninitialized() {
        let controller = ControllerBuilder::new()
            .transmitter(Arc::new(MockTransmitter::running()))
            .build()
            .unwrap();
        assert!(!controller.is_initialized());
    }

    #[test]
    fn test_build_propagates_init_error() {
        let config = VehicleConfig {
            driving_mode: None,
            ..Default::default()
        };
        let result = ControllerBuilder::new()
            .transmitter(Arc::new(MockTransmitter::running()))
            .config(config)
            .build();
        assert!(matches!(result, Err(DriverError::Configuration(_))));
    }
}
