//! 配置管理命令
//!
//! 生成、校验、打印车辆配置文件（TOML）

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use dbw_tools::VehicleConfig;
use std::path::{Path, PathBuf};

/// 默认配置文件路径：`<config_dir>/dbw/vehicle.toml`
pub fn default_config_path() -> Result<PathBuf> {
    let mut path = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("无法确定配置目录"))?;

    path.push("dbw");
    path.push("vehicle.toml");
    Ok(path)
}

/// 解析路径（命令行参数优先）
pub fn resolve_path(path: Option<PathBuf>) -> Result<PathBuf> {
    match path {
        Some(path) => Ok(path),
        None => default_config_path(),
    }
}

/// 加载并校验配置
pub fn load_config(path: &Path) -> Result<VehicleConfig> {
    let config = VehicleConfig::load_from_file(path)
        .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("配置无效: {}", path.display()))?;
    Ok(config)
}

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 写入默认配置
    Init {
        /// 配置文件路径（默认 <config_dir>/dbw/vehicle.toml）
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// 覆盖已有文件
        #[arg(short, long)]
        force: bool,
    },

    /// 检查配置
    Check {
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// 打印配置（TOML）
    Show {
        #[arg(short, long)]
        path: Option<PathBuf>,
    },
}

impl ConfigCommand {
    pub fn execute(self) -> Result<()> {
        match self {
            ConfigCommand::Init { path, force } => Self::init_(&resolve_path(path)?, force),

            ConfigCommand::Check { path } => Self::check_(&resolve_path(path)?),

            ConfigCommand::Show { path } => Self::show_(&resolve_path(path)?),
        }
    }

    fn init_(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            bail!("配置文件已存在: {}（使用 --force 覆盖）", path.display());
        }

        VehicleConfig::default()
            .save_to_file(path)
            .with_context(|| format!("写入配置文件失败: {}", path.display()))?;
        println!("✅ 已写入默认配置: {}", path.display());
        Ok(())
    }

    fn check_(path: &Path) -> Result<()> {
        let config = load_config(path)?;

        println!("配置文件: {}", path.display());
        match config.driving_mode {
            Some(mode) => println!("  驾驶模式: {:?}", mode),
            None => println!("  驾驶模式: (未设置，初始化将失败)"),
        }
        println!("  最大转角: {} rad", config.vehicle.max_steer_angle);
        println!(
            "  看门狗: {} ms / {} 次",
            config.watchdog.period_ms, config.watchdog.max_fail_attempts
        );
        println!("✅ 配置有效");
        Ok(())
    }

    fn show_(path: &Path) -> Result<()> {
        let config = load_config(path)?;
        print!("{}", config.to_toml_string()?);
        Ok(())
    }
}
