//! # DBW CLI
//!
//! 线控底盘监督控制器的命令行工具。
//!
//! ```bash
//! # 生成默认车辆配置
//! dbw-cli config init
//!
//! # 在仿真底盘上运行 10 秒，3 秒后注入转向故障
//! dbw-cli simulate --duration 10 --fail-steering-after 3
//! ```
//!
//! 日志级别通过 `RUST_LOG` 控制，默认 `dbw_cli=info,dbw_driver=info`。

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod sim;

use commands::{ConfigCommand, SimulateCommand};

/// DBW CLI - 线控底盘命令行工具
#[derive(Parser, Debug)]
#[command(name = "dbw-cli")]
#[command(about = "Command-line interface for the drive-by-wire supervisory controller", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),

    /// 在仿真底盘上运行控制器
    Simulate {
        #[command(flatten)]
        args: SimulateCommand,
    },
}

fn main() -> Result<()> {
    // 状态输出走 stdout，日志走 stderr
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("dbw_cli=info,dbw_driver=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config(cmd) => cmd.execute(),

        Commands::Simulate { args } => args.execute(),
    }
}
