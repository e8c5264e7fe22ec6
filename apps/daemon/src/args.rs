//! 命令行参数

use clap::Parser;
use devusb_relay::KeepaliveLogPolicy;
use std::path::PathBuf;

/// FIFO → 串口中继
///
/// 提供一个命名管道，把收到的一切转发到 DEVICE_FILE。
/// 每次写入前清除 DEVICE_FILE 的 HUPCL 标志，避免每次写入都复位 Arduino。
#[derive(Parser, Debug, Default)]
#[command(name = "mapper-devusb", version)]
#[command(
    about = "Provide a named pipe and forward everything written to it to DEVICE_FILE",
    long_about = None
)]
pub struct Args {
    /// 串口设备文件（如 /dev/ttyUSB0）
    #[arg(value_name = "DEVICE_FILE")]
    pub device: Option<PathBuf>,

    /// 输出调试信息
    #[arg(short = 'D', long)]
    pub debug: bool,

    /// 以守护进程方式运行
    #[arg(short = 'd', long)]
    pub daemon: bool,

    /// 日志追加写入 FILE（默认 stderr）
    #[arg(short = 'l', long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// 使用的 FIFO（默认 /tmp/arduino）
    #[arg(short = 'f', long, value_name = "FIFO")]
    pub fifo: Option<PathBuf>,

    /// TOML 配置文件（命令行优先）
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// 保活日志策略：never | on-error | always
    #[arg(short = 'k', long, value_name = "POLICY")]
    pub keepalive_log: Option<KeepaliveLogPolicy>,

    /// 单实例锁文件
    #[arg(long, value_name = "FILE")]
    pub lock_file: Option<PathBuf>,
}
