//! mapper-devusb 主入口
//!
//! 提供一个命名管道，把写入它的一切转发到串口设备；每次写入都清除设备的
//! HUPCL 标志，避免设备文件关闭时 Arduino 被复位（相当于带自愈能力的
//! `stty -hupcl`）。空闲时定期发送保活，设备意外拔插会尽早通过写入失败暴露。
//!
//! 启动顺序：
//! 1. 解析命令行与配置文件
//! 2. 打开日志
//! 3. 获取单实例锁（可选）
//! 4. 创建/打开 FIFO
//! 5. 守护进程化（可选）
//! 6. 安装信号处理
//! 7. 运行事件循环，直到收到 `EOF()`

mod args;
mod daemonize;
mod error;
mod logging;
mod settings;
mod singleton;

use args::Args;
use clap::Parser;
use clap::error::ErrorKind;
use devusb_relay::{EventLoop, InputChannel, SerialDevice};
use error::{StartupError, exit_code};
use logging::LogSink;
use settings::Settings;
use singleton::SingletonLock;
use std::process;
use tracing::{info, warn};

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => exit_code::USAGE,
            };
            process::exit(code);
        },
    };

    let result = Settings::resolve(args).and_then(run);
    if let Err(e) = result {
        eprintln!("mapper-devusb: error: {}", e);
        if e.is_usage() {
            eprintln!("Try `mapper-devusb -h' for more information.");
        }
        process::exit(e.exit_code());
    }
}

fn run(settings: Settings) -> Result<(), StartupError> {
    // 1. 日志
    let sink = LogSink::open(settings.log_file.as_deref())?;
    logging::init(sink, settings.debug);

    info!("start");
    settings.log_debug();

    // 2. 单实例锁（守护进程化后由子进程继续持有）
    let mut lock = match settings.lock_file.as_deref() {
        Some(path) => Some(SingletonLock::try_lock(path).map_err(|source| {
            StartupError::Locked {
                path: path.to_path_buf(),
                source,
            }
        })?),
        None => None,
    };

    // 3. FIFO
    let channel = InputChannel::open(&settings.relay.fifo_path)?;

    // 4. 守护进程化：必须在任何线程启动之前
    if settings.daemon {
        daemonize::daemonize().map_err(StartupError::Daemonize)?;
    }

    if let Some(lock) = lock.as_mut()
        && let Err(e) = lock.record_pid()
    {
        warn!("cannot write pid to '{}': {}", lock.path().display(), e);
    }

    // 5. SIGINT / SIGTERM：立即退出，不做排空
    ctrlc::set_handler(|| {
        info!("termination");
        process::exit(0);
    })?;
    if settings.daemon
        && let Err(e) = daemonize::ignore_hangup()
    {
        warn!("cannot ignore SIGHUP: {}", e);
    }

    // 6. 事件循环
    info!(
        "relaying '{}' -> '{}'",
        settings.relay.fifo_path.display(),
        settings.relay.device_path.display()
    );
    let device = SerialDevice::new(&settings.relay.device_path);
    EventLoop::new(&settings.relay, channel, device).run();

    info!("termination");
    drop(lock);
    Ok(())
}
