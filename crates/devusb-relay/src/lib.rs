//! # devusb-relay
//!
//! FIFO → 串口设备中继的核心：
//! - 每次写入都重新打开设备并在写入前清除 `HUPCL`，避免关闭设备时复位 Arduino
//! - 空闲时定期发送保活指令，设备拔插能通过写入失败尽快暴露
//! - 按上一次写入结果在长/短两个等待间隔之间切换
//!
//! 守护进程化、命令行与配置文件解析、日志输出格式都不在本 crate 内，
//! 由 `mapper-devusb` 可执行程序负责。
//!
//! # 示例
//!
//! ```rust,no_run
//! use devusb_relay::{EventLoop, InputChannel, RelayConfig, SerialDevice};
//!
//! let config = RelayConfig::new("/dev/ttyUSB0");
//! let channel = InputChannel::open(&config.fifo_path)?;
//! let device = SerialDevice::new(&config.device_path);
//!
//! EventLoop::new(&config, channel, device).run();
//! # Ok::<(), devusb_relay::ChannelError>(())
//! ```

pub mod backoff;
pub mod channel;
pub mod config;
pub mod device;
mod error;
pub mod event_loop;
pub mod payload;

pub use backoff::{BackoffError, BackoffPolicy};
pub use channel::{FifoStatus, InputChannel, PayloadSource, Readiness, ensure_fifo};
pub use config::{KeepaliveLogPolicy, ParsePolicyError, RelayConfig};
pub use device::{Device, SerialDevice, WriteOutcome};
pub use error::{ChannelError, DeviceError};
pub use event_loop::{EventLoop, Step};
pub use payload::{KEEPALIVE_PAYLOAD, Payload, READ_BUFFER_SIZE, SHUTDOWN_SENTINEL};
