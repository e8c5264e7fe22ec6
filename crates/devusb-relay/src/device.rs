//! 串口设备写入
//!
//! 每次写入（保活或转发）都重新打开设备：
//! 1. 以只写方式打开（`O_NOCTTY`，避免成为控制终端）
//! 2. 读取 termios，清除 `HUPCL`，设置固定输出波特率，`TCSANOW` 立即生效
//! 3. 一次 `write` 写完整个负载
//! 4. 关闭设备
//!
//! 关闭前已清除 `HUPCL`，关闭时控制线不会跳变，Arduino 一类的板子就不会被复位。
//! 设备句柄是 [`File`]，所有返回路径上都会被 drop，不会跨写入持有。

use crate::error::DeviceError;
use nix::sys::termios::{self, BaudRate, ControlFlags, SetArg};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::PathBuf;
use tracing::{debug, error};

/// 编译期固定的输出波特率
pub const SERIAL_BAUD_RATE: BaudRate = BaudRate::B9600;

/// 单次写入结果
///
/// 循环迭代之间唯一携带的状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Success,
    Failure,
}

/// 负载的去处
///
/// 实现方负责在每次调用内完成“获取设备 → 写入 → 释放设备”，
/// 失败只通过返回值和（可选的）日志体现。
pub trait Device {
    /// 写入一个负载
    ///
    /// # 参数
    /// - `payload`: 原样写入的字节
    /// - `quiet`: 为 true 时失败不记录日志
    fn write_payload(&mut self, payload: &[u8], quiet: bool) -> WriteOutcome;
}

/// 串口字符设备
#[derive(Debug, Clone)]
pub struct SerialDevice {
    path: PathBuf,
}

impl SerialDevice {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 打开设备、清除 HUPCL 并写入
    ///
    /// 返回写入的字节数。空负载在清除 HUPCL 之后返回 [`DeviceError::EmptyPayload`]。
    pub fn try_write(&self, payload: &[u8]) -> Result<usize, DeviceError> {
        let mut file = OpenOptions::new()
            .write(true)
            .custom_flags(libc::O_NOCTTY)
            .open(&self.path)
            .map_err(DeviceError::Open)?;

        clear_hupcl(&file)?;

        if payload.is_empty() {
            return Err(DeviceError::EmptyPayload);
        }

        let written = file.write(payload).map_err(DeviceError::Write)?;
        if written != payload.len() {
            return Err(DeviceError::ShortWrite {
                written,
                expected: payload.len(),
            });
        }
        Ok(written)
    }
}

impl Device for SerialDevice {
    fn write_payload(&mut self, payload: &[u8], quiet: bool) -> WriteOutcome {
        match self.try_write(payload) {
            Ok(written) => {
                debug!("wrote {} bytes to '{}'", written, self.path.display());
                WriteOutcome::Success
            },
            Err(DeviceError::EmptyPayload) => {
                debug!("empty payload, '{}' opened for HUPCL only", self.path.display());
                WriteOutcome::Failure
            },
            Err(e) => {
                if !quiet {
                    error!("{}", e);
                }
                WriteOutcome::Failure
            },
        }
    }
}

/// 清除 HUPCL 并设置输出波特率
fn clear_hupcl(file: &File) -> Result<(), DeviceError> {
    let mut attrs = termios::tcgetattr(file).map_err(DeviceError::ClearHupcl)?;
    attrs.control_flags.remove(ControlFlags::HUPCL);
    termios::cfsetospeed(&mut attrs, SERIAL_BAUD_RATE).map_err(DeviceError::ClearHupcl)?;
    termios::tcsetattr(file, SetArg::TCSANOW, &attrs).map_err(DeviceError::ClearHupcl)
}
