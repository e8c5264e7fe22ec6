//! 守护进程化（经典两次 fork）
//!
//! 在输入 FIFO 打开之后、信号处理安装之前调用：此时进程必须仍是单线程的，
//! 否则子进程里只会剩下调用 fork 的那一个线程。

use nix::sys::signal::{SigHandler, Signal, signal};
use nix::sys::stat::{Mode, umask};
use nix::unistd::{ForkResult, chdir, fork, setsid};
use std::fs::OpenOptions;
use std::io;
use std::os::fd::AsRawFd;
use std::process;

/// 脱离终端，转入后台
///
/// 父进程（两代）直接以成功状态退出，只有最终的孙进程从这里返回。
pub fn daemonize() -> io::Result<()> {
    // SAFETY: 调用方保证此时只有一个线程
    if let ForkResult::Parent { .. } = unsafe { fork() }? {
        process::exit(0);
    }

    setsid()?;

    // SAFETY: 只设置为 SIG_IGN，不安装自定义处理函数
    unsafe {
        signal(Signal::SIGCHLD, SigHandler::SigIgn)?;
        signal(Signal::SIGHUP, SigHandler::SigIgn)?;
    }

    // SAFETY: 同上，仍然是单线程
    if let ForkResult::Parent { .. } = unsafe { fork() }? {
        process::exit(0);
    }

    umask(Mode::empty());
    chdir("/")?;
    redirect_stdio()
}

/// 把 stdin/stdout/stderr 指向 /dev/null
///
/// 直接关闭 0/1/2 的话，之后打开的设备文件可能恰好拿到这些编号。
fn redirect_stdio() -> io::Result<()> {
    let null = OpenOptions::new().read(true).write(true).open("/dev/null")?;

    for target in [libc::STDIN_FILENO, libc::STDOUT_FILENO, libc::STDERR_FILENO] {
        // SAFETY: 两个描述符都有效，dup2 不涉及内存
        if unsafe { libc::dup2(null.as_raw_fd(), target) } < 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

/// 守护进程模式下重新忽略 SIGHUP
///
/// ctrlc 的 `termination` 特性会接管 SIGHUP。
pub fn ignore_hangup() -> io::Result<()> {
    // SAFETY: 只设置为 SIG_IGN
    unsafe { signal(Signal::SIGHUP, SigHandler::SigIgn) }?;
    Ok(())
}
