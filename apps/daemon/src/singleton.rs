//! 单实例文件锁
//!
//! 同一个 FIFO 只允许一个读者。指定 `--lock-file` 时，用排他文件锁保证
//! 只有一个中继进程在运行；进程崩溃时锁由内核自动释放。

use fs4::fs_std::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// 单实例文件锁
///
/// 锁跟随打开的文件描述（flock 语义），守护进程化时 fork 出的子进程继续持有。
pub struct SingletonLock {
    file: File,
    path: PathBuf,
}

impl SingletonLock {
    /// 尝试获取锁（非阻塞）
    ///
    /// # 返回
    /// - `Ok(Self)`: 成功获取锁
    /// - `Err`: 锁已被其他进程持有，或文件操作失败
    pub fn try_lock(lock_path: impl AsRef<Path>) -> Result<Self, io::Error> {
        let path = lock_path.as_ref();

        // 拿到锁之前不能截断，文件里可能是持锁进程的 PID
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .read(true)
            .open(path)?;

        if !file.try_lock_exclusive()? {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "another relay is already running (locked)",
            ));
        }

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// 把当前 PID 写入锁文件
    ///
    /// 守护进程化之后调用，写入的是最终进程的 PID。
    pub fn record_pid(&mut self) -> io::Result<()> {
        self.file.set_len(0)?;
        self.file.seek(SeekFrom::Start(0))?;
        writeln!(self.file, "{}", std::process::id())?;
        self.file.sync_all()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SingletonLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}
