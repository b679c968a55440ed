//! 背景信息获取模块
//!
//! 提供获取进程与线程背景信息的函数，包括进程ID、线程ID、进程名和线程名。

use once_cell::sync::Lazy;

/// 进程名在进程生命周期内不变，只解析一次
static PROCESS_NAME: Lazy<Option<String>> = Lazy::new(|| {
    std::env::current_exe()
        .ok()
        .and_then(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
});

/// 系统背景信息结构体
///
/// 包含进程ID、线程ID、进程名和线程名
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BackgroundInfo {
    /// 进程ID
    pub pid: u32,
    /// 线程ID
    pub tid: u64,
    /// 进程名
    pub process_name: Option<String>,
    /// 线程名
    pub thread_name: Option<String>,
}

impl BackgroundInfo {
    /// 采集调用线程当前的背景信息
    ///
    /// # Examples
    ///
    /// ```
    /// use logstore::utils::background_info::BackgroundInfo;
    ///
    /// let info = BackgroundInfo::new();
    /// assert_eq!(info.pid, std::process::id());
    /// ```
    pub fn new() -> Self {
        Self {
            pid: get_pid(),
            tid: get_tid(),
            process_name: get_process_name(),
            thread_name: get_thread_name(),
        }
    }
}

/// 获取当前进程ID
pub fn get_pid() -> u32 {
    std::process::id()
}

/// 获取当前线程的系统线程ID
pub fn get_tid() -> u64 {
    #[cfg(windows)]
    {
        unsafe { u64::from(winapi::um::processthreadsapi::GetCurrentThreadId()) }
    }

    #[cfg(target_os = "linux")]
    {
        // 使用gettid系统调用
        let tid = unsafe { libc::syscall(libc::SYS_gettid) };
        tid as u64
    }

    #[cfg(all(unix, not(target_os = "linux")))]
    {
        unsafe { libc::pthread_self() as u64 }
    }

    #[cfg(not(any(windows, unix)))]
    {
        // ThreadId 的 Debug 形如 "ThreadId(3)"
        let id = format!("{:?}", std::thread::current().id());
        id.chars()
            .filter(char::is_ascii_digit)
            .collect::<String>()
            .parse()
            .unwrap_or(0)
    }
}

/// 获取当前可执行文件名（不含扩展名）
pub fn get_process_name() -> Option<String> {
    PROCESS_NAME.clone()
}

/// 获取当前线程名，未命名线程返回 `None`
pub fn get_thread_name() -> Option<String> {
    std::thread::current().name().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_pid() {
        let pid = get_pid();
        assert!(pid > 0);
        assert_eq!(pid, std::process::id());
    }

    #[test]
    fn test_get_tid() {
        assert!(get_tid() > 0);
    }

    #[test]
    fn test_tid_differs_between_threads() {
        let here = get_tid();
        let there = std::thread::spawn(get_tid).join().unwrap();
        assert_ne!(here, there);
    }

    #[test]
    fn test_thread_name() {
        let name = std::thread::Builder::new()
            .name("writer-1".to_string())
            .spawn(get_thread_name)
            .unwrap()
            .join()
            .unwrap();
        assert_eq!(name.as_deref(), Some("writer-1"));
    }

    #[test]
    fn test_process_name_is_stable() {
        assert_eq!(get_process_name(), get_process_name());
        assert!(get_process_name().is_some());
    }

    #[test]
    fn test_background_info_new() {
        let info = BackgroundInfo::new();
        assert_eq!(info.pid, get_pid());
        assert_eq!(info.tid, get_tid());
    }
}
