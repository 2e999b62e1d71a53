/// Single-instance detection and argument forwarding
///
/// The first process owns a named mutex and listens on a named pipe. A second
/// launch finds the mutex taken, sends its command line over the pipe and
/// exits. The listener runs on its own thread and only hands decoded
/// messages to the main loop through a channel; it never touches crosshair
/// state.
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Named pipe used to forward arguments to the running instance
#[allow(dead_code)]
pub const PIPE_NAME: &str = r"\\.\pipe\FreeCrosshairInstance";

/// Named mutex owned by the running instance
#[allow(dead_code)]
pub const MUTEX_NAME: &str = r"Local\FreeCrosshairSingleInstance";

/// Largest message accepted from a second instance
const MAX_MESSAGE_SIZE: usize = 8192;

/// Messages from a second instance to the running one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstanceMessage {
    /// Command-line arguments of the second launch (program name excluded)
    Args(Vec<String>),
}

pub fn encode(message: &InstanceMessage) -> Result<Vec<u8>> {
    let data = bincode::serialize(message).context("Failed to serialize InstanceMessage")?;
    if data.len() > MAX_MESSAGE_SIZE {
        anyhow::bail!("Forwarded arguments too long ({} bytes)", data.len());
    }
    Ok(data)
}

pub fn decode(data: &[u8]) -> Result<InstanceMessage> {
    bincode::deserialize(data).context("Failed to deserialize InstanceMessage")
}

/// Result of trying to become the running instance
#[cfg(windows)]
pub enum Instance {
    /// This process is the only one; keep the guard alive while running
    Primary(InstanceGuard),
    /// Another process already runs
    Secondary,
}

/// Holds the single-instance mutex
#[cfg(windows)]
pub struct InstanceGuard {
    handle: windows::Win32::Foundation::HANDLE,
}

#[cfg(windows)]
impl Drop for InstanceGuard {
    fn drop(&mut self) {
        unsafe {
            let _ = windows::Win32::Foundation::CloseHandle(self.handle);
        }
    }
}

#[cfg(windows)]
fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(Some(0)).collect()
}

/// Take the single-instance mutex, or report that another process has it
#[cfg(windows)]
pub fn acquire() -> Result<Instance> {
    use windows::core::{Error, PCWSTR};
    use windows::Win32::Foundation::{CloseHandle, BOOL, ERROR_ALREADY_EXISTS};
    use windows::Win32::System::Threading::CreateMutexW;

    let name = wide(MUTEX_NAME);

    unsafe {
        let handle = CreateMutexW(None, BOOL::from(false), PCWSTR(name.as_ptr()))
            .context("Failed to create single-instance mutex")?;

        if Error::from_win32().code() == ERROR_ALREADY_EXISTS.to_hresult() {
            let _ = CloseHandle(handle);
            tracing::info!("Another instance is already running");
            return Ok(Instance::Secondary);
        }

        Ok(Instance::Primary(InstanceGuard { handle }))
    }
}

/// Send this launch's arguments to the running instance
#[cfg(windows)]
pub fn forward_args(args: Vec<String>) -> Result<()> {
    use std::time::Duration;
    use windows::core::PCWSTR;
    use windows::Win32::Foundation::{CloseHandle, HANDLE};
    use windows::Win32::Storage::FileSystem::{
        CreateFileW, FlushFileBuffers, WriteFile, FILE_ATTRIBUTE_NORMAL, FILE_GENERIC_WRITE,
        FILE_SHARE_NONE, OPEN_EXISTING,
    };

    let data = encode(&InstanceMessage::Args(args))?;
    let pipe_name = wide(PIPE_NAME);

    unsafe {
        // The listener may be between two clients; try for about a second
        for _ in 0..10 {
            let handle = CreateFileW(
                PCWSTR(pipe_name.as_ptr()),
                FILE_GENERIC_WRITE.0,
                FILE_SHARE_NONE,
                None,
                OPEN_EXISTING,
                FILE_ATTRIBUTE_NORMAL,
                HANDLE::default(),
            );

            let handle = match handle {
                Ok(h) if !h.is_invalid() => h,
                _ => {
                    std::thread::sleep(Duration::from_millis(100));
                    continue;
                }
            };

            let mut bytes_written = 0u32;
            let result = WriteFile(handle, Some(&data), Some(&mut bytes_written), None);
            let _ = FlushFileBuffers(handle);
            let _ = CloseHandle(handle);

            result.context("WriteFile failed")?;
            tracing::info!("Forwarded arguments to running instance");
            return Ok(());
        }
    }

    anyhow::bail!("Failed to connect to running instance after retries")
}

/// Start the listener thread. Messages arrive on the returned receiver.
#[cfg(windows)]
pub fn spawn_listener() -> Result<crossbeam::channel::Receiver<InstanceMessage>> {
    let (tx, rx) = crossbeam::channel::unbounded();

    std::thread::Builder::new()
        .name("instance-listener".to_string())
        .spawn(move || run_listener(tx))
        .context("Failed to spawn instance listener")?;

    Ok(rx)
}

#[cfg(windows)]
fn run_listener(tx: crossbeam::channel::Sender<InstanceMessage>) {
    use tracing::{debug, error, info, warn};
    use windows::core::PCWSTR;
    use windows::Win32::Foundation::{CloseHandle, ERROR_PIPE_CONNECTED};
    use windows::Win32::Storage::FileSystem::{ReadFile, PIPE_ACCESS_INBOUND};
    use windows::Win32::System::Pipes::{
        ConnectNamedPipe, CreateNamedPipeW, DisconnectNamedPipe, PIPE_READMODE_MESSAGE,
        PIPE_TYPE_MESSAGE, PIPE_WAIT,
    };

    let pipe_name = wide(PIPE_NAME);
    info!("Instance listener started: {}", PIPE_NAME);

    loop {
        let pipe_handle = unsafe {
            CreateNamedPipeW(
                PCWSTR(pipe_name.as_ptr()),
                PIPE_ACCESS_INBOUND,
                PIPE_TYPE_MESSAGE | PIPE_READMODE_MESSAGE | PIPE_WAIT,
                1,                       // Max instances
                0,                       // Out buffer size
                MAX_MESSAGE_SIZE as u32, // In buffer size
                0,                       // Default timeout
                None,                    // Default security
            )
        };

        if pipe_handle.is_invalid() {
            error!("Failed to create instance pipe");
            return;
        }

        // Wait for a second instance to connect
        let connected = unsafe { ConnectNamedPipe(pipe_handle, None) };
        if let Err(e) = connected {
            if e.code() != ERROR_PIPE_CONNECTED.to_hresult() {
                warn!("ConnectNamedPipe error: {}", e);
                unsafe {
                    let _ = CloseHandle(pipe_handle);
                }
                continue;
            }
        }

        let mut buffer = vec![0u8; MAX_MESSAGE_SIZE];
        let mut bytes_read = 0u32;
        let read = unsafe { ReadFile(pipe_handle, Some(&mut buffer), Some(&mut bytes_read), None) };

        unsafe {
            let _ = DisconnectNamedPipe(pipe_handle);
            let _ = CloseHandle(pipe_handle);
        }

        match read {
            Ok(()) if bytes_read > 0 => match decode(&buffer[..bytes_read as usize]) {
                Ok(message) => {
                    debug!("Received {:?}", message);
                    if tx.send(message).is_err() {
                        // Main loop is gone
                        return;
                    }
                }
                Err(e) => error!("{:#}", e),
            },
            Ok(()) => debug!("Empty read from instance pipe"),
            Err(e) => warn!("ReadFile error: {}", e),
        }
    }
}
