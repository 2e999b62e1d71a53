//! One-time compatibility layer setup
//!
//! The overlay draws on the screen device context in physical pixels, which
//! needs the process to be DPI aware. Windows keeps a per-executable
//! compatibility layer under
//! `HKCU\Software\Microsoft\Windows NT\CurrentVersion\AppCompatFlags\Layers`.
//! On first run the layer is written and the program relaunches itself so
//! the layer takes effect.

use anyhow::Result;

/// Registry key holding per-executable compatibility layers
pub const LAYERS_KEY: &str = r"Software\Microsoft\Windows NT\CurrentVersion\AppCompatFlags\Layers";

/// Layer value that marks the executable as DPI aware
pub const HIGH_DPI_AWARE: &str = "~ HIGHDPIAWARE";

/// Whether the executable must write the layer and restart
pub fn needs_restart(current: Option<&str>) -> bool {
    current != Some(HIGH_DPI_AWARE)
}

/// Outcome of the startup check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompatStatus {
    /// The layer was already present, continue starting up
    Ready,
    /// The layer was just written and a new process was launched
    Restarted,
}

/// Make sure the layer is set for this executable, relaunching if it was not
#[cfg(windows)]
pub fn ensure_compat_layer() -> Result<CompatStatus> {
    use anyhow::Context;
    use std::process::Command;

    let exe = std::env::current_exe().context("Failed to locate executable")?;
    let exe_key = exe.to_string_lossy().into_owned();

    let current = registry::read_string(LAYERS_KEY, &exe_key)?;
    if !needs_restart(current.as_deref()) {
        return Ok(CompatStatus::Ready);
    }

    tracing::info!("Writing compatibility layer for {}", exe_key);
    registry::write_string(LAYERS_KEY, &exe_key, HIGH_DPI_AWARE)?;

    Command::new(&exe)
        .args(std::env::args_os().skip(1))
        .spawn()
        .context("Failed to relaunch after writing compatibility layer")?;

    Ok(CompatStatus::Restarted)
}

#[cfg(not(windows))]
pub fn ensure_compat_layer() -> Result<CompatStatus> {
    Ok(CompatStatus::Ready)
}

#[cfg(windows)]
mod registry {
    use anyhow::{bail, Result};
    use windows::core::PCWSTR;
    use windows::Win32::Foundation::{ERROR_FILE_NOT_FOUND, ERROR_SUCCESS};
    use windows::Win32::System::Registry::{
        RegCloseKey, RegCreateKeyExW, RegQueryValueExW, RegSetValueExW, HKEY, HKEY_CURRENT_USER,
        KEY_READ, KEY_WRITE, REG_OPTION_NON_VOLATILE, REG_SZ, REG_VALUE_TYPE,
    };

    fn wide(s: &str) -> Vec<u16> {
        s.encode_utf16().chain(std::iter::once(0)).collect()
    }

    /// Open (creating if needed) a key under HKCU
    fn open_key(path: &str, write: bool) -> Result<HKEY> {
        let path = wide(path);
        let access = if write { KEY_READ | KEY_WRITE } else { KEY_READ };
        let mut hkey = HKEY::default();

        let status = unsafe {
            RegCreateKeyExW(
                HKEY_CURRENT_USER,
                PCWSTR(path.as_ptr()),
                0,
                PCWSTR::null(),
                REG_OPTION_NON_VOLATILE,
                access,
                None,
                &mut hkey,
                None,
            )
        };

        if status != ERROR_SUCCESS {
            bail!("RegCreateKeyExW failed: {:?}", status);
        }
        Ok(hkey)
    }

    /// Read a string value; `None` if the value does not exist
    pub fn read_string(path: &str, name: &str) -> Result<Option<String>> {
        let hkey = open_key(path, false)?;
        let name = wide(name);
        let mut kind = REG_VALUE_TYPE::default();
        let mut buffer = [0u16; 512];
        let mut size = std::mem::size_of_val(&buffer) as u32;

        let status = unsafe {
            let status = RegQueryValueExW(
                hkey,
                PCWSTR(name.as_ptr()),
                None,
                Some(&mut kind as *mut _),
                Some(buffer.as_mut_ptr() as *mut u8),
                Some(&mut size as *mut _),
            );
            let _ = RegCloseKey(hkey);
            status
        };

        if status == ERROR_FILE_NOT_FOUND {
            return Ok(None);
        }
        if status != ERROR_SUCCESS {
            bail!("RegQueryValueExW failed: {:?}", status);
        }
        if kind != REG_SZ {
            return Ok(None);
        }

        let len = (size as usize / 2).min(buffer.len());
        let value = String::from_utf16_lossy(&buffer[..len]);
        Ok(Some(value.trim_end_matches('\0').to_string()))
    }

    pub fn write_string(path: &str, name: &str, value: &str) -> Result<()> {
        let hkey = open_key(path, true)?;
        let name = wide(name);
        let data = wide(value);
        let bytes =
            unsafe { std::slice::from_raw_parts(data.as_ptr() as *const u8, data.len() * 2) };

        let status = unsafe {
            let status = RegSetValueExW(hkey, PCWSTR(name.as_ptr()), 0, REG_SZ, Some(bytes));
            let _ = RegCloseKey(hkey);
            status
        };

        if status != ERROR_SUCCESS {
            bail!("RegSetValueExW failed: {:?}", status);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_restart() {
        assert!(!needs_restart(Some("~ HIGHDPIAWARE")));
        assert!(needs_restart(None));
        assert!(needs_restart(Some("")));
        assert!(needs_restart(Some("~ RUNASADMIN")));
    }
}
