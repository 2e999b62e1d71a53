//! Full-screen drawing surface (Windows GDI)
//!
//! The crosshair is alpha-blended straight onto the screen device context.
//! The premultiplied DIB section is rebuilt only when the composited bitmap
//! changes.

use crate::bitmap::{self, SharedBitmap};
use crate::overlay::{DrawSurface, Size};
use anyhow::{bail, Result};
use std::rc::Rc;

use windows::Win32::Foundation::HWND;
use windows::Win32::Graphics::Gdi::{
    AlphaBlend, CreateCompatibleDC, CreateDIBSection, DeleteDC, DeleteObject, GetDC, ReleaseDC,
    SelectObject, AC_SRC_ALPHA, AC_SRC_OVER, BITMAPINFO, BITMAPINFOHEADER, BI_RGB,
    BLENDFUNCTION, DIB_RGB_COLORS, HBITMAP, HDC, HGDIOBJ,
};
use windows::Win32::UI::HiDpi::GetDpiForSystem;
use windows::Win32::UI::WindowsAndMessaging::{
    GetSystemMetrics, IsProcessDPIAware, SM_CXSCREEN, SM_CYSCREEN,
};

/// Primary display size as reported by the system
pub fn primary_screen_size() -> Size {
    unsafe { Size::new(GetSystemMetrics(SM_CXSCREEN), GetSystemMetrics(SM_CYSCREEN)) }
}

/// Factor between system metrics and physical pixels. A DPI-aware process
/// already sees physical pixels.
pub fn dpi_scale() -> f32 {
    unsafe {
        if IsProcessDPIAware().as_bool() {
            return 1.0;
        }
        match GetDpiForSystem() {
            0 => 1.0,
            dpi => dpi as f32 / 96.0,
        }
    }
}

/// Memory DC holding one composited crosshair
struct CachedBitmap {
    source: SharedBitmap,
    mem_dc: HDC,
    hbitmap: HBITMAP,
    old_obj: HGDIOBJ,
}

impl CachedBitmap {
    unsafe fn create(screen_dc: HDC, source: &SharedBitmap) -> Option<Self> {
        let width = source.width();
        let height = source.height();
        if width == 0 || height == 0 {
            return None;
        }

        let mem_dc = CreateCompatibleDC(screen_dc);
        if mem_dc.is_invalid() {
            return None;
        }

        let bmi = BITMAPINFO {
            bmiHeader: BITMAPINFOHEADER {
                biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                biWidth: width as i32,
                biHeight: -(height as i32), // Top-down
                biPlanes: 1,
                biBitCount: 32,
                biCompression: BI_RGB.0 as u32,
                ..std::mem::zeroed()
            },
            bmiColors: [std::mem::zeroed(); 1],
        };

        let mut bits_ptr: *mut std::ffi::c_void = std::ptr::null_mut();
        let hbitmap = match CreateDIBSection(mem_dc, &bmi, DIB_RGB_COLORS, &mut bits_ptr, None, 0) {
            Ok(bmp) if !bits_ptr.is_null() => bmp,
            Ok(bmp) => {
                let _ = DeleteObject(bmp);
                let _ = DeleteDC(mem_dc);
                return None;
            }
            Err(_) => {
                let _ = DeleteDC(mem_dc);
                return None;
            }
        };

        let pixels = bitmap::to_premultiplied_bgra(source);
        let dst = std::slice::from_raw_parts_mut(bits_ptr as *mut u8, pixels.len());
        dst.copy_from_slice(&pixels);

        let old_obj = SelectObject(mem_dc, hbitmap);

        Some(Self {
            source: Rc::clone(source),
            mem_dc,
            hbitmap,
            old_obj,
        })
    }
}

impl Drop for CachedBitmap {
    fn drop(&mut self) {
        unsafe {
            SelectObject(self.mem_dc, self.old_obj);
            let _ = DeleteObject(self.hbitmap);
            let _ = DeleteDC(self.mem_dc);
        }
    }
}

/// The whole-screen device context
pub struct ScreenSurface {
    screen_dc: HDC,
    cache: Option<CachedBitmap>,
}

impl ScreenSurface {
    /// Acquire the screen DC. Held until `release`.
    pub fn acquire() -> Result<Self> {
        let screen_dc = unsafe { GetDC(HWND::default()) };
        if screen_dc.is_invalid() {
            bail!("Failed to acquire the screen device context");
        }
        Ok(Self {
            screen_dc,
            cache: None,
        })
    }
}

impl DrawSurface for ScreenSurface {
    fn draw(&mut self, bitmap: &SharedBitmap, x: i32, y: i32) {
        let stale = self
            .cache
            .as_ref()
            .map_or(true, |cached| !Rc::ptr_eq(&cached.source, bitmap));

        if stale {
            self.cache = None;
            self.cache = unsafe { CachedBitmap::create(self.screen_dc, bitmap) };
        }

        let Some(cached) = &self.cache else {
            return;
        };

        let width = bitmap.width() as i32;
        let height = bitmap.height() as i32;
        let blend = BLENDFUNCTION {
            BlendOp: AC_SRC_OVER as u8,
            BlendFlags: 0,
            SourceConstantAlpha: 255,
            AlphaFormat: AC_SRC_ALPHA as u8,
        };

        unsafe {
            let _ = AlphaBlend(
                self.screen_dc,
                x,
                y,
                width,
                height,
                cached.mem_dc,
                0,
                0,
                width,
                height,
                blend,
            );
        }
    }

    fn release(&mut self) {
        self.cache = None;
        unsafe {
            ReleaseDC(HWND::default(), self.screen_dc);
        }
    }
}
