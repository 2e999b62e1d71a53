//! Blocking dialogs: about box, startup error, color picker

use crate::color::Argb;
use std::path::Path;

pub const PRODUCT_NAME: &str = "FreeCrosshair";

/// Text of the about box
pub fn about_text(exe_name: &str, styles_dir: &Path, colors_dir: &Path) -> String {
    format!(
        "Name: {name}\n\n\
         Version: {version}\n\n\
         Usage: {exe} [-Style=FreeCrosshair2] [-Color=FF00FF00]\n\n\
         -Style=FreeCrosshair2    Crosshair style, the name of a built-in or custom style.\n\
         -Color=FF00FF00    Crosshair color, an ARGB hex code.\n\n\
         Custom styles directory: {styles}\n\
         Custom style files: image files (PNG, ...)\n\n\
         Custom colors directory: {colors}\n\
         Custom color files: .clr text files containing a color code",
        name = PRODUCT_NAME,
        version = env!("CARGO_PKG_VERSION"),
        exe = exe_name,
        styles = styles_dir.display(),
        colors = colors_dir.display(),
    )
}

pub fn show_about(text: &str) {
    rfd::MessageDialog::new()
        .set_level(rfd::MessageLevel::Info)
        .set_title(PRODUCT_NAME)
        .set_description(text)
        .set_buttons(rfd::MessageButtons::Ok)
        .show();
}

/// Report an error that stops the program from starting
pub fn show_error(message: &str) {
    rfd::MessageDialog::new()
        .set_level(rfd::MessageLevel::Error)
        .set_title(PRODUCT_NAME)
        .set_description(message)
        .set_buttons(rfd::MessageButtons::Ok)
        .show();
}

/// `COLORREF` is 0x00BBGGRR
#[allow(dead_code)]
fn to_colorref(color: Argb) -> u32 {
    ((color.b as u32) << 16) | ((color.g as u32) << 8) | color.r as u32
}

#[allow(dead_code)]
fn from_colorref(value: u32) -> Argb {
    Argb::opaque(value as u8, (value >> 8) as u8, (value >> 16) as u8)
}

/// Native color dialog. `None` if the user cancelled.
#[cfg(windows)]
pub fn pick_color(initial: Option<Argb>) -> Option<Argb> {
    use windows::Win32::Foundation::COLORREF;
    use windows::Win32::UI::Controls::Dialogs::{
        ChooseColorW, CC_FULLOPEN, CC_RGBINIT, CHOOSECOLORW,
    };

    let mut custom_colors = [COLORREF(0x00FF_FFFF); 16];
    let mut dialog = CHOOSECOLORW {
        lStructSize: std::mem::size_of::<CHOOSECOLORW>() as u32,
        rgbResult: COLORREF(initial.map_or(0, to_colorref)),
        lpCustColors: custom_colors.as_mut_ptr(),
        Flags: CC_FULLOPEN | CC_RGBINIT,
        ..Default::default()
    };

    let picked = unsafe { ChooseColorW(&mut dialog) }.as_bool();
    picked.then(|| from_colorref(dialog.rgbResult.0))
}

#[cfg(not(windows))]
pub fn pick_color(_initial: Option<Argb>) -> Option<Argb> {
    None
}
