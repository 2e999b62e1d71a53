//! Style and color catalogs, built once at startup
//!
//! Styles: the built-in templates followed by every decodable image in the
//! styles directory. Colors: "Original", the presets, every valid `.clr`
//! file in the colors directory, then the custom and random slots.

use crate::bitmap;
use crate::color::Argb;
use crate::menu::{ColorKind, ColorOption, StyleOption};
use anyhow::{Context, Result};
use image::ImageFormat;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Extension of color files
pub const COLOR_FILE_EXTENSION: &str = "clr";

/// Built-in colors in menu order
pub const PRESET_COLORS: [(&str, Argb); 9] = [
    ("Red", Argb::from_u32(0xFFFF0000)),
    ("Yellow", Argb::from_u32(0xFFFFFF00)),
    ("Blue", Argb::from_u32(0xFF0000FF)),
    ("Green", Argb::from_u32(0xFF00FF00)),
    ("Cyan", Argb::from_u32(0xFF00FFFF)),
    ("Indigo", Argb::from_u32(0xFF4B0082)),
    ("Purple", Argb::from_u32(0xFF800080)),
    ("Black", Argb::from_u32(0xFF000000)),
    ("White", Argb::from_u32(0xFFFFFFFF)),
];

/// All options available to the menus
pub struct Catalog {
    pub styles: Vec<StyleOption>,
    pub colors: Vec<ColorOption>,
}

impl Catalog {
    /// Built-in styles and colors only
    pub fn builtin() -> Self {
        let mut colors = vec![ColorOption::original()];
        colors.extend(
            PRESET_COLORS
                .iter()
                .map(|(name, color)| ColorOption::fixed(name, *color, ColorKind::Preset)),
        );
        colors.push(ColorOption::slot(ColorKind::Custom));
        colors.push(ColorOption::slot(ColorKind::Random));

        Self {
            styles: builtin_style_options(),
            colors,
        }
    }

    /// Built-ins plus whatever the two (optional) directories contain.
    /// File colors go between the presets and the custom/random slots.
    pub fn load(styles_dir: &Path, colors_dir: &Path) -> Self {
        let mut catalog = Self::builtin();
        catalog.styles.extend(load_styles_dir(styles_dir));

        let slots_at = catalog.colors.len() - 2;
        let file_colors = load_colors_dir(colors_dir);
        catalog.colors.splice(slots_at..slots_at, file_colors);

        info!(
            "Catalog loaded: {} styles, {} colors",
            catalog.styles.len(),
            catalog.colors.len()
        );

        catalog
    }
}

/// Built-in styles, drawn in memory
pub fn builtin_style_options() -> Vec<StyleOption> {
    bitmap::builtin_styles()
        .into_iter()
        .map(|(name, image)| StyleOption {
            name: name.to_string(),
            bitmap: Rc::new(image),
            path: None,
        })
        .collect()
}

/// Files of `dir` sorted by file name. A missing directory is an empty list.
fn sorted_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .collect();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

fn file_stem(path: &Path) -> Option<String> {
    path.file_stem().map(|s| s.to_string_lossy().into_owned())
}

/// Every image file in `dir` whose format the `image` crate recognizes
pub fn load_styles_dir(dir: &Path) -> Vec<StyleOption> {
    let files = match sorted_files(dir) {
        Ok(files) => files,
        Err(e) => {
            warn!("Skipping styles directory: {:#}", e);
            return Vec::new();
        }
    };

    files
        .into_iter()
        .filter(|path| ImageFormat::from_path(path).is_ok())
        .filter_map(|path| match load_style(&path) {
            Ok(style) => {
                debug!("Loaded style '{}' from {}", style.name, path.display());
                Some(style)
            }
            Err(e) => {
                warn!("Skipping style {}: {:#}", path.display(), e);
                None
            }
        })
        .collect()
}

fn load_style(path: &Path) -> Result<StyleOption> {
    let name = file_stem(path).context("Style file has no name")?;
    let image = image::open(path)
        .with_context(|| format!("Failed to decode image {}", path.display()))?
        .to_rgba8();

    Ok(StyleOption {
        name,
        bitmap: Rc::new(image),
        path: Some(path.to_path_buf()),
    })
}

/// Every `.clr` file in `dir` holding a valid hex color
pub fn load_colors_dir(dir: &Path) -> Vec<ColorOption> {
    let files = match sorted_files(dir) {
        Ok(files) => files,
        Err(e) => {
            warn!("Skipping colors directory: {:#}", e);
            return Vec::new();
        }
    };

    files
        .into_iter()
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(COLOR_FILE_EXTENSION))
        })
        .filter_map(|path| match load_color(&path) {
            Ok(color) => Some(color),
            Err(e) => {
                warn!("Skipping color file {}: {:#}", path.display(), e);
                None
            }
        })
        .collect()
}

fn load_color(path: &Path) -> Result<ColorOption> {
    let name = file_stem(path).context("Color file has no name")?;
    let text = fs::read_to_string(path).context("Failed to read color file")?;
    let color: Argb = text.trim().parse().context("Invalid color value")?;

    Ok(ColorOption::fixed(&name, color, ColorKind::File))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorValue;
    use image::{Rgba, RgbaImage};
    use tempfile::tempdir;

    fn write_png(path: &Path) {
        let mut img = RgbaImage::new(4, 4);
        img.put_pixel(1, 1, Rgba([0, 0, 0, 255]));
        img.save(path).unwrap();
    }

    #[test]
    fn test_missing_directories_give_builtins_only() {
        let dir = tempdir().unwrap();
        let catalog = Catalog::load(&dir.path().join("Styles"), &dir.path().join("Colors"));

        let names: Vec<&str> = catalog.styles.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["FreeCrosshair1", "FreeCrosshair2"]);

        // Original + presets + custom + random
        assert_eq!(catalog.colors.len(), 1 + PRESET_COLORS.len() + 2);
        assert_eq!(catalog.colors[0].value, ColorValue::Original);
        assert_eq!(catalog.colors[4].label, "Green - FF00FF00");
        assert_eq!(catalog.colors[catalog.colors.len() - 2].kind, ColorKind::Custom);
        assert_eq!(catalog.colors[catalog.colors.len() - 1].kind, ColorKind::Random);
    }

    #[test]
    fn test_styles_dir_loads_images_in_name_order() {
        let dir = tempdir().unwrap();
        write_png(&dir.path().join("Zeta.png"));
        write_png(&dir.path().join("Alpha.png"));
        fs::write(dir.path().join("notes.txt"), "not an image").unwrap();
        fs::write(dir.path().join("Broken.png"), "not a png either").unwrap();

        let styles = load_styles_dir(dir.path());
        let names: Vec<&str> = styles.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Zeta"]);
        assert_eq!(styles[0].path.as_deref(), Some(dir.path().join("Alpha.png").as_path()));
        assert_eq!(styles[0].bitmap.get_pixel(1, 1)[3], 255);
    }

    #[test]
    fn test_colors_dir_skips_bad_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("Orange.clr"), "FFFFA500\n").unwrap();
        fs::write(dir.path().join("Bad.clr"), "not a color").unwrap();
        fs::write(dir.path().join("Ignored.txt"), "FF000000").unwrap();
        fs::write(dir.path().join("Pink.CLR"), " ffffc0cb ").unwrap();

        let colors = load_colors_dir(dir.path());
        let labels: Vec<&str> = colors.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Orange - FFFFA500", "Pink - FFFFC0CB"]);
        assert!(colors.iter().all(|c| c.kind == ColorKind::File));
    }

    #[test]
    fn test_catalog_places_file_colors_before_slots() {
        let dir = tempdir().unwrap();
        let colors_dir = dir.path().join("Colors");
        fs::create_dir(&colors_dir).unwrap();
        fs::write(colors_dir.join("Orange.clr"), "FFFFA500").unwrap();

        let catalog = Catalog::load(&dir.path().join("Styles"), &colors_dir);
        let idx = 1 + PRESET_COLORS.len();
        assert_eq!(catalog.colors[idx].kind, ColorKind::File);
        assert_eq!(catalog.colors[idx + 1].kind, ColorKind::Custom);
    }
}
