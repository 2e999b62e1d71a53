/// System tray icon and context menu
///
/// Renders the style and color groups as check-item submenus and maps menu
/// clicks back to `TrayCommand`s. Holds no crosshair state of its own; call
/// `sync` after every state change so check marks, labels, tooltip and icon
/// follow the current selection.
use crate::bitmap::SharedBitmap;
use crate::dialogs::PRODUCT_NAME;
use crate::menu::{ColorKind, ColorOption, MenuGroup};
use crate::state::CrosshairState;
use anyhow::{anyhow, Result};
use image::imageops::FilterType;
use image::RgbaImage;
use std::collections::HashMap;
use std::rc::Rc;
use tray_icon::menu::{CheckMenuItem, Menu, MenuId, MenuItem, PredefinedMenuItem, Submenu};
use tray_icon::{Icon, TrayIcon, TrayIconBuilder};

/// Edge length of the tray icon
pub const ICON_SIZE: u32 = 32;

/// What a menu click asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayCommand {
    SelectStyle(usize),
    SelectColor(usize),
    /// Open the color picker for the custom slot
    CustomColor,
    /// Put a fresh random color in the random slot
    RandomColor,
    About,
    Exit,
}

/// Tooltip text for the current selection
pub fn tooltip_text(state: &CrosshairState) -> String {
    let style = state.styles().current().map_or("", |s| s.name.as_str());
    let color = state.colors().current().map_or("", |c| c.label.as_str());
    format!("{} - {} / {}", PRODUCT_NAME, style, color)
}

/// Scale a crosshair down to tray icon size
pub fn icon_image(bitmap: &RgbaImage) -> RgbaImage {
    if bitmap.width() == ICON_SIZE && bitmap.height() == ICON_SIZE {
        return bitmap.clone();
    }
    image::imageops::resize(bitmap, ICON_SIZE, ICON_SIZE, FilterType::Lanczos3)
}

/// Menu section a color belongs to
fn section(kind: ColorKind) -> u8 {
    match kind {
        ColorKind::Original => 0,
        ColorKind::Preset => 1,
        ColorKind::File => 2,
        ColorKind::Custom | ColorKind::Random => 3,
    }
}

/// Whether a separator goes above the color at `index`: between Original,
/// the presets, the file colors and the two slots.
pub fn separator_before(colors: &MenuGroup<ColorOption>, index: usize) -> bool {
    let (Some(prev), Some(this)) = (
        index.checked_sub(1).and_then(|i| colors.get(i)),
        colors.get(index),
    ) else {
        return false;
    };
    section(prev.kind) != section(this.kind)
}

fn make_icon(bitmap: &RgbaImage) -> Result<Icon> {
    let image = icon_image(bitmap);
    let (width, height) = image.dimensions();
    Icon::from_rgba(image.into_raw(), width, height)
        .map_err(|e| anyhow!("Failed to create tray icon image: {:?}", e))
}

pub struct TrayMenu {
    tray_icon: TrayIcon,
    style_items: Vec<CheckMenuItem>,
    color_items: Vec<CheckMenuItem>,
    commands: HashMap<MenuId, TrayCommand>,
    /// Crosshair currently shown as the icon
    shown: SharedBitmap,
}

impl TrayMenu {
    pub fn new(state: &CrosshairState) -> Result<Self> {
        tracing::info!("Creating tray icon");

        let mut commands = HashMap::new();
        let menu = Menu::new();

        let style_menu = Submenu::new("Style", true);
        let mut style_items = Vec::with_capacity(state.styles().len());
        for (index, style) in state.styles().iter().enumerate() {
            let item = CheckMenuItem::new(&style.name, true, state.styles().is_selected(index), None);
            style_menu
                .append(&item)
                .map_err(|e| anyhow!("Failed to add style item: {}", e))?;
            commands.insert(item.id().clone(), TrayCommand::SelectStyle(index));
            style_items.push(item);
        }

        let color_menu = Submenu::new("Color", true);
        let mut color_items = Vec::with_capacity(state.colors().len());
        let custom_slot = state.custom_slot();
        let random_slot = state.random_slot();
        for (index, color) in state.colors().iter().enumerate() {
            if separator_before(state.colors(), index) {
                color_menu
                    .append(&PredefinedMenuItem::separator())
                    .map_err(|e| anyhow!("Failed to add separator: {}", e))?;
            }

            let item = CheckMenuItem::new(&color.label, true, state.colors().is_selected(index), None);
            color_menu
                .append(&item)
                .map_err(|e| anyhow!("Failed to add color item: {}", e))?;

            let command = if Some(index) == custom_slot {
                TrayCommand::CustomColor
            } else if Some(index) == random_slot {
                TrayCommand::RandomColor
            } else {
                TrayCommand::SelectColor(index)
            };
            commands.insert(item.id().clone(), command);
            color_items.push(item);
        }

        let about_item = MenuItem::new("About", true, None);
        let exit_item = MenuItem::new("Exit", true, None);
        commands.insert(about_item.id().clone(), TrayCommand::About);
        commands.insert(exit_item.id().clone(), TrayCommand::Exit);

        menu.append(&style_menu)
            .map_err(|e| anyhow!("Failed to add style menu: {}", e))?;
        menu.append(&color_menu)
            .map_err(|e| anyhow!("Failed to add color menu: {}", e))?;
        menu.append(&PredefinedMenuItem::separator())
            .map_err(|e| anyhow!("Failed to add separator: {}", e))?;
        menu.append(&about_item)
            .map_err(|e| anyhow!("Failed to add about item: {}", e))?;
        menu.append(&exit_item)
            .map_err(|e| anyhow!("Failed to add exit item: {}", e))?;

        let shown = Rc::clone(state.composited());
        let tray_icon = TrayIconBuilder::new()
            .with_tooltip(tooltip_text(state))
            .with_icon(make_icon(&shown)?)
            .with_menu(Box::new(menu))
            .build()
            .map_err(|e| anyhow!("Failed to create tray icon: {}", e))?;

        tracing::info!(
            "Tray icon created with {} styles and {} colors",
            style_items.len(),
            color_items.len()
        );

        Ok(Self {
            tray_icon,
            style_items,
            color_items,
            commands,
            shown,
        })
    }

    /// Command for a clicked menu item
    pub fn command(&self, id: &MenuId) -> Option<TrayCommand> {
        self.commands.get(id).copied()
    }

    /// Bring the menu and icon in line with `state`
    pub fn sync(&mut self, state: &CrosshairState) {
        for (index, item) in self.style_items.iter().enumerate() {
            item.set_checked(state.styles().is_selected(index));
        }

        for (index, item) in self.color_items.iter().enumerate() {
            item.set_checked(state.colors().is_selected(index));
            if let Some(option) = state.colors().get(index).filter(|c| c.kind.is_slot()) {
                item.set_text(&option.label);
            }
        }

        let _ = self.tray_icon.set_tooltip(Some(tooltip_text(state)));

        if !Rc::ptr_eq(&self.shown, state.composited()) {
            self.shown = Rc::clone(state.composited());
            match make_icon(&self.shown) {
                Ok(icon) => {
                    if let Err(e) = self.tray_icon.set_icon(Some(icon)) {
                        tracing::warn!("Failed to update tray icon: {}", e);
                    }
                }
                Err(e) => tracing::warn!("{:#}", e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::color::Argb;

    #[test]
    fn test_tooltip_names_selection() {
        let mut state = CrosshairState::new(Catalog::builtin()).unwrap();
        state.select_style(1);
        state.select_color(1);
        assert_eq!(
            tooltip_text(&state),
            "FreeCrosshair - FreeCrosshair2 / Red - FFFF0000"
        );
    }

    #[test]
    fn test_tooltip_without_selection() {
        let state = CrosshairState::new(Catalog::builtin()).unwrap();
        assert_eq!(tooltip_text(&state), "FreeCrosshair -  / ");
    }

    #[test]
    fn test_separators_split_color_sections() {
        let mut catalog = Catalog::builtin();
        let slots_at = catalog.colors.len() - 2;
        catalog.colors.insert(
            slots_at,
            ColorOption::fixed("Orange", Argb::opaque(0xFF, 0xA5, 0x00), ColorKind::File),
        );
        let colors = MenuGroup::new(catalog.colors);

        let above: Vec<usize> = (0..colors.len())
            .filter(|&i| separator_before(&colors, i))
            .collect();
        // Red, Orange, Custom color
        assert_eq!(above, vec![1, slots_at, slots_at + 1]);
    }

    #[test]
    fn test_no_separator_between_file_colors_when_absent() {
        let colors = MenuGroup::new(Catalog::builtin().colors);
        let above: Vec<usize> = (0..colors.len())
            .filter(|&i| separator_before(&colors, i))
            .collect();
        assert_eq!(above, vec![1, colors.len() - 2]);
    }

    #[test]
    fn test_icon_image_scaled_to_icon_size() {
        let icon = icon_image(&RgbaImage::new(64, 48));
        assert_eq!(icon.dimensions(), (ICON_SIZE, ICON_SIZE));

        let same = RgbaImage::from_pixel(ICON_SIZE, ICON_SIZE, image::Rgba([1, 2, 3, 4]));
        assert_eq!(icon_image(&same), same);
    }
}
