//! Crosshair selection state
//!
//! Owns the style and color groups and the composited bitmap the renderer
//! draws. The composited bitmap is only replaced, never edited, and only
//! when the active style bitmap or the active color actually changes.

use crate::bitmap::{self, SharedBitmap};
use crate::catalog::Catalog;
use crate::color::{Argb, ColorValue};
use crate::menu::{ColorKind, ColorOption, MenuGroup, StyleOption};
use anyhow::{anyhow, Result};
use std::rc::Rc;
use tracing::{debug, info};

pub struct CrosshairState {
    styles: MenuGroup<StyleOption>,
    colors: MenuGroup<ColorOption>,
    /// Source bitmap the composite was built from
    active_style: SharedBitmap,
    active_color: ColorValue,
    composited: SharedBitmap,
}

impl CrosshairState {
    /// Create the state with the first style and the first color active.
    /// Nothing is marked selected until a selection is applied.
    pub fn new(catalog: Catalog) -> Result<Self> {
        let styles = MenuGroup::new(catalog.styles);
        let colors = MenuGroup::new(catalog.colors);

        let first = styles
            .get(0)
            .map(|s| Rc::clone(&s.bitmap))
            .ok_or_else(|| anyhow!("No crosshair styles available"))?;
        if colors.is_empty() {
            return Err(anyhow!("No crosshair colors available"));
        }

        Ok(Self {
            styles,
            colors,
            active_style: Rc::clone(&first),
            active_color: ColorValue::Original,
            composited: first,
        })
    }

    pub fn styles(&self) -> &MenuGroup<StyleOption> {
        &self.styles
    }

    pub fn colors(&self) -> &MenuGroup<ColorOption> {
        &self.colors
    }

    /// Bitmap the overlay draws
    pub fn composited(&self) -> &SharedBitmap {
        &self.composited
    }

    pub fn active_color(&self) -> ColorValue {
        self.active_color
    }

    /// Select a style. Returns true if the composite was rebuilt.
    pub fn select_style(&mut self, index: usize) -> bool {
        let Some(style) = self.styles.get(index) else {
            return false;
        };
        let bitmap = Rc::clone(&style.bitmap);
        self.styles.select(index);

        if Rc::ptr_eq(&bitmap, &self.active_style) {
            return false;
        }

        debug!("Style changed to '{}'", self.styles.get(index).map_or("", |s| s.name.as_str()));
        self.active_style = bitmap;
        self.active_color = self.selected_color();
        self.rebuild();
        true
    }

    /// Select a color. Returns true if the composite was rebuilt.
    pub fn select_color(&mut self, index: usize) -> bool {
        let Some(color) = self.colors.get(index).map(|c| c.value) else {
            return false;
        };
        self.colors.select(index);

        if color == self.active_color {
            return false;
        }

        debug!("Color changed to {:?}", color);
        self.active_color = color;
        self.active_style = self.selected_style_bitmap();
        self.rebuild();
        true
    }

    /// Advance to the next style, wrapping after the last one
    pub fn next_style(&mut self) -> bool {
        match self.styles.next_index() {
            Some(index) => self.select_style(index),
            None => false,
        }
    }

    /// Store `color` in the custom (or random) slot at `index` without
    /// selecting it. Returns false if `index` is not a slot.
    pub fn fill_slot(&mut self, index: usize, color: Argb) -> bool {
        match self.colors.get_mut(index) {
            Some(option) if option.kind.is_slot() => {
                option.assign(color);
                true
            }
            _ => false,
        }
    }

    /// Store `color` in the slot at `index` and select it
    pub fn assign_slot(&mut self, index: usize, color: Argb) -> bool {
        self.fill_slot(index, color) && self.select_color(index)
    }

    /// Index of the custom color slot
    pub fn custom_slot(&self) -> Option<usize> {
        self.slot_index(ColorKind::Custom)
    }

    /// Index of the random color slot
    pub fn random_slot(&self) -> Option<usize> {
        self.slot_index(ColorKind::Random)
    }

    fn slot_index(&self, kind: ColorKind) -> Option<usize> {
        self.colors.position(|c| c.kind == kind)
    }

    fn selected_color(&self) -> ColorValue {
        self.colors.current().map_or(ColorValue::Original, |c| c.value)
    }

    fn selected_style_bitmap(&self) -> SharedBitmap {
        self.styles
            .current()
            .map_or_else(|| Rc::clone(&self.active_style), |s| Rc::clone(&s.bitmap))
    }

    fn rebuild(&mut self) {
        self.composited = bitmap::recolor(&self.active_style, self.active_color);
        info!(
            "Crosshair rebuilt: {}x{}, color {:?}",
            self.composited.width(),
            self.composited.height(),
            self.active_color
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Index of the preset "Red" in a catalog built without directories
    const RED: usize = 1;
    const GREEN: usize = 4;

    #[test]
    fn test_new_starts_with_first_style_uncolored() {
        let state = CrosshairState::new(Catalog::builtin()).unwrap();
        let first = &state.styles().get(0).unwrap().bitmap;
        assert!(Rc::ptr_eq(state.composited(), first));
        assert_eq!(state.styles().current_index(), None);
    }

    #[test]
    fn test_new_rejects_empty_styles() {
        let catalog = Catalog {
            styles: vec![],
            colors: vec![ColorOption::original()],
        };
        assert!(CrosshairState::new(catalog).is_err());
    }

    #[test]
    fn test_select_color_recolors_mask() {
        let mut state = CrosshairState::new(Catalog::builtin()).unwrap();
        state.select_style(0);
        assert!(state.select_color(RED));

        let source = &state.styles().get(0).unwrap().bitmap;
        for (src, out) in source.pixels().zip(state.composited().pixels()) {
            assert_eq!(src[3], out[3]);
            if out[3] > 0 {
                assert_eq!(&out.0[..3], &[0xFF, 0x00, 0x00]);
            }
        }
    }

    #[test]
    fn test_reselect_does_not_rebuild() {
        let mut state = CrosshairState::new(Catalog::builtin()).unwrap();
        state.select_style(1);
        state.select_color(GREEN);
        let before = Rc::clone(state.composited());

        assert!(!state.select_style(1));
        assert!(!state.select_color(GREEN));
        assert!(Rc::ptr_eq(&before, state.composited()));
    }

    #[test]
    fn test_style_change_keeps_selected_color() {
        let mut state = CrosshairState::new(Catalog::builtin()).unwrap();
        state.select_style(0);
        state.select_color(RED);
        assert!(state.select_style(1));

        let pixel = state.composited().pixels().find(|p| p[3] > 0).unwrap();
        assert_eq!(&pixel.0[..3], &[0xFF, 0x00, 0x00]);
    }

    #[test]
    fn test_back_to_original_uses_source_bitmap() {
        let mut state = CrosshairState::new(Catalog::builtin()).unwrap();
        state.select_style(1);
        state.select_color(RED);
        assert!(state.select_color(0));

        let source = &state.styles().get(1).unwrap().bitmap;
        assert!(Rc::ptr_eq(state.composited(), source));
    }

    #[test]
    fn test_next_style_wraps_to_first() {
        let mut state = CrosshairState::new(Catalog::builtin()).unwrap();
        state.next_style();
        assert_eq!(state.styles().current_index(), Some(0));
        state.next_style();
        assert_eq!(state.styles().current_index(), Some(1));
        state.next_style();
        assert_eq!(state.styles().current_index(), Some(0));
    }

    #[test]
    fn test_assign_slot_selects_slot() {
        let mut state = CrosshairState::new(Catalog::builtin()).unwrap();
        let slot = state.random_slot().unwrap();
        let color = Argb::opaque(1, 2, 3);

        assert!(state.assign_slot(slot, color));
        assert_eq!(state.colors().current_index(), Some(slot));
        assert_eq!(state.active_color(), ColorValue::Argb(color));
        assert_eq!(state.colors().get(slot).unwrap().label, "Random color - FF010203");
    }

    #[test]
    fn test_assign_slot_rejects_fixed_options() {
        let mut state = CrosshairState::new(Catalog::builtin()).unwrap();
        assert!(!state.assign_slot(RED, Argb::opaque(1, 2, 3)));
        assert_eq!(state.colors().get(RED).unwrap().label, "Red - FFFF0000");
    }
}
