//! Menu State Model
//!
//! Defines the selectable options shown in the tray menu:
//! - StyleOption: a crosshair silhouette (built-in or loaded from disk)
//! - ColorOption: a color to apply to the silhouette
//! - MenuGroup: an ordered, exclusive-choice list of options
//!
//! These types hold no UI handles; the tray module renders them.

use crate::bitmap::{self, SharedBitmap};
use crate::color::{Argb, ColorValue};
use image::RgbaImage;
use std::path::PathBuf;

/// A crosshair style
#[derive(Debug, Clone)]
pub struct StyleOption {
    pub name: String,
    pub bitmap: SharedBitmap,
    /// Source file for styles loaded from the styles directory
    pub path: Option<PathBuf>,
}

/// Where a color option came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorKind {
    /// Keep the style's own colors
    Original,
    /// One of the built-in colors
    Preset,
    /// Loaded from a `.clr` file
    File,
    /// Filled from the color picker or the command line
    Custom,
    /// Filled with a random color on each click
    Random,
}

impl ColorKind {
    /// Mutable slots change value at runtime
    pub fn is_slot(self) -> bool {
        matches!(self, ColorKind::Custom | ColorKind::Random)
    }

    fn slot_title(self) -> &'static str {
        match self {
            ColorKind::Random => "Random color",
            _ => "Custom color",
        }
    }
}

/// A crosshair color
#[derive(Debug, Clone)]
pub struct ColorOption {
    pub label: String,
    pub value: ColorValue,
    pub swatch: RgbaImage,
    pub kind: ColorKind,
}

impl ColorOption {
    pub fn original() -> Self {
        Self {
            label: "Original".to_string(),
            value: ColorValue::Original,
            swatch: bitmap::swatch(ColorValue::Original),
            kind: ColorKind::Original,
        }
    }

    /// A fixed color labelled `"<name> - <HEX>"`
    pub fn fixed(name: &str, color: Argb, kind: ColorKind) -> Self {
        Self {
            label: format!("{} - {}", name, color.to_hex()),
            value: ColorValue::Argb(color),
            swatch: bitmap::swatch(ColorValue::Argb(color)),
            kind,
        }
    }

    /// An empty custom or random slot
    pub fn slot(kind: ColorKind) -> Self {
        Self {
            label: kind.slot_title().to_string(),
            value: ColorValue::Original,
            swatch: bitmap::swatch(ColorValue::Original),
            kind,
        }
    }

    /// Overwrite a slot with a new color, refreshing its swatch and label
    pub fn assign(&mut self, color: Argb) {
        bitmap::fill_solid(&mut self.swatch, color);
        self.label = format!("{} - {}", self.kind.slot_title(), color.to_hex());
        self.value = ColorValue::Argb(color);
    }
}

/// Ordered options with at most one selected
#[derive(Debug, Clone)]
pub struct MenuGroup<T> {
    options: Vec<T>,
    selected: Option<usize>,
}

impl<T> MenuGroup<T> {
    pub fn new(options: Vec<T>) -> Self {
        Self {
            options,
            selected: None,
        }
    }

    /// Select the option at `index` and return the previous selection.
    /// Out-of-range indices leave the group untouched.
    pub fn select(&mut self, index: usize) -> Option<usize> {
        if index >= self.options.len() {
            return self.selected;
        }
        self.selected.replace(index)
    }

    pub fn current_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn current(&self) -> Option<&T> {
        self.selected.and_then(|idx| self.options.get(idx))
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selected == Some(index)
    }

    /// Index after the current selection, wrapping to the first option.
    /// With nothing selected this is the first option.
    pub fn next_index(&self) -> Option<usize> {
        if self.options.is_empty() {
            return None;
        }
        match self.selected {
            Some(idx) if idx + 1 < self.options.len() => Some(idx + 1),
            _ => Some(0),
        }
    }

    /// Current selection, or the first option when nothing is selected yet
    pub fn current_or_first(&self) -> Option<usize> {
        self.selected.or(if self.options.is_empty() { None } else { Some(0) })
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.options.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.options.get_mut(index)
    }

    pub fn position<P>(&self, predicate: P) -> Option<usize>
    where
        P: FnMut(&T) -> bool,
    {
        self.options.iter().position(predicate)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.options.iter()
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}
