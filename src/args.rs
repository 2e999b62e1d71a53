//! Command Argument Resolver
//!
//! Arguments look like `style=FreeCrosshair2` or `-Color=FF00FF00`. Keys are
//! case-insensitive and may start with `/` or `-`. Unknown keys are ignored,
//! and so are style names that match nothing.

use crate::color::{Argb, ColorValue};
use crate::state::CrosshairState;
use tracing::debug;

/// Values picked out of the command line. `None` means "not supplied".
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CommandArgs {
    pub style: Option<String>,
    pub color: Option<String>,
}

impl CommandArgs {
    /// Parse raw arguments. The last occurrence of a key wins, and an empty
    /// value counts as not supplied.
    pub fn parse<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parsed = CommandArgs::default();

        for arg in args {
            let mut parts = arg.as_ref().split('=');
            let key = parts.next().unwrap_or_default().to_lowercase();
            let value = parts
                .next()
                .filter(|v| !v.is_empty())
                .map(str::to_string);

            match key.strip_prefix(['/', '-']).unwrap_or(&key) {
                "style" => parsed.style = value,
                "color" => parsed.color = value,
                _ => debug!("Ignoring argument '{}'", arg.as_ref()),
            }
        }

        parsed
    }

    pub fn is_empty(&self) -> bool {
        self.style.is_none() && self.color.is_none()
    }
}

/// Color for a `color=` value. Anything unparsable becomes opaque green.
pub fn parse_color_arg(text: &str) -> Argb {
    text.parse().unwrap_or(Argb::GREEN)
}

/// Menu indices a set of arguments resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub style: usize,
    pub color: usize,
}

/// Work out which style and color the arguments select.
///
/// Starts from the current selection (or the first option of each group).
/// A color no option holds yet is written into the custom slot,
/// which is why this takes the state mutably.
pub fn resolve(args: &CommandArgs, state: &mut CrosshairState) -> Option<Resolution> {
    let mut style = state.styles().current_or_first()?;
    let mut color = state.colors().current_or_first()?;

    if let Some(name) = &args.style {
        match state.styles().position(|s| &s.name == name) {
            Some(index) => style = index,
            None => debug!("No style named '{}', keeping current", name),
        }
    }

    if let Some(text) = &args.color {
        let argb = parse_color_arg(text);
        let value = ColorValue::Argb(argb);

        // Fixed options come before the slots in menu order, so they win
        let existing = state.colors().position(|c| c.value == value);

        match existing {
            Some(index) => color = index,
            None => {
                if let Some(slot) = state.custom_slot() {
                    state.fill_slot(slot, argb);
                    color = slot;
                }
            }
        }
    }

    Some(Resolution { style, color })
}

/// Resolve `args` and apply the result. Returns true if the crosshair changed.
pub fn apply(args: &CommandArgs, state: &mut CrosshairState) -> bool {
    let Some(resolution) = resolve(args, state) else {
        return false;
    };

    let style_changed = state.select_style(resolution.style);
    let color_changed = state.select_color(resolution.color);
    style_changed || color_changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn state() -> CrosshairState {
        CrosshairState::new(Catalog::builtin()).unwrap()
    }

    fn current_style(state: &CrosshairState) -> &str {
        &state.styles().current().unwrap().name
    }

    #[test]
    fn test_parse_keys_prefixes_and_case() {
        let args = CommandArgs::parse(["-Style=FreeCrosshair2", "/COLOR=FF00FF00"]);
        assert_eq!(args.style.as_deref(), Some("FreeCrosshair2"));
        assert_eq!(args.color.as_deref(), Some("FF00FF00"));

        let args = CommandArgs::parse(["style=A", "color=B"]);
        assert_eq!(args.style.as_deref(), Some("A"));
        assert_eq!(args.color.as_deref(), Some("B"));
    }

    #[test]
    fn test_parse_last_value_wins_and_unknown_ignored() {
        let args = CommandArgs::parse(["style=A", "size=3", "style=B", "nonsense"]);
        assert_eq!(args.style.as_deref(), Some("B"));
        assert_eq!(args.color, None);

        let args = CommandArgs::parse(["style=A", "style="]);
        assert_eq!(args.style, None);
        assert!(args.is_empty());
    }

    #[test]
    fn test_parse_takes_text_between_first_and_second_equals() {
        let args = CommandArgs::parse(["color=FF00FF00=extra"]);
        assert_eq!(args.color.as_deref(), Some("FF00FF00"));
    }

    #[test]
    fn test_style_match() {
        let mut state = state();
        apply(&CommandArgs::parse(["style=FreeCrosshair2"]), &mut state);
        assert_eq!(current_style(&state), "FreeCrosshair2");
    }

    #[test]
    fn test_style_match_is_case_sensitive() {
        let mut state = state();
        apply(&CommandArgs::parse(["style=freecrosshair2"]), &mut state);
        assert_eq!(current_style(&state), "FreeCrosshair1");
    }

    #[test]
    fn test_unknown_style_keeps_current() {
        let mut state = state();
        state.select_style(1);
        apply(&CommandArgs::parse(["style=Nope"]), &mut state);
        assert_eq!(current_style(&state), "FreeCrosshair2");
    }

    #[test]
    fn test_no_args_selects_first_options() {
        let mut state = state();
        apply(&CommandArgs::default(), &mut state);
        assert_eq!(state.styles().current_index(), Some(0));
        assert_eq!(state.colors().current_index(), Some(0));
        assert_eq!(state.active_color(), ColorValue::Original);
    }

    #[test]
    fn test_bad_hex_falls_back_to_green() {
        assert_eq!(parse_color_arg("zzz"), Argb::GREEN);
        assert_eq!(Argb::GREEN.to_hex(), "FF00FF00");

        let mut state = state();
        apply(&CommandArgs::parse(["color=zzz"]), &mut state);
        let selected = state.colors().current().unwrap();
        assert_eq!(selected.label, "Green - FF00FF00");
        assert_eq!(state.active_color(), ColorValue::Argb(Argb::GREEN));
    }

    #[test]
    fn test_existing_color_is_selected() {
        let mut state = state();
        apply(&CommandArgs::parse(["color=FFFF0000"]), &mut state);
        assert_eq!(state.colors().current().unwrap().label, "Red - FFFF0000");
        let custom = state.custom_slot().unwrap();
        assert_eq!(state.colors().get(custom).unwrap().value, ColorValue::Original);
    }

    #[test]
    fn test_unknown_color_fills_custom_slot() {
        let mut state = state();
        apply(&CommandArgs::parse(["color=FF112233"]), &mut state);

        let custom = state.custom_slot().unwrap();
        assert_eq!(state.colors().current_index(), Some(custom));
        let option = state.colors().get(custom).unwrap();
        assert_eq!(option.value.argb().map(Argb::to_hex).as_deref(), Some("FF112233"));
        assert_eq!(option.label, "Custom color - FF112233");
    }

    #[test]
    fn test_custom_slot_is_overwritten() {
        let mut state = state();
        apply(&CommandArgs::parse(["color=FF112233"]), &mut state);
        apply(&CommandArgs::parse(["color=FF445566"]), &mut state);

        let custom = state.custom_slot().unwrap();
        let option = state.colors().get(custom).unwrap();
        assert_eq!(option.label, "Custom color - FF445566");
        assert_eq!(state.colors().current_index(), Some(custom));
    }

    #[test]
    fn test_color_held_by_random_slot_is_selected() {
        let mut state = state();
        let random = state.random_slot().unwrap();
        state.assign_slot(random, Argb::opaque(0x12, 0x34, 0x56));

        apply(&CommandArgs::parse(["color=FF123456"]), &mut state);
        assert_eq!(state.colors().current_index(), Some(random));
        let custom = state.custom_slot().unwrap();
        assert_eq!(state.colors().get(custom).unwrap().value, ColorValue::Original);
    }

    #[test]
    fn test_only_one_key_prefix_is_accepted() {
        let args = CommandArgs::parse(["--style=A", "//color=B", "-/style=C"]);
        assert!(args.is_empty());

        let args = CommandArgs::parse(["-style=A", "/color=B"]);
        assert_eq!(args.style.as_deref(), Some("A"));
        assert_eq!(args.color.as_deref(), Some("B"));
    }

    #[test]
    fn test_style_only_keeps_current_color() {
        let mut state = state();
        apply(&CommandArgs::parse(["color=FF0000FF"]), &mut state);
        apply(&CommandArgs::parse(["style=FreeCrosshair2"]), &mut state);
        assert_eq!(state.colors().current().unwrap().label, "Blue - FF0000FF");
    }
}
