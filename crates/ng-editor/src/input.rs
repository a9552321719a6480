//! Input abstraction layer.
//!
//! Normalizes the canvas's pointer callbacks (`pointerdown`, `pointermove`,
//! `pointerup`, `pointercancel`, `click`, `dblclick`, `contextmenu`) into a single
//! `InputEvent` enum. Coordinates are client pixels, the same space the
//! canvas bounds are expressed in.

use serde::Serialize;

/// Which pointer button an event concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerButton {
    #[default]
    Primary,
    Middle,
    Secondary,
}

impl PointerButton {
    /// Map a DOM `MouseEvent.button` index.
    pub fn from_index(index: i16) -> Self {
        match index {
            1 => Self::Middle,
            2 => Self::Secondary,
            _ => Self::Primary,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

/// A normalized input event from the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InputEvent {
    PointerDown {
        x: f64,
        y: f64,
        button: PointerButton,
        modifiers: Modifiers,
    },
    PointerMove {
        x: f64,
        y: f64,
        modifiers: Modifiers,
    },
    PointerUp {
        x: f64,
        y: f64,
        button: PointerButton,
        modifiers: Modifiers,
    },
    /// The pointer was taken away mid-gesture (`pointercancel`, window blur).
    PointerCancel {
        x: f64,
        y: f64,
        modifiers: Modifiers,
    },
    Click {
        x: f64,
        y: f64,
        modifiers: Modifiers,
    },
    #[serde(rename = "dblclick")]
    DoubleClick {
        x: f64,
        y: f64,
        modifiers: Modifiers,
    },
    ContextMenu {
        x: f64,
        y: f64,
        modifiers: Modifiers,
    },
}

impl InputEvent {
    pub fn pointer_down(x: f64, y: f64) -> Self {
        Self::PointerDown {
            x,
            y,
            button: PointerButton::Primary,
            modifiers: Modifiers::default(),
        }
    }

    pub fn pointer_move(x: f64, y: f64) -> Self {
        Self::PointerMove {
            x,
            y,
            modifiers: Modifiers::default(),
        }
    }

    pub fn pointer_up(x: f64, y: f64) -> Self {
        Self::PointerUp {
            x,
            y,
            button: PointerButton::Primary,
            modifiers: Modifiers::default(),
        }
    }

    pub fn pointer_cancel(x: f64, y: f64) -> Self {
        Self::PointerCancel {
            x,
            y,
            modifiers: Modifiers::default(),
        }
    }

    pub fn click(x: f64, y: f64) -> Self {
        Self::Click {
            x,
            y,
            modifiers: Modifiers::default(),
        }
    }

    pub fn double_click(x: f64, y: f64) -> Self {
        Self::DoubleClick {
            x,
            y,
            modifiers: Modifiers::default(),
        }
    }

    pub fn context_menu(x: f64, y: f64) -> Self {
        Self::ContextMenu {
            x,
            y,
            modifiers: Modifiers::default(),
        }
    }

    /// Client position of the pointer.
    pub fn position(&self) -> (f64, f64) {
        match *self {
            Self::PointerDown { x, y, .. }
            | Self::PointerMove { x, y, .. }
            | Self::PointerUp { x, y, .. }
            | Self::PointerCancel { x, y, .. }
            | Self::Click { x, y, .. }
            | Self::DoubleClick { x, y, .. }
            | Self::ContextMenu { x, y, .. } => (x, y),
        }
    }

    /// Whether this is a press or release of the primary button.
    pub fn is_primary(&self) -> bool {
        matches!(
            self,
            Self::PointerDown {
                button: PointerButton::Primary,
                ..
            } | Self::PointerUp {
                button: PointerButton::Primary,
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn serializes_with_dom_names() {
        let json = serde_json::to_value(InputEvent::double_click(3.0, 4.0)).unwrap();
        assert_eq!(json["type"], "dblclick");
        assert_eq!(json["x"], 3.0);

        let json = serde_json::to_value(InputEvent::pointer_down(0.0, 0.0)).unwrap();
        assert_eq!(json["type"], "pointerdown");
        assert_eq!(json["button"], "primary");

        let json = serde_json::to_value(InputEvent::pointer_cancel(1.0, 2.0)).unwrap();
        assert_eq!(json["type"], "pointercancel");
    }

    #[test]
    fn button_indices() {
        assert_eq!(PointerButton::from_index(0), PointerButton::Primary);
        assert_eq!(PointerButton::from_index(2), PointerButton::Secondary);
    }
}
