use glam::Vec2;
use tilehop_common::{CameraMode, Direction};

/// Modifier keys the game cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    /// Held while releasing a direction to jump two cells.
    Space,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    /// Drags the helicopter camera.
    Primary,
    Secondary,
}

/// A discrete input event delivered between ticks.
///
/// Movement is edge-triggered on release; presses are reported so hosts can
/// forward them faithfully, but the game loop does not act on them.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    DirectionPressed(Direction),
    DirectionReleased(Direction),
    ModifierPressed(Modifier),
    ModifierReleased(Modifier),
    PointerButton { button: PointerButton, pressed: bool },
    /// Pointer motion since the previous sample, in pixels.
    PointerMoved(Vec2),
    /// Scroll wheel/trackpad delta. `x` rotates the camera, `y` zooms.
    Scrolled(Vec2),
    CameraModeSelected(CameraMode),
    Quit,
    WindowResized { width: u32, height: u32 },
    WindowClosed,
}

impl InputEvent {
    /// True for events that end the session.
    pub fn is_exit(&self) -> bool {
        matches!(self, Self::Quit | Self::WindowClosed)
    }
}
