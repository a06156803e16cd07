//! Push-button polling that turns pin levels into [`MenuCursor`] edges.
//!
//! The kiosk's buttons pull the GPIO low when pressed. Debouncing is done in
//! hardware (RC filter); this module only detects the press edge.

use embedded_hal::digital::InputPin;

use crate::menu::MenuCursor;

/// Electrical polarity of a button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Pressed reads low (pull-up wiring).
    ActiveLow,
    /// Pressed reads high (pull-down wiring).
    ActiveHigh,
}

/// One push-button with press-edge detection.
pub struct EdgeButton<P> {
    pin: P,
    polarity: Polarity,
    was_pressed: bool,
}

impl<P: InputPin> EdgeButton<P> {
    pub fn new(pin: P, polarity: Polarity) -> Self {
        Self {
            pin,
            polarity,
            was_pressed: false,
        }
    }

    /// Whether the button is held right now.
    pub fn is_pressed(&mut self) -> Result<bool, P::Error> {
        match self.polarity {
            Polarity::ActiveLow => self.pin.is_low(),
            Polarity::ActiveHigh => self.pin.is_high(),
        }
    }

    /// Sample the pin; `true` only on the poll where a press starts.
    pub fn poll(&mut self) -> Result<bool, P::Error> {
        let pressed = self.is_pressed()?;
        let edge = pressed && !self.was_pressed;
        self.was_pressed = pressed;
        Ok(edge)
    }
}

/// The set of navigation buttons wired to the kiosk.
///
/// Every role is optional: the two-button builds only fit `down` and `select`.
pub struct ButtonInput<P> {
    pub up: Option<EdgeButton<P>>,
    pub down: Option<EdgeButton<P>>,
    pub select: Option<EdgeButton<P>>,
    pub back: Option<EdgeButton<P>>,
}

impl<P: InputPin> ButtonInput<P> {
    pub fn new() -> Self {
        Self {
            up: None,
            down: None,
            select: None,
            back: None,
        }
    }

    pub fn with_up(mut self, button: EdgeButton<P>) -> Self {
        self.up = Some(button);
        self
    }

    pub fn with_down(mut self, button: EdgeButton<P>) -> Self {
        self.down = Some(button);
        self
    }

    pub fn with_select(mut self, button: EdgeButton<P>) -> Self {
        self.select = Some(button);
        self
    }

    pub fn with_back(mut self, button: EdgeButton<P>) -> Self {
        self.back = Some(button);
        self
    }

    /// Sample all buttons into `cursor`.
    ///
    /// `up`/`down` reflect only this poll. `select`/`back` latch until a menu
    /// consumes them.
    pub fn poll(&mut self, cursor: &mut MenuCursor) -> Result<(), P::Error> {
        cursor.up = poll_optional(&mut self.up)?;
        cursor.down = poll_optional(&mut self.down)?;
        cursor.select |= poll_optional(&mut self.select)?;
        cursor.back |= poll_optional(&mut self.back)?;
        Ok(())
    }
}

impl<P: InputPin> Default for ButtonInput<P> {
    fn default() -> Self {
        Self::new()
    }
}

fn poll_optional<P: InputPin>(button: &mut Option<EdgeButton<P>>) -> Result<bool, P::Error> {
    match button {
        Some(button) => button.poll(),
        None => Ok(false),
    }
}
