//! Button events and the four-key keypad driver

use core::fmt::Debug;

use embedded_hal::digital::InputPin;

/// One debounced user action per control-loop tick.
///
/// Increase/Decrease adjust the threshold in live mode and move the history
/// selection in browse mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    None,
    Increase,
    Decrease,
    EnterHistory,
    Exit,
}

/// Source of button events, polled once per tick.
pub trait ButtonInput {
    type Error: Debug;

    fn poll(&mut self) -> Result<ButtonEvent, Self::Error>;
}

/// Event reported by each keypad position, in priority order
const KEY_EVENTS: [ButtonEvent; 4] = [
    ButtonEvent::Increase,
    ButtonEvent::Decrease,
    ButtonEvent::EnterHistory,
    ButtonEvent::Exit,
];

/// Four active-low push buttons with pull-ups.
///
/// Keys are ordered Increase, Decrease, View, Exit. A key fires once after it
/// has read low for `debounce_ticks` consecutive polls and must be released
/// before it can fire again. When several keys settle on the same poll the
/// lowest-numbered one wins and the others are swallowed.
pub struct Keypad<P> {
    keys: [P; 4],
    held: [u8; 4],
    debounce_ticks: u8,
}

impl<P: InputPin> Keypad<P> {
    pub fn new(keys: [P; 4], debounce_ticks: u8) -> Self {
        Self {
            keys,
            held: [0; 4],
            debounce_ticks: debounce_ticks.max(1),
        }
    }

    pub fn release(self) -> [P; 4] {
        self.keys
    }
}

impl<P: InputPin> ButtonInput for Keypad<P> {
    type Error = P::Error;

    fn poll(&mut self) -> Result<ButtonEvent, Self::Error> {
        let mut event = ButtonEvent::None;

        for (index, key) in self.keys.iter_mut().enumerate() {
            let held = &mut self.held[index];

            if !key.is_low()? {
                *held = 0;
                continue;
            }

            if *held < self.debounce_ticks {
                *held += 1;
                if *held == self.debounce_ticks && event == ButtonEvent::None {
                    event = KEY_EVENTS[index];
                }
            }
        }

        Ok(event)
    }
}
