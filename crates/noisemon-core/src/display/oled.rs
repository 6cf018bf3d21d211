//! Text screens drawn onto a monochrome OLED target

use core::fmt::Debug;

use embedded_graphics::mono_font::{MonoTextStyle, ascii::FONT_8X13};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};

use super::{Presentation, Screen, View};

/// Vertical pitch of a text row (64 px / 4 rows)
const ROW_HEIGHT_PX: i32 = 16;

/// Draws views as four rows of 8x13 text on a 128x64 monochrome target.
///
/// The last screen drawn is remembered and identical frames are skipped, so
/// the panel is only touched when the text actually changes.
pub struct OledPresenter<D> {
    target: D,
    shown: Option<Screen>,
}

impl<D> OledPresenter<D>
where
    D: DrawTarget<Color = BinaryColor>,
{
    pub fn new(target: D) -> Self {
        Self {
            target,
            shown: None,
        }
    }

    pub fn target(&self) -> &D {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut D {
        &mut self.target
    }

    /// Screen currently on the panel
    pub fn shown(&self) -> Option<&Screen> {
        self.shown.as_ref()
    }

    pub fn release(self) -> D {
        self.target
    }

    fn draw_screen(&mut self, screen: &Screen) -> Result<(), D::Error> {
        let style = MonoTextStyle::new(&FONT_8X13, BinaryColor::On);

        self.target.clear(BinaryColor::Off)?;
        for (row, line) in screen.lines().iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            Text::with_baseline(
                line.as_str(),
                Point::new(0, row as i32 * ROW_HEIGHT_PX),
                style,
                Baseline::Top,
            )
            .draw(&mut self.target)?;
        }
        Ok(())
    }
}

impl<D> Presentation for OledPresenter<D>
where
    D: DrawTarget<Color = BinaryColor>,
    D::Error: Debug,
{
    type Error = D::Error;

    fn render(&mut self, view: &View) -> Result<(), Self::Error> {
        let screen = Screen::from_view(view);
        if self.shown.as_ref() == Some(&screen) {
            return Ok(());
        }

        self.draw_screen(&screen)?;
        self.shown = Some(screen);
        Ok(())
    }
}
