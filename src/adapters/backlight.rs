//! CH422G backlight control.
//!
//! The panel's backlight enable line sits on a CH422G I/O expander behind
//! I2C. This adapter implements the power half of [`DisplayPort`]; overlay
//! rendering belongs to the UI toolkit, so the shipping firmware layers its
//! own overlay-aware port on top and delegates the backlight calls here.

use esp_idf_hal::delay::BLOCK;
use esp_idf_hal::i2c::I2cDriver;
use log::warn;

use crate::app::ports::DisplayPort;

/// CH422G system-parameter register address (output mode enable).
const CH422G_REG_MODE: u8 = 0x24;
/// CH422G output register address.
const CH422G_REG_OUT: u8 = 0x38;
/// Backlight enable line (EXIO2).
const BACKLIGHT_BIT: u8 = 0x04;

pub struct Ch422gBacklight<'d> {
    i2c: I2cDriver<'d>,
    /// Shadow of the output register; the expander is write-only.
    output: u8,
}

impl<'d> Ch422gBacklight<'d> {
    /// Take over an I2C bus with a CH422G on it and switch it to output
    /// mode with the backlight on.
    pub fn new(i2c: I2cDriver<'d>) -> Self {
        let mut this = Self {
            i2c,
            output: BACKLIGHT_BIT,
        };
        this.write_reg(CH422G_REG_MODE, 0x01);
        this.write_reg(CH422G_REG_OUT, this.output);
        this
    }

    fn write_reg(&mut self, reg: u8, value: u8) {
        if let Err(e) = self.i2c.write(reg, &[value], BLOCK) {
            warn!("CH422G write {reg:#04x} failed: {e}");
        }
    }
}

impl DisplayPort for Ch422gBacklight<'_> {
    fn backlight_on(&mut self) {
        self.output |= BACKLIGHT_BIT;
        let value = self.output;
        self.write_reg(CH422G_REG_OUT, value);
    }

    fn backlight_off(&mut self) {
        self.output &= !BACKLIGHT_BIT;
        let value = self.output;
        self.write_reg(CH422G_REG_OUT, value);
    }

    // Overlay rendering is the UI layer's job; nothing to drive here.
    fn show_overlay(&mut self) {}

    fn hide_overlay(&mut self) {}

    fn set_overlay_opacity(&mut self, _opacity: u8) {}
}
