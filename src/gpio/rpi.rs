use super::{DischargeLine, InputLine};
use crate::error::SensorError;
use rppal::gpio::{Gpio, InputPin, IoPin, Mode, Bias};
use tracing::{debug, info};

fn gpio_error(pin: u32, details: String) -> SensorError {
    SensorError::Gpio { pin, details }
}

/// Claim BCM `pin` from the GPIO peripheral
fn claim(pin: u32) -> Result<rppal::gpio::Pin, SensorError> {
    let bcm = u8::try_from(pin)
        .map_err(|_| gpio_error(pin, "not a valid BCM pin number".to_string()))?;

    Gpio::new()
        .and_then(|gpio| gpio.get(bcm))
        .map_err(|e| gpio_error(pin, e.to_string()))
}

/// Shutter button input with the internal bias resistor enabled
///
/// An active-low button is pulled up so it idles high; an active-high button is
/// pulled down.
pub struct RpiInputLine {
    pin: u32,
    input: InputPin,
}

impl RpiInputLine {
    pub fn open(pin: u32, active_low: bool) -> Result<Self, SensorError> {
        let claimed = claim(pin)?;
        let input = if active_low {
            claimed.into_input_pullup()
        } else {
            claimed.into_input_pulldown()
        };

        info!(
            "GPIO {} opened as input with pull-{}",
            pin,
            if active_low { "up" } else { "down" }
        );
        Ok(Self { pin, input })
    }
}

impl InputLine for RpiInputLine {
    fn pin(&self) -> u32 {
        self.pin
    }

    fn is_high(&mut self) -> Result<bool, SensorError> {
        Ok(self.input.is_high())
    }
}

/// Photocell line switched between output-low and floating input
///
/// The bias resistor stays off so only the RC network charges the line.
pub struct RpiDischargeLine {
    pin: u32,
    io: IoPin,
}

impl RpiDischargeLine {
    pub fn open(pin: u32) -> Result<Self, SensorError> {
        let mut io = claim(pin)?.into_io(Mode::Input);
        io.set_bias(Bias::Off);

        info!("GPIO {} opened as photocell discharge line", pin);
        Ok(Self { pin, io })
    }
}

impl InputLine for RpiDischargeLine {
    fn pin(&self) -> u32 {
        self.pin
    }

    fn is_high(&mut self) -> Result<bool, SensorError> {
        Ok(self.io.is_high())
    }
}

impl DischargeLine for RpiDischargeLine {
    fn drive_low(&mut self) -> Result<(), SensorError> {
        // Latch the level before switching so the line never glitches high
        self.io.set_low();
        self.io.set_mode(Mode::Output);
        debug!("GPIO {} driven low", self.pin);
        Ok(())
    }

    fn release(&mut self) -> Result<(), SensorError> {
        self.io.set_mode(Mode::Input);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_rejects_pin_out_of_range() {
        assert!(matches!(
            RpiInputLine::open(300, true),
            Err(SensorError::Gpio { pin: 300, .. })
        ));
        assert!(matches!(
            RpiDischargeLine::open(1000),
            Err(SensorError::Gpio { pin: 1000, .. })
        ));
    }

    #[test]
    fn test_open_without_gpio_peripheral_fails() {
        // Only meaningful on machines without a Raspberry Pi GPIO block
        if Path::new("/dev/gpiomem").exists() {
            return;
        }
        assert!(matches!(
            RpiInputLine::open(25, true),
            Err(SensorError::Gpio { pin: 25, .. })
        ));
    }
}
