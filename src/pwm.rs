//! Actuator seam and the Linux sysfs PWM backend behind it.

use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use tracing::{debug, warn};

/// PWM period in nanoseconds. 1 kHz, same as the board firmware configures.
const PERIOD_NS: u64 = 1_000_000;

/// The two duty-cycle outputs the control page drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Gpio5,
    Gpio6,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Gpio5, Channel::Gpio6];

    fn index(self) -> usize {
        match self {
            Channel::Gpio5 => 0,
            Channel::Gpio6 => 1,
        }
    }
}

/// A pair of duty-cycle registers.
///
/// Writes are synchronous register updates and take effect immediately;
/// callers treat them as infallible. Implementations serialize writes per
/// channel so concurrent sessions keep last-write-wins semantics.
pub trait PwmOutputs: Send + Sync {
    fn set_duty(&self, channel: Channel, duty: u16);
}

/// Hardware backend over `/sys/class/pwm`.
///
/// `open` exports both channels if needed, programs the period, and keeps
/// the `duty_cycle` attribute files open for the lifetime of the process.
pub struct SysfsPwm {
    channels: [Mutex<File>; 2],
}

impl SysfsPwm {
    /// Brings up `channels[0]` for GPIO 5 and `channels[1]` for GPIO 6 on
    /// the given pwmchip, starting both at zero duty.
    pub fn open(chip: u32, channels: [u32; 2]) -> Result<Self> {
        let g5 = open_channel(chip, channels[0])?;
        let g6 = open_channel(chip, channels[1])?;
        Ok(SysfsPwm { channels: [g5, g6] })
    }
}

fn open_channel(chip: u32, channel: u32) -> Result<Mutex<File>> {
    let chip_dir = PathBuf::from(format!("/sys/class/pwm/pwmchip{chip}"));
    let pwm_dir = chip_dir.join(format!("pwm{channel}"));
    if !pwm_dir.exists() {
        fs::write(chip_dir.join("export"), channel.to_string())
            .with_context(|| format!("export pwm{channel} on pwmchip{chip}"))?;
    }
    // Duty must be inside the period before the period can shrink, so zero
    // it first in case a previous run left it high.
    fs::write(pwm_dir.join("duty_cycle"), "0")
        .with_context(|| format!("zero duty_cycle of pwm{channel}"))?;
    fs::write(pwm_dir.join("period"), PERIOD_NS.to_string())
        .with_context(|| format!("set period of pwm{channel}"))?;
    fs::write(pwm_dir.join("enable"), "1")
        .with_context(|| format!("enable pwm{channel}"))?;
    let file = OpenOptions::new()
        .write(true)
        .open(pwm_dir.join("duty_cycle"))
        .with_context(|| format!("open duty_cycle of pwm{channel}"))?;
    Ok(Mutex::new(file))
}

impl PwmOutputs for SysfsPwm {
    fn set_duty(&self, channel: Channel, duty: u16) {
        // u16 full scale maps linearly onto the period: 65535 = 100%.
        let ns = u64::from(duty) * PERIOD_NS / 65_535;
        let mut file = self.channels[channel.index()]
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let written = file
            .seek(SeekFrom::Start(0))
            .and_then(|_| file.write_all(ns.to_string().as_bytes()));
        match written {
            Ok(()) => debug!(?channel, duty, "duty cycle updated"),
            Err(err) => warn!(?channel, duty, error = %err, "duty cycle write failed"),
        }
    }
}

/// Zeroes both outputs when dropped.
///
/// A session arms one of these on entering its frame loop, so every exit
/// path, including a panic unwinding the task, leaves the hardware idle
/// before the connection is released.
pub struct FailSafe {
    outputs: Arc<dyn PwmOutputs>,
}

impl FailSafe {
    pub fn new(outputs: Arc<dyn PwmOutputs>) -> Self {
        FailSafe { outputs }
    }
}

impl Drop for FailSafe {
    fn drop(&mut self) {
        for channel in Channel::ALL {
            self.outputs.set_duty(channel, 0);
        }
        debug!("pwm outputs reset to zero");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU16, Ordering};

    use super::*;

    #[derive(Default)]
    struct Recording {
        g5: AtomicU16,
        g6: AtomicU16,
    }

    impl PwmOutputs for Recording {
        fn set_duty(&self, channel: Channel, duty: u16) {
            match channel {
                Channel::Gpio5 => self.g5.store(duty, Ordering::SeqCst),
                Channel::Gpio6 => self.g6.store(duty, Ordering::SeqCst),
            }
        }
    }

    #[test]
    fn fail_safe_zeroes_both_channels_on_drop() {
        let outputs = Arc::new(Recording::default());
        outputs.set_duty(Channel::Gpio5, 41_000);
        outputs.set_duty(Channel::Gpio6, 3);

        drop(FailSafe::new(outputs.clone() as Arc<dyn PwmOutputs>));

        assert_eq!(outputs.g5.load(Ordering::SeqCst), 0);
        assert_eq!(outputs.g6.load(Ordering::SeqCst), 0);
    }
}
