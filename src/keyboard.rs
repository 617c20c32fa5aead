pub(crate) mod device;
pub(crate) mod event_codes;

use crate::error::KeylogError;
use crate::key_code::key_name;
use crate::KeylogResult;
use event_codes::{EV_KEY, EV_KEY_PRESS, EV_KEY_RELEASE, EV_KEY_REPEAT};
use std::convert::TryFrom;
use std::fs::File;
use std::io;
use std::os::fd::{AsRawFd, OwnedFd, RawFd};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// An open source of `input_event` records, usually an evdev keyboard device.
///
/// The underlying descriptor is closed when the handle is dropped.
#[derive(Debug)]
pub struct CaptureHandle {
    /// The name reported by the device (empty for sources that have none).
    name: String,
    /// The path of the input device (e.g. `/dev/input/event0`).
    path: PathBuf,
    fd: OwnedFd,
}

impl CaptureHandle {
    /// Wrap an already open descriptor that yields raw `input_event` records.
    pub fn new(path: impl Into<PathBuf>, fd: impl Into<OwnedFd>) -> Self {
        Self {
            name: String::new(),
            path: path.into(),
            fd: fd.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read one record. `Ok(None)` means the source is gone.
    pub(crate) fn read_event(&self) -> io::Result<Option<libc::input_event>> {
        device::read_input_event(self.fd.as_raw_fd())
    }
}

impl AsRawFd for CaptureHandle {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

impl TryFrom<&Path> for CaptureHandle {
    type Error = KeylogError;

    fn try_from(path: &Path) -> Result<Self, Self::Error> {
        let file = File::open(path)?;
        let name = device::read_name(&file)?;

        if !is_keyboard_name(&name) {
            // `file` is closed here
            return Err(KeylogError::NotAKeyboard {
                path: path.to_path_buf(),
                name,
            });
        }

        Ok(Self {
            name,
            path: path.to_path_buf(),
            fd: file.into(),
        })
    }
}

/// Check whether a device name identifies a keyboard.
pub fn is_keyboard_name(name: &str) -> bool {
    name.to_lowercase().contains("keyboard")
}

/// Find up to `max_devices` keyboards among the `prefix*` nodes of `input_dir`.
///
/// Devices that cannot be opened or queried are skipped. An empty result is not an error here;
/// the capture loop refuses to start without devices.
pub fn find_keyboards(
    input_dir: &Path,
    prefix: &str,
    max_devices: usize,
) -> KeylogResult<Vec<CaptureHandle>> {
    let mut keyboards = Vec::new();

    for path in device::find_event_nodes(input_dir, prefix)? {
        if keyboards.len() >= max_devices {
            info!(max_devices, "device limit reached, ignoring remaining input devices");
            break;
        }

        match CaptureHandle::try_from(path.as_path()) {
            Ok(keyboard) => {
                info!(
                    device = %keyboard.path.display(),
                    name = %keyboard.name,
                    "keyboard device found"
                );
                keyboards.push(keyboard);
            }
            Err(KeylogError::NotAKeyboard { path, name }) => {
                info!(device = %path.display(), %name, "skipping non-keyboard device");
            }
            Err(e) => {
                warn!(device = %path.display(), error = %e, "failed to probe input device");
            }
        }
    }

    Ok(keyboards)
}

/// A key event (EV_KEY).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// The action that triggered the event.
    pub cause: KeyEventCause,
    /// The key code of the key that triggered the event.
    pub code: u16,
}

/// The reason a `KeyEvent` fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEventCause {
    /// The key was pressed.
    Press,
    /// The key was released.
    Release,
    /// The key is held down and autorepeat kicked in.
    Repeat,
}

impl KeyEvent {
    pub fn is_press(&self) -> bool {
        self.cause == KeyEventCause::Press
    }

    /// The human-readable name of the key.
    pub fn key_name(&self) -> &'static str {
        key_name(i32::from(self.code))
    }
}

impl TryFrom<&libc::input_event> for KeyEvent {
    type Error = KeylogError;

    fn try_from(ev: &libc::input_event) -> Result<Self, Self::Error> {
        // Only EV_KEY carries key state changes
        if ev.type_ != EV_KEY {
            return Err(KeylogError::UnsupportedEventType(ev.type_));
        }

        let cause = match ev.value {
            EV_KEY_RELEASE => KeyEventCause::Release,
            EV_KEY_PRESS => KeyEventCause::Press,
            EV_KEY_REPEAT => KeyEventCause::Repeat,
            n => {
                return Err(KeylogError::InvalidKeyEvent(format!(
                    "invalid value for EV_KEY: {n}"
                )))
            }
        };

        Ok(Self {
            cause,
            code: ev.code,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn input_event(type_: u16, code: u16, value: i32) -> libc::input_event {
        libc::input_event {
            time: libc::timeval {
                tv_sec: 0,
                tv_usec: 0,
            },
            type_,
            code,
            value,
        }
    }

    #[test]
    fn key_events_are_classified() {
        let press = KeyEvent::try_from(&input_event(EV_KEY, 30, 1)).unwrap();
        assert_eq!(
            press,
            KeyEvent {
                cause: KeyEventCause::Press,
                code: 30
            }
        );
        assert!(press.is_press());
        assert_eq!(press.key_name(), "A");

        let release = KeyEvent::try_from(&input_event(EV_KEY, 30, 0)).unwrap();
        assert_eq!(release.cause, KeyEventCause::Release);
        assert!(!release.is_press());

        let repeat = KeyEvent::try_from(&input_event(EV_KEY, 30, 2)).unwrap();
        assert_eq!(repeat.cause, KeyEventCause::Repeat);
        assert!(!repeat.is_press());
    }

    #[test]
    fn non_key_events_are_rejected() {
        // EV_SYN / SYN_REPORT
        assert!(matches!(
            KeyEvent::try_from(&input_event(0x00, 0, 0)),
            Err(KeylogError::UnsupportedEventType(0x00))
        ));
        // EV_MSC / MSC_SCAN
        assert!(matches!(
            KeyEvent::try_from(&input_event(0x04, 4, 30)),
            Err(KeylogError::UnsupportedEventType(0x04))
        ));
        assert!(matches!(
            KeyEvent::try_from(&input_event(EV_KEY, 30, 7)),
            Err(KeylogError::InvalidKeyEvent(_))
        ));
    }

    #[test]
    fn keyboard_names_match_case_insensitively() {
        assert!(is_keyboard_name("AT Translated Set 2 keyboard"));
        assert!(is_keyboard_name("Logitech USB Keyboard"));
        assert!(is_keyboard_name("KEYBOARD"));
        assert!(!is_keyboard_name("Logitech USB Optical Mouse"));
        assert!(!is_keyboard_name("Power Button"));
        assert!(!is_keyboard_name(""));
    }

    #[test]
    fn discovery_skips_devices_that_cannot_be_queried() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("event0"), b"").unwrap();
        fs::write(dir.path().join("event1"), b"").unwrap();

        let keyboards = find_keyboards(dir.path(), "event", 4).unwrap();

        assert!(keyboards.is_empty());
    }

    #[test]
    fn discovery_fails_without_input_dir() {
        let dir = tempfile::tempdir().unwrap();

        let err = find_keyboards(&dir.path().join("missing"), "event", 4).unwrap_err();

        assert!(err.is_startup_fatal());
    }
}
