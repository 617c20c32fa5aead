//! Human-readable names for Linux key codes.
//!
//! The table follows the `KEY_*` constants of [input-event-codes.h], indexed by code.
//! Names are the kernel's, so keypad keys read `KP7` or `KPDOT` and the unassigned codes 195 to 199
//! are `UNKNOWN`. Older keylogger tables abbreviated or shifted some of these.
//!
//! [input-event-codes.h]: https://elixir.bootlin.com/linux/v6.12.6/source/include/uapi/linux/input-event-codes.h

/// Returned for codes outside the table and for unassigned slots.
pub const UNKNOWN: &str = "UNKNOWN";

/// Key names, where `KEY_NAMES[code]` is the name of the key with that code.
pub const KEY_NAMES: [&str; 249] = [
    "RESERVED", "ESC", "1", "2", "3", "4", "5", "6", "7", "8", "9", "0",
    "MINUS", "EQUAL", "BACKSPACE", "TAB", "Q", "W", "E", "R", "T", "Y",
    "U", "I", "O", "P", "LEFTBRACE", "RIGHTBRACE", "ENTER", "LEFTCTRL",
    "A", "S", "D", "F", "G", "H", "J", "K", "L", "SEMICOLON", "APOSTROPHE",
    "GRAVE", "LEFTSHIFT", "BACKSLASH", "Z", "X", "C", "V", "B", "N", "M",
    "COMMA", "DOT", "SLASH", "RIGHTSHIFT", "KPASTERISK", "LEFTALT", "SPACE",
    "CAPSLOCK", "F1", "F2", "F3", "F4", "F5", "F6", "F7", "F8", "F9", "F10",
    "NUMLOCK", "SCROLLLOCK", "KP7", "KP8", "KP9", "KPMINUS", "KP4", "KP5", "KP6",
    "KPPLUS", "KP1", "KP2", "KP3", "KP0", "KPDOT",
    // 84 is unassigned
    UNKNOWN,
    "ZENKAKUHANKAKU", "102ND", "F11", "F12", "RO", "KATAKANA", "HIRAGANA",
    "HENKAN", "KATAKANAHIRAGANA", "MUHENKAN", "KPJPCOMMA", "KPENTER", "RIGHTCTRL",
    "KPSLASH", "SYSRQ", "RIGHTALT", "LINEFEED", "HOME", "UP", "PAGEUP", "LEFT",
    "RIGHT", "END", "DOWN", "PAGEDOWN", "INSERT", "DELETE", "MACRO", "MUTE",
    "VOLUMEDOWN", "VOLUMEUP", "POWER", "KPEQUAL", "KPPLUSMINUS", "PAUSE", "SCALE",
    "KPCOMMA", "HANGEUL", "HANJA", "YEN", "LEFTMETA", "RIGHTMETA", "COMPOSE",
    "STOP", "AGAIN", "PROPS", "UNDO", "FRONT", "COPY", "OPEN", "PASTE", "FIND",
    "CUT", "HELP", "MENU", "CALC", "SETUP", "SLEEP", "WAKEUP", "FILE", "SENDFILE",
    "DELETEFILE", "XFER", "PROG1", "PROG2", "WWW", "MSDOS", "COFFEE",
    "ROTATE_DISPLAY", "CYCLEWINDOWS", "MAIL", "BOOKMARKS", "COMPUTER", "BACK",
    "FORWARD", "CLOSECD", "EJECTCD", "EJECTCLOSECD", "NEXTSONG", "PLAYPAUSE",
    "PREVIOUSSONG", "STOPCD", "RECORD", "REWIND", "PHONE", "ISO", "CONFIG",
    "HOMEPAGE", "REFRESH", "EXIT", "MOVE", "EDIT", "SCROLLUP", "SCROLLDOWN",
    "KPLEFTPAREN", "KPRIGHTPAREN", "NEW", "REDO", "F13", "F14", "F15", "F16",
    "F17", "F18", "F19", "F20", "F21", "F22", "F23", "F24",
    // 195..=199 are unassigned
    UNKNOWN, UNKNOWN, UNKNOWN, UNKNOWN, UNKNOWN,
    "PLAYCD", "PAUSECD",
    "PROG3", "PROG4", "DASHBOARD", "SUSPEND", "CLOSE", "PLAY", "FASTFORWARD",
    "BASSBOOST", "PRINT", "HP", "CAMERA", "SOUND", "QUESTION", "EMAIL", "CHAT",
    "SEARCH", "CONNECT", "FINANCE", "SPORT", "SHOP", "ALTERASE", "CANCEL",
    "BRIGHTNESSDOWN", "BRIGHTNESSUP", "MEDIA", "SWITCHVIDEOMODE",
    "KBDILLUMTOGGLE", "KBDILLUMDOWN", "KBDILLUMUP", "SEND", "REPLY",
    "FORWARDMAIL", "SAVE", "DOCUMENTS", "BATTERY", "BLUETOOTH", "WLAN", "UWB",
    // 240 is KEY_UNKNOWN
    UNKNOWN,
    "VIDEO_NEXT", "VIDEO_PREV", "BRIGHTNESS_CYCLE", "BRIGHTNESS_AUTO",
    "DISPLAY_OFF", "WWAN", "RFKILL", "MICMUTE",
];

/// Look up the name of the key with the specified `code`.
pub fn key_name(code: i32) -> &'static str {
    usize::try_from(code)
        .ok()
        .and_then(|i| KEY_NAMES.get(i))
        .copied()
        .unwrap_or(UNKNOWN)
}
