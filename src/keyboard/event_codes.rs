// Event types and EV_KEY values (see [input-event-codes.h] and the [kernel docs]).
//
// [input-event-codes.h]: https://elixir.bootlin.com/linux/v6.12.6/source/include/uapi/linux/input-event-codes.h#L38
// [kernel docs]: https://www.kernel.org/doc/html/latest/input/event-codes.html
pub(crate) const EV_KEY: u16 = 0x01;

/// The `value` of an EV_KEY caused by a key being released.
pub(crate) const EV_KEY_RELEASE: i32 = 0;
/// The `value` of an EV_KEY caused by a key press.
pub(crate) const EV_KEY_PRESS: i32 = 1;
/// The `value` of an EV_KEY caused by autorepeat while a key is held down.
pub(crate) const EV_KEY_REPEAT: i32 = 2;
