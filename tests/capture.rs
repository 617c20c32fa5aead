use keylog::{
    crypto, key_name, CaptureHandle, CaptureLoop, CaptureState, CryptoError, LogCache,
    LogTarget, RunState,
};
use std::fs;
use std::io::Write;
use std::mem;
use std::os::unix::net::UnixStream;
use std::slice;
use std::sync::mpsc;
use std::thread;

const EV_SYN: u16 = 0x00;
const EV_KEY: u16 = 0x01;
const KEY_A: u16 = 30;
const KEY_B: u16 = 48;

struct FakeKeyboard(UnixStream);

impl FakeKeyboard {
    fn new(path: &str) -> (CaptureHandle, FakeKeyboard) {
        let (reader, writer) = UnixStream::pair().unwrap();

        (CaptureHandle::new(path, reader), FakeKeyboard(writer))
    }

    fn send(&mut self, type_: u16, code: u16, value: i32) {
        let ev = libc::input_event {
            time: libc::timeval {
                tv_sec: 0,
                tv_usec: 0,
            },
            type_,
            code,
            value,
        };
        let bytes = unsafe {
            slice::from_raw_parts(
                &ev as *const libc::input_event as *const u8,
                mem::size_of::<libc::input_event>(),
            )
        };

        self.0.write_all(bytes).unwrap();
    }

    /// Press and release a key, the way a real keyboard reports it.
    fn tap(&mut self, code: u16) {
        self.send(EV_KEY, code, 1);
        self.send(EV_SYN, 0, 0);
        self.send(EV_KEY, code, 0);
        self.send(EV_SYN, 0, 0);
    }
}

/// Run wait cycles until every queued record was consumed.
fn pump(capture: &mut CaptureLoop<'_>, records: usize) {
    for _ in 0..records {
        capture.step().unwrap();
    }
}

#[test]
fn press_then_release_logs_one_entry() {
    let dir = tempfile::tempdir().unwrap();
    let run_state = RunState::new();
    let (handle, mut keyboard) = FakeKeyboard::new("event0");
    let mut capture = CaptureLoop::new(
        vec![handle],
        LogCache::with_capacity(64),
        LogTarget::plain(dir.path().join("keylog.txt")),
        &run_state,
    )
    .unwrap();

    keyboard.send(EV_KEY, KEY_B, 1);
    keyboard.send(EV_KEY, KEY_B, 0);
    pump(&mut capture, 2);

    assert_eq!(capture.cache().entries(), 1);
    assert_eq!(
        capture.cache().as_bytes(),
        format!("{}\n", key_name(KEY_B.into())).as_bytes()
    );
}

#[test]
fn plaintext_log_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keylog.txt");
    let run_state = RunState::new();
    let (handle, mut keyboard) = FakeKeyboard::new("event0");
    let mut capture = CaptureLoop::new(
        vec![handle],
        LogCache::with_capacity(64),
        LogTarget::plain(&path),
        &run_state,
    )
    .unwrap();

    keyboard.tap(KEY_A);
    keyboard.tap(KEY_B);
    pump(&mut capture, 8);
    assert_eq!(capture.cache().len(), 4);

    run_state.stop();
    capture.run().unwrap();

    assert_eq!(capture.state(), CaptureState::Terminated);
    assert_eq!(fs::read(&path).unwrap(), b"A\nB\n");
}

#[test]
fn encrypted_log_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keylog.enc");
    let run_state = RunState::new();
    let (handle, mut keyboard) = FakeKeyboard::new("event0");
    let mut capture = CaptureLoop::new(
        vec![handle],
        LogCache::with_capacity(64),
        LogTarget::encrypted(&path, "secret"),
        &run_state,
    )
    .unwrap();

    keyboard.tap(KEY_A);
    keyboard.tap(KEY_B);
    pump(&mut capture, 8);
    run_state.stop();
    capture.run().unwrap();

    let envelope = fs::read(&path).unwrap();
    assert!(envelope.starts_with(b"Salted__"));
    assert_eq!(crypto::decrypt(&envelope, "secret").unwrap(), b"A\nB\n");

    // A wrong password almost always breaks the padding; it never yields the log.
    match crypto::decrypt(&envelope, "not the secret") {
        Err(e) => assert_eq!(e, CryptoError::DecryptionFailed),
        Ok(plaintext) => assert_ne!(plaintext, b"A\nB\n"),
    }

    let output = dir.path().join("keylog.txt");
    keylog::decrypt_file(&path, &output, "secret").unwrap();
    assert_eq!(fs::read(&output).unwrap(), b"A\nB\n");
}

#[test]
fn capture_continues_after_one_keyboard_disappears() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keylog.txt");
    let run_state = RunState::new();
    let (first, mut first_keyboard) = FakeKeyboard::new("event0");
    let (second, mut second_keyboard) = FakeKeyboard::new("event1");
    let mut capture = CaptureLoop::new(
        vec![first, second],
        LogCache::with_capacity(64),
        LogTarget::plain(&path),
        &run_state,
    )
    .unwrap();

    first_keyboard.send(EV_KEY, KEY_A, 1);
    pump(&mut capture, 1);
    drop(first_keyboard);
    pump(&mut capture, 1);

    assert_eq!(capture.devices().len(), 1);
    assert_eq!(capture.devices()[0].path().to_str(), Some("event1"));

    second_keyboard.send(EV_KEY, KEY_B, 1);
    pump(&mut capture, 1);

    run_state.stop();
    capture.run().unwrap();

    assert_eq!(fs::read(&path).unwrap(), b"A\nB\n");
}

#[test]
fn losing_every_keyboard_keeps_waiting_until_stopped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keylog.txt");
    let run_state = RunState::new();
    let (handle, mut keyboard) = FakeKeyboard::new("event0");
    let mut capture = CaptureLoop::new(
        vec![handle],
        LogCache::with_capacity(64),
        LogTarget::plain(&path),
        &run_state,
    )
    .unwrap();

    keyboard.send(EV_KEY, KEY_A, 1);
    pump(&mut capture, 1);
    drop(keyboard);
    pump(&mut capture, 1);

    assert!(capture.devices().is_empty());
    assert_eq!(capture.state(), CaptureState::Running);

    run_state.stop();
    capture.run().unwrap();

    assert_eq!(fs::read(&path).unwrap(), b"A\n");
}

#[test]
fn shutdown_is_observed_between_wait_cycles() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keylog.txt");
    let run_state: &'static RunState = Box::leak(Box::new(RunState::new()));
    let (handle, mut keyboard) = FakeKeyboard::new("event0");
    let (cached_tx, cached_rx) = mpsc::channel();

    keyboard.tap(KEY_A);

    let capture = thread::spawn({
        let path = path.clone();
        move || {
            let mut capture = CaptureLoop::new(
                vec![handle],
                LogCache::with_capacity(64),
                LogTarget::plain(path),
                run_state,
            )
            .unwrap();

            pump(&mut capture, 4);
            cached_tx.send(capture.cache().entries()).unwrap();

            capture.run()
        }
    });

    assert_eq!(cached_rx.recv().unwrap(), 1);
    // The loop is either blocked in its wait or about to check the flag; a record wakes it.
    run_state.stop();
    keyboard.send(EV_SYN, 0, 0);

    capture.join().unwrap().unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "A\n");
}
