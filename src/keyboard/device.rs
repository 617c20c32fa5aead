use crate::error::KeylogError;
use crate::KeylogResult;
use std::fs::{self, File};
use std::io;
use std::mem;
use std::os::fd::{AsRawFd, RawFd};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

const IOC_NRBITS: libc::c_ulong = 8;
const IOC_TYPEBITS: libc::c_ulong = 8;
const IOC_SIZEBITS: libc::c_ulong = 14;
const IOC_NRSHIFT: libc::c_ulong = 0;
const IOC_TYPESHIFT: libc::c_ulong = IOC_NRSHIFT + IOC_NRBITS;
const IOC_SIZESHIFT: libc::c_ulong = IOC_TYPESHIFT + IOC_TYPEBITS;
const IOC_DIRSHIFT: libc::c_ulong = IOC_SIZESHIFT + IOC_SIZEBITS;
const IOC_READ: libc::c_ulong = 2;

/// Read a single [`libc::input_event`] from the specified file descriptor.
///
/// Returns `Ok(None)` at end of file, which is what a closed source looks like.
pub(crate) fn read_input_event(fd: RawFd) -> io::Result<Option<libc::input_event>> {
    const EVENT_SIZE: usize = mem::size_of::<libc::input_event>();

    let mut event = mem::MaybeUninit::<libc::input_event>::uninit();

    let n = unsafe { libc::read(fd, event.as_mut_ptr() as *mut libc::c_void, EVENT_SIZE) };

    if n < 0 {
        return Err(io::Error::last_os_error());
    }

    match n as usize {
        0 => Ok(None),
        // The whole record was filled in by the read:
        EVENT_SIZE => Ok(Some(unsafe { event.assume_init() })),
        n => Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("short read: {n} of {EVENT_SIZE} bytes"),
        )),
    }
}

/// Read the name of the specified input device using the `EVIOCGNAME` ioctl.
pub(crate) fn read_name(f: &File) -> KeylogResult<String> {
    const DEVICE_NAME_MAX_LEN: usize = 256;

    let mut device_name = [0u8; DEVICE_NAME_MAX_LEN];

    let eviocgname = (IOC_READ << IOC_DIRSHIFT)
        | (('E' as libc::c_ulong) << IOC_TYPESHIFT)
        | (0x06 << IOC_NRSHIFT)
        | ((device_name.len() as libc::c_ulong) << IOC_SIZESHIFT);

    ioctl(
        f.as_raw_fd(),
        eviocgname,
        device_name.as_mut_ptr() as *mut libc::c_void,
    )?;

    let len = device_name
        .iter()
        .position(|&b| b == 0)
        .unwrap_or(device_name.len());

    Ok(String::from_utf8_lossy(&device_name[..len]).into())
}

/// List the entries of `input_dir` whose file name starts with `prefix`, in directory order.
pub(crate) fn find_event_nodes(input_dir: &Path, prefix: &str) -> KeylogResult<Vec<PathBuf>> {
    let entries = fs::read_dir(input_dir).map_err(|source| KeylogError::InputDirUnavailable {
        path: input_dir.to_path_buf(),
        source,
    })?;

    Ok(entries
        .filter_map(|entry| {
            let entry = entry.ok()?;

            entry
                .file_name()
                .as_bytes()
                .starts_with(prefix.as_bytes())
                .then(|| entry.path())
        })
        .collect())
}

fn ioctl(fd: RawFd, request: libc::c_ulong, buf: *mut libc::c_void) -> KeylogResult<()> {
    let res = unsafe { libc::ioctl(fd, request, buf) };

    if res < 0 {
        Err(io::Error::last_os_error().into())
    } else {
        Ok(())
    }
}
