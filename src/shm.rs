//! POSIX shared-memory attach/detach glue (component D).
//!
//! Wraps `shm_open`/`ftruncate`/`mmap`/`munmap`/`shm_unlink` behind the
//! [`attach`], [`detach`] and [`unlink`] functions so [`crate::queue::Queue`]
//! never touches libc directly. Mirrors the open/map/close sequence of the
//! original C implementation this protocol is ported from: the file
//! descriptor used to create the mapping is closed immediately after `mmap`
//! succeeds, since the mapping itself keeps the segment alive.

use std::ffi::CString;
use std::os::unix::io::RawFd;

use libc::{
    c_void, mode_t, MAP_FAILED, MAP_SHARED, O_CREAT, O_RDWR, PROT_READ, PROT_WRITE,
};

use crate::config::ShmConfig;
use crate::error::NewQueueError;
use crate::layout::HEADER_LEN;

const SHM_MODE: mode_t = 0o666;

/// A live mapping of a POSIX shared-memory segment.
///
/// Unmaps the segment on [`Drop`]. Does not unlink the underlying shared
/// memory object — see [`unlink`] for that, a separate and explicit
/// destructive operation.
pub struct Mapping {
    base: *mut u8,
    mapped_len: usize,
    first_time: bool,
}

impl Mapping {
    /// Base address of the mapping.
    #[inline]
    #[must_use]
    pub fn base(&self) -> *mut u8 {
        self.base
    }

    /// Whether this call created a fresh, zero-filled segment.
    #[inline]
    #[must_use]
    pub fn first_time(&self) -> bool {
        self.first_time
    }
}

impl Drop for Mapping {
    fn drop(&mut self) {
        // SAFETY: `base`/`mapped_len` describe exactly the region `mmap`
        // returned in `attach`, unmapped at most once (ownership is tied to
        // this `Mapping` and it is not `Clone`).
        unsafe {
            libc::munmap(self.base.cast::<c_void>(), self.mapped_len);
        }
    }
}

/// Opens (and, if requested and absent, creates) the named POSIX shared
/// memory segment described by `config`, sizes it to
/// `HEADER_LEN + round_power_of_two(config.capacity)` bytes, and maps it
/// into this process's address space.
///
/// # Errors
///
/// See [`NewQueueError`] for the failure modes, each tied to the POSIX call
/// that produced it.
pub fn attach(config: &ShmConfig, data_capacity: u64) -> Result<Mapping, NewQueueError> {
    let name = CString::new(config.name.as_str()).map_err(|_| NewQueueError::InvalidName)?;
    let mut total_len = HEADER_LEN + data_capacity;

    // SAFETY: `name` is a valid, nul-terminated C string for the duration of
    // this call.
    let mut fd = unsafe { libc::shm_open(name.as_ptr(), O_RDWR, SHM_MODE) };
    let mut first_time = false;

    if fd == -1 {
        let err = std::io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::ENOENT) {
            return Err(NewQueueError::ShmOpen(err));
        }
        if !config.create_if_missing {
            return Err(NewQueueError::ShmNotExists);
        }
        first_time = true;
        // SAFETY: same as above.
        fd = unsafe { libc::shm_open(name.as_ptr(), O_CREAT | O_RDWR, SHM_MODE) };
        if fd == -1 {
            return Err(NewQueueError::ShmCreateFail(std::io::Error::last_os_error()));
        }
        // SAFETY: `fd` was just opened successfully above.
        let ret = unsafe { libc::ftruncate(fd, total_len as libc::off_t) };
        if ret == -1 {
            let err = std::io::Error::last_os_error();
            // SAFETY: `fd` is a valid, open descriptor we own.
            unsafe {
                libc::close(fd);
            }
            return Err(NewQueueError::ShmTruncate(err));
        }
    } else {
        // The segment already exists: per the on-disk-mask-wins policy
        // (Queue::new trusts the stored mask over a non-first-time caller's
        // capacity hint), the mapping must cover the segment's *actual*
        // size, not just the caller's hint — a smaller hint would leave the
        // queue's header-derived capacity pointing past the end of the
        // mapping.
        let mut stat: libc::stat = unsafe { std::mem::zeroed() };
        // SAFETY: `fd` is the just-opened, valid descriptor for this segment.
        let ret = unsafe { libc::fstat(fd, &mut stat) };
        if ret == -1 {
            let err = std::io::Error::last_os_error();
            // SAFETY: `fd` is a valid, open descriptor we own.
            unsafe {
                libc::close(fd);
            }
            return Err(NewQueueError::ShmOpen(err));
        }
        total_len = total_len.max(stat.st_size as u64);
    }

    // SAFETY: `fd` is a valid, open descriptor mapping at least `total_len`
    // bytes (freshly truncated above, or, for a pre-existing segment,
    // `total_len` was just widened to the segment's real on-disk size via
    // `fstat`).
    let map = unsafe {
        libc::mmap(
            std::ptr::null_mut(),
            total_len as usize,
            PROT_READ | PROT_WRITE,
            MAP_SHARED,
            fd,
            0,
        )
    };

    // SAFETY: `fd` is a valid, open descriptor we own; closing it after
    // `mmap` matches the original implementation's sequence and does not
    // invalidate the mapping.
    unsafe {
        close_fd(fd);
    }

    if map == MAP_FAILED {
        return Err(NewQueueError::Mmap(std::io::Error::last_os_error()));
    }

    Ok(Mapping {
        base: map.cast::<u8>(),
        mapped_len: total_len as usize,
        first_time,
    })
}

unsafe fn close_fd(fd: RawFd) {
    unsafe {
        libc::close(fd);
    }
}

/// Removes the named shared-memory object so no future `attach` can open it.
///
/// Existing mappings (including this process's own, if still attached)
/// remain valid until unmapped; `shm_unlink` only removes the name.
///
/// # Errors
///
/// Returns the underlying I/O error if `shm_unlink` fails.
pub fn unlink(name: &str) -> std::io::Result<()> {
    let cname = CString::new(name).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    // SAFETY: `cname` is a valid, nul-terminated C string for the duration
    // of this call.
    let ret = unsafe { libc::shm_unlink(cname.as_ptr()) };
    if ret == -1 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}
