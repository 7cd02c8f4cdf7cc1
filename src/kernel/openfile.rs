use std::{
    ops::Deref,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
};

use log::{debug, trace};

use crate::{
    fcntl::{AccMode, OFlags, OpenFlags},
    kernel::error::{Error, Result},
    vfs::{Stat, Vfs, Vnode},
};

/// An open file, shared by every descriptor that refers to it.
///
/// Retaining a reference is cloning the `Arc`, and dropping the last clone releases the vnode.
pub struct OpenFile {
    vnode: Box<dyn Vnode>,
    flags: OpenFlags,
    offset: Mutex<u64>,
    in_use: AtomicUsize,
}

impl OpenFile {
    /// Opens the file at `path`.
    /// The offset starts at the end of the file if `flags` ask to append, at 0 otherwise.
    pub fn open(
        vfs: &dyn Vfs,
        path: &str,
        flags: OpenFlags,
        mode: libc::mode_t,
    ) -> Result<Arc<Self>> {
        let vnode = vfs.open(path, flags, mode)?;
        let offset = if flags.contains(OFlags::APPEND) {
            vnode.stat()?.size
        } else {
            0
        };
        trace!("opened '{path}' with {flags:?} at offset {offset}");
        Ok(Arc::new(Self::new(vnode, flags, offset)))
    }

    /// Wraps an already open vnode.
    pub fn new(vnode: Box<dyn Vnode>, flags: OpenFlags, offset: u64) -> Self {
        Self {
            vnode,
            flags,
            offset: Mutex::new(offset),
            in_use: AtomicUsize::new(0),
        }
    }

    pub fn accmode(&self) -> AccMode {
        self.flags.accmode
    }

    pub fn flags(&self) -> OpenFlags {
        self.flags
    }

    pub fn is_seekable(&self) -> bool {
        self.vnode.is_seekable()
    }

    pub fn stat(&self) -> Result<Stat> {
        Ok(self.vnode.stat()?)
    }

    /// Number of I/O operations currently in flight on this file.
    pub fn in_use(&self) -> usize {
        self.in_use.load(Ordering::Acquire)
    }

    /// Locks the seek position.
    pub fn lock_offset(&self) -> MutexGuard<'_, u64> {
        self.offset.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reads at the current offset, advancing it by the number of bytes read.
    pub fn read(&self, buf: &mut [u8]) -> Result<usize> {
        if !self.accmode().can_read() {
            return Err(Error::PermissionDenied);
        }
        let mut offset = self.lock_offset();
        let transfer = self.vnode.read_at(buf, *offset)?;
        *offset = transfer.offset;
        Ok(transfer.count)
    }

    /// Writes at the current offset, advancing it by the number of bytes written.
    pub fn write(&self, buf: &[u8]) -> Result<usize> {
        if !self.accmode().can_write() {
            return Err(Error::PermissionDenied);
        }
        let mut offset = self.lock_offset();
        let transfer = self.vnode.write_at(buf, *offset)?;
        *offset = transfer.offset;
        Ok(transfer.count)
    }

    /// Moves the offset according to `whence`, returning the new offset.
    pub fn seek(&self, pos: i64, whence: libc::c_int) -> Result<u64> {
        if !self.is_seekable() {
            return Err(Error::NotSeekable);
        }

        let mut offset = self.lock_offset();
        let base = match whence {
            libc::SEEK_SET => 0,
            libc::SEEK_CUR => *offset,
            libc::SEEK_END => self.vnode.stat()?.size,
            _ => return Err(Error::InvalidArgument),
        };
        let new = base
            .checked_add_signed(pos)
            .ok_or(Error::InvalidArgument)?;
        if i64::try_from(new).is_err() {
            return Err(Error::InvalidArgument);
        }
        *offset = new;
        Ok(new)
    }
}

impl Drop for OpenFile {
    fn drop(&mut self) {
        debug!("releasing open file {:?}", self.flags);
    }
}

/// A pinned reference to an [OpenFile].
///
/// While a `FileRef` exists the file is counted as in use and cannot be released, even if every
/// descriptor that refers to it gets closed.
pub struct FileRef {
    file: Arc<OpenFile>,
}

impl FileRef {
    pub(crate) fn new(file: Arc<OpenFile>) -> Self {
        file.in_use.fetch_add(1, Ordering::AcqRel);
        Self { file }
    }

    pub fn file(&self) -> &Arc<OpenFile> {
        &self.file
    }
}

impl Deref for FileRef {
    type Target = OpenFile;

    fn deref(&self) -> &Self::Target {
        &self.file
    }
}

impl Drop for FileRef {
    fn drop(&mut self) {
        self.file.in_use.fetch_sub(1, Ordering::AcqRel);
    }
}
