use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError, RwLock,
        atomic::{AtomicI32, AtomicUsize, Ordering},
    },
};

use crate::{
    fcntl::{OFlags, OpenFlags},
    vfs::{Result, Stat, Transfer, Vfs, Vnode},
};

/// Largest size a file held by [MemVfs] may grow to.
pub const MAX_FILE_SIZE: u64 = 1 << 30;

/// A `Vfs` that keeps every file in memory.
///
/// Tracks how many handles are open so that callers can verify each one is released exactly
/// once, and can inject errors into transfers on a given file.
#[derive(Default)]
pub struct MemVfs {
    files: Mutex<HashMap<String, Arc<MemFile>>>,
    live: Arc<AtomicUsize>,
    opens: AtomicUsize,
}

struct MemFile {
    data: RwLock<Vec<u8>>,
    seekable: bool,
    /// Errno returned by every transfer, 0 if none.
    fault: AtomicI32,
}

impl MemFile {
    fn new(data: Vec<u8>, seekable: bool) -> Self {
        Self {
            data: RwLock::new(data),
            seekable,
            fault: AtomicI32::new(0),
        }
    }

    fn check_fault(&self) -> Result<()> {
        match self.fault.load(Ordering::Acquire) {
            0 => Ok(()),
            errno => Err(errno),
        }
    }
}

impl MemVfs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates or replaces a regular file at `path`.
    pub fn insert(&self, path: &str, contents: &[u8]) {
        let file = MemFile::new(contents.to_vec(), true);
        self.files().insert(path.to_owned(), Arc::new(file));
    }

    /// Creates a non-seekable device at `path`.
    /// Reads from it hit end-of-file immediately, writes are appended to its contents.
    pub fn insert_device(&self, path: &str) {
        let file = MemFile::new(Vec::new(), false);
        self.files().insert(path.to_owned(), Arc::new(file));
    }

    pub fn exists(&self, path: &str) -> bool {
        self.files().contains_key(path)
    }

    pub fn contents(&self, path: &str) -> Option<Vec<u8>> {
        let file = self.files().get(path).cloned()?;
        let data = file.data.read().unwrap_or_else(PoisonError::into_inner);
        Some(data.clone())
    }

    /// Makes every subsequent transfer on `path` fail with `errno`.
    /// An `errno` of 0 clears the fault.
    pub fn inject_fault(&self, path: &str, errno: libc::c_int) {
        if let Some(file) = self.files().get(path) {
            file.fault.store(errno, Ordering::Release);
        }
    }

    /// Number of handles that are currently open.
    pub fn live_handles(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    /// Number of successful opens so far.
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::Acquire)
    }

    fn files(&self) -> MutexGuard<'_, HashMap<String, Arc<MemFile>>> {
        self.files.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Vfs for MemVfs {
    fn open(&self, path: &str, flags: OpenFlags, _mode: libc::mode_t) -> Result<Box<dyn Vnode>> {
        if path.is_empty() {
            return Err(libc::ENOENT);
        }

        let file = {
            let mut files = self.files();
            match files.get(path) {
                Some(_) if flags.contains(OFlags::CREAT | OFlags::EXCL) => {
                    return Err(libc::EEXIST);
                }
                Some(file) => file.clone(),
                None if flags.contains(OFlags::CREAT) => {
                    let file = Arc::new(MemFile::new(Vec::new(), true));
                    files.insert(path.to_owned(), file.clone());
                    file
                }
                None => return Err(libc::ENOENT),
            }
        };

        if flags.contains(OFlags::TRUNC) && file.seekable {
            file.data
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .clear();
        }

        self.live.fetch_add(1, Ordering::AcqRel);
        self.opens.fetch_add(1, Ordering::AcqRel);
        Ok(Box::new(MemVnode {
            file,
            live: self.live.clone(),
        }))
    }
}

struct MemVnode {
    file: Arc<MemFile>,
    live: Arc<AtomicUsize>,
}

impl Vnode for MemVnode {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<Transfer> {
        self.file.check_fault()?;
        if !self.file.seekable {
            return Ok(Transfer { count: 0, offset });
        }

        let data = self.file.data.read().unwrap_or_else(PoisonError::into_inner);
        let start = usize::try_from(offset).map_err(|_| libc::EFBIG)?;
        if start >= data.len() {
            return Ok(Transfer { count: 0, offset });
        }

        let count = buf.len().min(data.len() - start);
        buf[..count].copy_from_slice(&data[start..start + count]);
        Ok(Transfer {
            count,
            offset: offset + count as u64,
        })
    }

    fn write_at(&self, buf: &[u8], offset: u64) -> Result<Transfer> {
        self.file.check_fault()?;
        let mut data = self
            .file
            .data
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if !self.file.seekable {
            data.extend_from_slice(buf);
            return Ok(Transfer {
                count: buf.len(),
                offset,
            });
        }

        let start = usize::try_from(offset).map_err(|_| libc::EFBIG)?;
        let end = start.checked_add(buf.len()).ok_or(libc::EFBIG)?;
        if end as u64 > MAX_FILE_SIZE {
            return Err(libc::EFBIG);
        }
        if end > data.len() {
            data.resize(end, 0);
        }
        data[start..end].copy_from_slice(buf);
        Ok(Transfer {
            count: buf.len(),
            offset: end as u64,
        })
    }

    fn stat(&self) -> Result<Stat> {
        let data = self.file.data.read().unwrap_or_else(PoisonError::into_inner);
        Ok(Stat {
            size: data.len() as u64,
        })
    }

    fn is_seekable(&self) -> bool {
        self.file.seekable
    }
}

impl Drop for MemVnode {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::AcqRel);
    }
}
