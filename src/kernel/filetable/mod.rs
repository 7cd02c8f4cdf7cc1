
use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use bitvec::prelude::*;
use log::{debug, trace};

use crate::kernel::{
    error::{Error, Result},
    openfile::{FileRef, OpenFile},
};

/// A small integer naming an open file within one process.
pub type Fd = libc::c_int;

/// Tracks the files a process has open.
///
/// Every slot holds its own reference to an [OpenFile], and the same file may sit in several
/// slots of this or other tables.
pub struct FileTable {
    slots: Mutex<Slots>,
    max: usize,
}

struct Slots {
    files: BTreeMap<usize, Arc<OpenFile>>,
    /// Which descriptor numbers are taken.
    used: BitBox<u64>,
}

impl Slots {
    fn new(max: usize) -> Self {
        Self {
            files: BTreeMap::new(),
            used: bitbox![u64, Lsb0; 0; max],
        }
    }

    fn insert(&mut self, index: usize, file: Arc<OpenFile>) -> Option<Arc<OpenFile>> {
        self.used.set(index, true);
        self.files.insert(index, file)
    }

    fn remove(&mut self, index: usize) -> Option<Arc<OpenFile>> {
        self.used.set(index, false);
        self.files.remove(&index)
    }
}

impl FileTable {
    /// Constructs an empty table with room for `max` descriptors.
    ///
    /// # Panics
    /// Panics if `max` does not fit in a descriptor.
    pub fn new(max: usize) -> Self {
        assert!(
            Fd::try_from(max).is_ok(),
            "'max' {max} does not fit in a descriptor"
        );
        Self {
            slots: Mutex::new(Slots::new(max)),
            max,
        }
    }

    /// Maximum number of descriptors the table can hold.
    pub fn max(&self) -> usize {
        self.max
    }

    /// Number of descriptors that are open.
    pub fn len(&self) -> usize {
        self.slots().files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lists open descriptors in ascending order.
    pub fn fds(&self) -> Vec<Fd> {
        self.slots().files.keys().map(|&i| i as Fd).collect()
    }

    /// Places `file` into the lowest free slot, returning its descriptor.
    ///
    /// On success the table retains its own reference to `file`. On failure the table holds
    /// nothing, and the caller's reference is left as it was.
    pub fn place(&self, file: &Arc<OpenFile>) -> Result<Fd> {
        let mut slots = self.slots();
        let index = slots.used.first_zero().ok_or(Error::TooManyFiles)?;
        slots.insert(index, file.clone());
        trace!("placed open file at descriptor {index}");
        Ok(index as Fd)
    }

    /// Returns the file at `fd`, pinned until the returned reference is handed to
    /// [FileTable::put] or dropped.
    pub fn get(&self, fd: Fd) -> Result<FileRef> {
        let index = self.index(fd)?;
        let slots = self.slots();
        let file = slots.files.get(&index).ok_or(Error::BadDescriptor)?;
        Ok(FileRef::new(file.clone()))
    }

    /// Ends the use of a file obtained through [FileTable::get].
    pub fn put(&self, fd: Fd, file: FileRef) {
        trace!("put descriptor {fd}");
        drop(file);
    }

    /// Replaces the contents of the slot at `fd` with `file`, returning what was there.
    ///
    /// Passing `None` vacates the slot. The returned reference is handed over to the caller,
    /// so it gets released when the caller drops it.
    pub fn place_at(&self, file: Option<Arc<OpenFile>>, fd: Fd) -> Result<Option<Arc<OpenFile>>> {
        let index = self.index(fd)?;
        let mut slots = self.slots();
        let prev = match file {
            Some(file) => slots.insert(index, file),
            None => slots.remove(index),
        };
        trace!("replaced descriptor {fd}");
        Ok(prev)
    }

    /// Vacates the slot at `fd` only if it still holds `file`.
    pub(crate) fn vacate_if(&self, fd: Fd, file: &Arc<OpenFile>) -> Option<Arc<OpenFile>> {
        let index = self.index(fd).ok()?;
        let mut slots = self.slots();
        match slots.files.get(&index) {
            Some(held) if Arc::ptr_eq(held, file) => slots.remove(index),
            _ => None,
        }
    }

    /// Checks that `fd` is in range and open.
    pub fn okfd(&self, fd: Fd) -> bool {
        match self.index(fd) {
            Ok(index) => self.slots().used[index],
            Err(_) => false,
        }
    }

    /// Constructs a table for a child process.
    /// The child gets its own slots that share every open file with this table.
    pub fn fork(&self) -> Self {
        let slots = self.slots();
        let mut child = Slots::new(self.max);
        for (&index, file) in &slots.files {
            child.insert(index, file.clone());
        }
        Self {
            slots: Mutex::new(child),
            max: self.max,
        }
    }

    fn index(&self, fd: Fd) -> Result<usize> {
        usize::try_from(fd)
            .ok()
            .filter(|&index| index < self.max)
            .ok_or(Error::BadDescriptor)
    }

    fn slots(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for FileTable {
    fn drop(&mut self) {
        let slots = self.slots.get_mut().unwrap_or_else(PoisonError::into_inner);
        debug!("tearing down file table, {} open", slots.files.len());
        // Every surviving reference is released along with the slots.
    }
}
