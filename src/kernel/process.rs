use std::sync::Arc;

use log::debug;

use crate::{
    fcntl::{AccMode, OFlags, OpenFlags},
    kernel::{
        error::Result,
        filetable::{Fd, FileTable},
        openfile::OpenFile,
    },
    vfs::Vfs,
};

/// Default maximum number of descriptors per process.
pub const OPEN_MAX: usize = 128;

pub const STDIN_FILENO: Fd = 0;
pub const STDOUT_FILENO: Fd = 1;
pub const STDERR_FILENO: Fd = 2;

/// Per-process resource limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum number of descriptors open at once.
    pub open_max: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self { open_max: OPEN_MAX }
    }
}

/// The state of a process that file syscalls act on.
///
/// Dropping a `Process` tears down its file table, releasing every file it still has open.
pub struct Process {
    files: FileTable,
    vfs: Arc<dyn Vfs>,
    limits: Limits,
}

impl Process {
    pub fn new(vfs: Arc<dyn Vfs>, limits: Limits) -> Self {
        Self {
            files: FileTable::new(limits.open_max),
            vfs,
            limits,
        }
    }

    pub fn files(&self) -> &FileTable {
        &self.files
    }

    pub fn vfs(&self) -> &dyn Vfs {
        self.vfs.as_ref()
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Opens the console at `path` as the standard descriptors:
    /// read-only for input, write-only for output and error.
    pub fn open_stdio(&self, path: &str) -> Result<()> {
        let stdio = [
            (STDIN_FILENO, AccMode::ReadOnly),
            (STDOUT_FILENO, AccMode::WriteOnly),
            (STDERR_FILENO, AccMode::WriteOnly),
        ];
        for (fd, accmode) in stdio {
            let flags = OpenFlags::new(accmode, OFlags::empty());
            let file = OpenFile::open(self.vfs(), path, flags, 0)?;
            // Anything already sitting at a standard descriptor gets released.
            self.files.place_at(Some(file), fd)?;
        }
        debug!("attached standard descriptors to '{path}'");
        Ok(())
    }

    /// Constructs a child process that shares every open file of this one.
    pub fn fork(&self) -> Self {
        Self {
            files: self.files.fork(),
            vfs: self.vfs.clone(),
            limits: self.limits,
        }
    }
}
