use std::{
    fs::{File, OpenOptions},
    io,
    os::unix::fs::{FileExt, OpenOptionsExt},
    path::{Component, Path, PathBuf},
};

use libc::EIO;

use crate::{
    fcntl::{OFlags, OpenFlags},
    vfs::{Result, Stat, Transfer, Vfs, Vnode},
};

/// A `Vfs` that resolves paths inside a directory of the host filesystem.
pub struct HostVfs {
    root: PathBuf,
}

impl HostVfs {
    /// Constructs a `HostVfs` rooted at `root`.
    /// Absolute paths given to [Vfs::open] are resolved relative to `root` as well.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let mut resolved = self.root.clone();
        for component in Path::new(path).components() {
            match component {
                Component::Normal(name) => resolved.push(name),
                Component::RootDir | Component::CurDir => (),
                Component::ParentDir | Component::Prefix(_) => return Err(libc::EACCES),
            }
        }
        Ok(resolved)
    }
}

impl Vfs for HostVfs {
    fn open(&self, path: &str, flags: OpenFlags, mode: libc::mode_t) -> Result<Box<dyn Vnode>> {
        if path.is_empty() {
            return Err(libc::ENOENT);
        }
        let path = self.resolve(path)?;

        // Creation flags bypass `OpenOptions` so that they combine with any access mode.
        // Appending is tracked by the open file's offset, not by the host.
        let custom = flags.oflags & (OFlags::CREAT | OFlags::EXCL | OFlags::TRUNC);
        let file = OpenOptions::new()
            .read(flags.accmode.can_read())
            .write(flags.accmode.can_write())
            .custom_flags(custom.bits())
            .mode(mode as u32)
            .open(path)
            .into_errno()?;

        let seekable = file.metadata().into_errno()?.is_file();
        Ok(Box::new(HostVnode { file, seekable }))
    }
}

struct HostVnode {
    file: File,
    seekable: bool,
}

impl Vnode for HostVnode {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<Transfer> {
        let count = self.file.read_at(buf, offset).into_errno()?;
        Ok(Transfer {
            count,
            offset: offset + count as u64,
        })
    }

    fn write_at(&self, buf: &[u8], offset: u64) -> Result<Transfer> {
        let count = self.file.write_at(buf, offset).into_errno()?;
        Ok(Transfer {
            count,
            offset: offset + count as u64,
        })
    }

    fn stat(&self) -> Result<Stat> {
        let metadata = self.file.metadata().into_errno()?;
        Ok(Stat {
            size: metadata.len(),
        })
    }

    fn is_seekable(&self) -> bool {
        self.seekable
    }
}

trait IntoErrno {
    type T;

    fn into_errno(self) -> Result<Self::T>;
}

impl<T> IntoErrno for io::Result<T> {
    type T = T;

    fn into_errno(self) -> Result<Self::T> {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(e.raw_os_error().unwrap_or(EIO)),
        }
    }
}
