pub mod host;
pub mod mem;

use crate::fcntl::OpenFlags;

pub type Result<T> = core::result::Result<T, libc::c_int>;

/// Metadata about a file.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
    pub size: u64,
}

/// Outcome of a single transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    /// Bytes actually moved. A short count is not an error.
    pub count: usize,
    /// Offset at which the next transfer should start.
    pub offset: u64,
}

/// An implementation of `Vfs` resolves paths into open [Vnode]s.
pub trait Vfs: Send + Sync {
    /// Opens the file at `path`.
    /// `mode` is only consulted when the file gets created.
    fn open(&self, path: &str, flags: OpenFlags, mode: libc::mode_t) -> Result<Box<dyn Vnode>>;
}

/// An open handle to a file.
/// The handle is released when the `Vnode` is dropped.
pub trait Vnode: Send + Sync {
    /// Reads into `buf` starting at `offset`.
    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<Transfer>;

    /// Writes `buf` starting at `offset`.
    fn write_at(&self, buf: &[u8], offset: u64) -> Result<Transfer>;

    fn stat(&self) -> Result<Stat>;

    /// Whether the offset of this file is meaningful.
    fn is_seekable(&self) -> bool {
        true
    }
}


#[macro_export]
macro_rules! test_vfs {
    ($vfs:ty) => {
        #[test]
        fn open_missing() {
            $crate::vfs::tests::open_missing::<$vfs>();
        }

        #[test]
        fn write_and_read() {
            $crate::vfs::tests::write_and_read::<$vfs>();
        }

        #[test]
        fn short_read_at_eof() {
            $crate::vfs::tests::short_read_at_eof::<$vfs>();
        }

        #[test]
        fn stat_size() {
            $crate::vfs::tests::stat_size::<$vfs>();
        }

        #[test]
        fn reopen_sees_data() {
            $crate::vfs::tests::reopen_sees_data::<$vfs>();
        }

        #[test]
        fn exclusive_create() {
            $crate::vfs::tests::exclusive_create::<$vfs>();
        }

        #[test]
        fn truncate() {
            $crate::vfs::tests::truncate::<$vfs>();
        }

        #[test]
        fn write_past_end() {
            $crate::vfs::tests::write_past_end::<$vfs>();
        }
    };
}
