use std::sync::Arc;

use log::{debug, warn};

use crate::{
    fcntl::{AccMode, OFlags, OpenFlags},
    kernel::{
        error::{Error, Result},
        filetable::{Fd, FileTable},
        openfile::OpenFile,
        process::Process,
        user::{PATH_MAX, UserPtr},
    },
};

/// Length of the chunks meld interleaves.
pub const MELD_CHUNK: usize = 4;

/// Permissions of the file meld creates.
const MELD_MODE: libc::mode_t = 0o664;

/// Interleaves the contents of the files at `pn1` and `pn2` into a new file at `pn3`,
/// returning the size of the new file.
///
/// Chunks of [MELD_CHUNK] bytes are taken alternately from each source. A short final chunk is
/// copied as is, and once one source runs out the rest of the other is copied chunk by chunk,
/// so the new file always holds every byte of both sources.
///
/// Fails with [Error::NotFound] if a source does not exist and with [Error::Exists] if the
/// destination does, in which case no descriptors are consumed.
pub fn sys_meld(
    process: &Process,
    pn1: UserPtr<'_>,
    pn2: UserPtr<'_>,
    pn3: UserPtr<'_>,
) -> Result<u64> {
    let path1 = pn1.copyinstr(PATH_MAX)?;
    let path2 = pn2.copyinstr(PATH_MAX)?;
    let path3 = pn3.copyinstr(PATH_MAX)?;

    let vfs = process.vfs();
    let read_only = OpenFlags::new(AccMode::ReadOnly, OFlags::empty());
    let src1 = OpenFile::open(vfs, &path1, read_only, 0)?;
    let src2 = OpenFile::open(vfs, &path2, read_only, 0)?;
    let create = OpenFlags::new(AccMode::WriteOnly, OFlags::CREAT | OFlags::EXCL);
    let dst = OpenFile::open(vfs, &path3, create, MELD_MODE)?;

    let mut placed = Placed::new(process.files());
    placed.place(&src1)?;
    placed.place(&src2)?;
    placed.place(&dst)?;

    // Transfers go through the open files themselves, so a descriptor closed and reused by
    // another thread cannot redirect them.
    let total = src1.stat()?.size + src2.stat()?.size;

    let mut buf1 = [0u8; MELD_CHUNK];
    let mut buf2 = [0u8; MELD_CHUNK];
    let mut produced = 0;
    while produced < total {
        // One offset lock at a time, each released before the next transfer.
        let read1 = src1.read(&mut buf1)?;
        let read2 = src2.read(&mut buf2)?;
        if read1 == 0 && read2 == 0 {
            warn!("meld: sources ended {} bytes early", total - produced);
            break;
        }
        write_all(&dst, &buf1[..read1])?;
        write_all(&dst, &buf2[..read2])?;
        produced += (read1 + read2) as u64;
    }

    let size = dst.stat()?.size;
    drop(placed);
    debug!("meld '{path1}' + '{path2}' -> '{path3}', {size} bytes");
    Ok(size)
}

fn write_all(file: &OpenFile, mut buf: &[u8]) -> Result<()> {
    while !buf.is_empty() {
        let written = file.write(buf)?;
        if written == 0 {
            return Err(Error::Storage(libc::EIO));
        }
        buf = &buf[written..];
    }
    Ok(())
}

/// Descriptors meld placed, closed when dropped on every exit path.
struct Placed<'a> {
    files: &'a FileTable,
    placed: Vec<(Fd, Arc<OpenFile>)>,
}

impl<'a> Placed<'a> {
    fn new(files: &'a FileTable) -> Self {
        Self {
            files,
            placed: Vec::with_capacity(3),
        }
    }

    fn place(&mut self, file: &Arc<OpenFile>) -> Result<Fd> {
        let fd = self.files.place(file)?;
        self.placed.push((fd, file.clone()));
        Ok(fd)
    }
}

impl Drop for Placed<'_> {
    fn drop(&mut self) {
        for (fd, file) in self.placed.drain(..) {
            // Leave the slot alone if another thread already reused it.
            if self.files.vacate_if(fd, &file).is_none() {
                warn!("meld: descriptor {fd} no longer holds its file");
            }
        }
    }
}
