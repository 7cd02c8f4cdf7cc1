use log::{debug, trace};

use crate::{
    fcntl::OpenFlags,
    kernel::{
        error::{Error, Result},
        filetable::Fd,
        openfile::OpenFile,
        process::Process,
        user::{PATH_MAX, UserPtr},
    },
};

/// Opens the file at `upath`, returning its descriptor.
pub fn sys_open(
    process: &Process,
    upath: UserPtr<'_>,
    flags: libc::c_int,
    mode: libc::mode_t,
) -> Result<Fd> {
    let flags = OpenFlags::try_from(flags).map_err(|_| Error::InvalidArgument)?;
    let path = upath.copyinstr(PATH_MAX)?;

    let file = OpenFile::open(process.vfs(), &path, flags, mode)?;
    // If placing fails, `file` is released on return.
    let fd = process.files().place(&file)?;
    debug!("open '{path}' -> {fd}");
    Ok(fd)
}

/// Reads up to `size` bytes into `buf` at the current offset of `fd`.
/// Returns the number of bytes read, 0 at end-of-file.
pub fn sys_read(process: &Process, fd: Fd, buf: &mut [u8], size: usize) -> Result<usize> {
    let file = process.files().get(fd)?;
    let buf = buf.get_mut(..size).ok_or(Error::Fault)?;
    let count = file.read(buf)?;
    process.files().put(fd, file);
    trace!("read {fd}: {count} of {size} bytes");
    Ok(count)
}

/// Writes up to `size` bytes from `buf` at the current offset of `fd`.
/// Returns the number of bytes written.
pub fn sys_write(process: &Process, fd: Fd, buf: &[u8], size: usize) -> Result<usize> {
    let file = process.files().get(fd)?;
    let buf = buf.get(..size).ok_or(Error::Fault)?;
    let count = file.write(buf)?;
    process.files().put(fd, file);
    trace!("write {fd}: {count} of {size} bytes");
    Ok(count)
}

/// Closes `fd`.
pub fn sys_close(process: &Process, fd: Fd) -> Result<()> {
    let prev = process.files().place_at(None, fd)?;
    let file = prev.ok_or(Error::NotFound)?;
    debug!("close {fd}");
    // Releases the file if no other descriptor refers to it.
    drop(file);
    Ok(())
}

/// Moves the offset of `fd`, returning the new offset.
pub fn sys_lseek(
    process: &Process,
    fd: Fd,
    pos: libc::off_t,
    whence: libc::c_int,
) -> Result<libc::off_t> {
    let file = process.files().get(fd)?;
    let offset = file.seek(pos.into(), whence)?;
    process.files().put(fd, file);
    libc::off_t::try_from(offset).map_err(|_| Error::InvalidArgument)
}

/// Makes `newfd` refer to the same open file as `oldfd`, closing whatever `newfd` held.
pub fn sys_dup2(process: &Process, oldfd: Fd, newfd: Fd) -> Result<Fd> {
    let files = process.files();
    let file = files.get(oldfd)?;
    if !(0..files.max() as Fd).contains(&newfd) {
        return Err(Error::BadDescriptor);
    }
    if oldfd == newfd {
        return Ok(newfd);
    }

    let prev = files.place_at(Some(file.file().clone()), newfd)?;
    files.put(oldfd, file);
    drop(prev);
    debug!("dup2 {oldfd} -> {newfd}");
    Ok(newfd)
}
