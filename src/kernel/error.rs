pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Raised by the storage collaborator, passed through untouched.
    Storage(libc::c_int),

    // Lookup
    NotFound,
    Exists,

    // Arguments
    InvalidArgument,
    Fault,
    NameTooLong,
    IllegalSequence,

    // Descriptors
    TooManyFiles,
    BadDescriptor,

    // Access
    PermissionDenied,
    NotSeekable,
}

impl From<libc::c_int> for Error {
    fn from(errno: libc::c_int) -> Self {
        match errno {
            libc::ENOENT => Self::NotFound,
            libc::EEXIST => Self::Exists,
            errno => Self::Storage(errno),
        }
    }
}

impl From<Error> for libc::c_int {
    fn from(err: Error) -> Self {
        match err {
            Error::Storage(errno) => errno,
            Error::NotFound => libc::ENOENT,
            Error::Exists => libc::EEXIST,
            Error::InvalidArgument => libc::EINVAL,
            Error::Fault => libc::EFAULT,
            Error::NameTooLong => libc::ENAMETOOLONG,
            Error::IllegalSequence => libc::EILSEQ,
            Error::TooManyFiles => libc::EMFILE,
            Error::BadDescriptor => libc::EBADF,
            Error::PermissionDenied => libc::EACCES,
            Error::NotSeekable => libc::ESPIPE,
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let errno = libc::c_int::from(*self);
        write!(f, "{}", std::io::Error::from_raw_os_error(errno))
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errno_is_preserved() {
        for errno in [libc::EIO, libc::ENOENT, libc::EEXIST, libc::ENOSPC] {
            assert_eq!(libc::c_int::from(Error::from(errno)), errno);
        }
    }

    #[test]
    fn taxonomy() {
        assert_eq!(libc::c_int::from(Error::InvalidArgument), libc::EINVAL);
        assert_eq!(libc::c_int::from(Error::Fault), libc::EFAULT);
        assert_eq!(libc::c_int::from(Error::TooManyFiles), libc::EMFILE);
        assert_eq!(libc::c_int::from(Error::BadDescriptor), libc::EBADF);
        assert_eq!(libc::c_int::from(Error::PermissionDenied), libc::EACCES);
        assert_eq!(libc::c_int::from(Error::NotFound), libc::ENOENT);
        assert_eq!(libc::c_int::from(Error::Exists), libc::EEXIST);
    }

    #[test]
    fn lookup_errors_are_named() {
        assert_eq!(Error::from(libc::ENOENT), Error::NotFound);
        assert_eq!(Error::from(libc::EEXIST), Error::Exists);
        assert_eq!(Error::from(libc::EIO), Error::Storage(libc::EIO));
    }
}
