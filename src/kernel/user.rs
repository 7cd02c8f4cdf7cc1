use std::ffi::CStr;

use crate::kernel::error::{Error, Result};

/// Longest path accepted from user space, terminator included.
pub const PATH_MAX: usize = 1024;

/// A pointer into user memory.
///
/// The mapped region the pointer refers to is modelled by a byte slice: anything past its end
/// is unmapped, so reading past it faults.
#[derive(Debug, Clone, Copy)]
pub struct UserPtr<'a> {
    mem: Option<&'a [u8]>,
}

impl<'a> UserPtr<'a> {
    pub const NULL: Self = Self { mem: None };

    pub fn new(mem: &'a [u8]) -> Self {
        Self { mem: Some(mem) }
    }

    pub fn is_null(&self) -> bool {
        self.mem.is_none()
    }

    /// Copies a NUL-terminated string of at most `max` bytes, terminator included.
    ///
    /// Fails with:
    /// - [Error::Fault] if the pointer is null or the string runs into unmapped memory
    /// - [Error::NameTooLong] if no terminator is found within `max` bytes
    /// - [Error::IllegalSequence] if the string is not valid UTF-8
    pub fn copyinstr(&self, max: usize) -> Result<String> {
        let mem = self.mem.ok_or(Error::Fault)?;
        let window = &mem[..mem.len().min(max)];
        let len = match window.iter().position(|&b| b == 0) {
            Some(len) => len,
            None if mem.len() >= max => return Err(Error::NameTooLong),
            None => return Err(Error::Fault),
        };
        let s = std::str::from_utf8(&window[..len]).map_err(|_| Error::IllegalSequence)?;
        Ok(s.to_owned())
    }
}

impl<'a> From<&'a CStr> for UserPtr<'a> {
    fn from(s: &'a CStr) -> Self {
        Self::new(s.to_bytes_with_nul())
    }
}

impl<'a> From<&'a [u8]> for UserPtr<'a> {
    fn from(mem: &'a [u8]) -> Self {
        Self::new(mem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_terminated() {
        let ptr = UserPtr::from(c"some/path");
        assert_eq!(ptr.copyinstr(PATH_MAX).unwrap(), "some/path");
    }

    #[test]
    fn copy_stops_at_first_terminator() {
        let ptr = UserPtr::new(b"a\0b\0");
        assert_eq!(ptr.copyinstr(PATH_MAX).unwrap(), "a");
    }

    #[test]
    fn null_faults() {
        assert_eq!(UserPtr::NULL.copyinstr(PATH_MAX), Err(Error::Fault));
    }

    #[test]
    fn unterminated_faults() {
        let ptr = UserPtr::new(b"no terminator");
        assert_eq!(ptr.copyinstr(PATH_MAX), Err(Error::Fault));
    }

    #[test]
    fn overlong_is_rejected() {
        let long = [b'a'; 16];
        let ptr = UserPtr::new(&long);
        assert_eq!(ptr.copyinstr(8), Err(Error::NameTooLong));

        // The terminator counts against the limit.
        let ptr = UserPtr::new(b"abcdefgh\0");
        assert_eq!(ptr.copyinstr(8), Err(Error::NameTooLong));
        assert_eq!(ptr.copyinstr(9).unwrap(), "abcdefgh");
    }

    #[test]
    fn invalid_utf8() {
        let ptr = UserPtr::new(b"\xFF\xFE\0");
        assert_eq!(ptr.copyinstr(PATH_MAX), Err(Error::IllegalSequence));
    }
}
