use bitflags::bitflags;
use libc::c_int;

bitflags! {
    /// Open flags that accompany the access mode.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OFlags: c_int {
        const CREAT = libc::O_CREAT;
        const EXCL = libc::O_EXCL;
        const TRUNC = libc::O_TRUNC;
        const APPEND = libc::O_APPEND;
        const NOCTTY = libc::O_NOCTTY;
    }
}

/// Direction(s) of transfer an open file permits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccMode {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl AccMode {
    pub fn can_read(self) -> bool {
        !matches!(self, Self::WriteOnly)
    }

    pub fn can_write(self) -> bool {
        !matches!(self, Self::ReadOnly)
    }
}

/// Decoded `open` flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenFlags {
    pub accmode: AccMode,
    pub oflags: OFlags,
}

impl OpenFlags {
    pub fn new(accmode: AccMode, oflags: OFlags) -> Self {
        Self { accmode, oflags }
    }

    pub fn contains(&self, oflags: OFlags) -> bool {
        self.oflags.contains(oflags)
    }
}

impl TryFrom<c_int> for OpenFlags {
    type Error = c_int;

    /// Fails with `EINVAL` if the access mode is not one of the three recognized values
    /// or if any bit outside of [OFlags] is set.
    fn try_from(raw: c_int) -> Result<Self, Self::Error> {
        let accmode = match raw & libc::O_ACCMODE {
            libc::O_RDONLY => AccMode::ReadOnly,
            libc::O_WRONLY => AccMode::WriteOnly,
            libc::O_RDWR => AccMode::ReadWrite,
            _ => return Err(libc::EINVAL),
        };
        let oflags = OFlags::from_bits(raw & !libc::O_ACCMODE).ok_or(libc::EINVAL)?;
        Ok(Self { accmode, oflags })
    }
}

impl From<OpenFlags> for c_int {
    fn from(flags: OpenFlags) -> Self {
        let accmode = match flags.accmode {
            AccMode::ReadOnly => libc::O_RDONLY,
            AccMode::WriteOnly => libc::O_WRONLY,
            AccMode::ReadWrite => libc::O_RDWR,
        };
        accmode | flags.oflags.bits()
    }
}
