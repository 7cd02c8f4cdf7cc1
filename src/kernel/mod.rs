pub mod error;
pub mod filetable;
pub mod openfile;
pub mod process;
pub mod syscall;
pub mod user;

pub use error::{Error, Result};
pub use filetable::{Fd, FileTable};
pub use openfile::{FileRef, OpenFile};
pub use process::{Limits, Process};
pub use user::UserPtr;
