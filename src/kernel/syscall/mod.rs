mod file;
pub mod meld;

pub use file::{sys_close, sys_dup2, sys_lseek, sys_open, sys_read, sys_write};
pub use meld::sys_meld;
