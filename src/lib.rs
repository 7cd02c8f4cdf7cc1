pub mod fcntl;
pub mod kernel;
pub mod vfs;
