pub mod access_handler;

pub use access_handler::{__path_check_access, check_access};
