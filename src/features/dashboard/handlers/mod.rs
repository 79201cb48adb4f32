mod dashboard_handler;

pub use dashboard_handler::{__path_home, home};
