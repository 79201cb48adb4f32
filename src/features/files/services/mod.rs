mod activity_service;
mod file_service;
mod share_service;

pub use activity_service::ActivityService;
pub use file_service::{fetch_file, FileDownload, FileService};
pub(crate) use file_service::FILE_SELECT;
pub use share_service::ShareService;
