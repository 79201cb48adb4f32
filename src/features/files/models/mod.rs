mod activity;
mod file;
mod grant;

pub use activity::{FileAction, FileActivity, FileActivityWithUser};
pub use file::{File, FileWithMeta};
pub use grant::GrantWithUser;
