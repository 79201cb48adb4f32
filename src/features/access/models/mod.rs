mod file_record;
mod grant;
mod permission;
mod principal;

pub use file_record::FileRecord;
pub use grant::Grant;
pub use permission::{Operation, PermissionLevel, Visibility};
pub use principal::{Principal, UserRole};
