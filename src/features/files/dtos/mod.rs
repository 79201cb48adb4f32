mod activity_dto;
mod file_dto;
mod share_dto;

pub use activity_dto::*;
pub use file_dto::*;
pub use share_dto::*;
