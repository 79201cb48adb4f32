mod access_dto;

pub use access_dto::*;
