pub mod file_handler;
pub mod share_handler;

pub use file_handler::{
    __path_delete_file, __path_download_file, __path_get_file, __path_list_my_files,
    __path_public_files, __path_shared_with_me, __path_toggle_favorite, __path_update_file,
    __path_upload_file, delete_file, download_file, get_file, list_my_files, public_files,
    shared_with_me, toggle_favorite, update_file, upload_file,
};
pub use share_handler::{
    __path_list_grants, __path_remove_access, __path_share_file, list_grants, remove_access,
    share_file,
};

#[cfg(test)]
mod tests;
