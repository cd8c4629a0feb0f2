pub mod http_backend;
pub mod local_file;

pub use http_backend::HttpBackend;
pub use local_file::load_upload_file;
