pub mod bulk_upload;
pub mod products;
pub mod template;
