pub mod bill_upload;
pub mod info;
