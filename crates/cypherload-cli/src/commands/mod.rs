pub mod upload;
pub mod validate;
