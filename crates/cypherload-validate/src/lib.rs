pub mod patterns;
pub mod service;

pub use service::ValidationService;
