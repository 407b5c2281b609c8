pub mod reader;
pub mod uploader;

pub use reader::StatementReader;
pub use uploader::BatchUploader;
