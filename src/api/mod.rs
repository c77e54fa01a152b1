pub mod models;
pub mod response;
pub mod streaming;

pub use models::ChatRequest;
pub use streaming::process_streaming_response;
