pub mod accumulator;
pub mod chat_stream;
pub mod config;
pub mod constants;
pub mod message;
pub mod normalize;
pub mod session;
pub mod store;
pub mod stream_decoder;
