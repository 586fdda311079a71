// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod dom;
pub mod eve_tailer;
pub mod http_source;
pub mod push_channel;
pub mod wire;
