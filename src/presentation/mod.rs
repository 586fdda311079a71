// Presentation layer - HTTP routes, pages and the WebSocket push endpoint
pub mod app_state;
pub mod handlers;
pub mod pages;
pub mod router;
