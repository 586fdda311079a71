// Application layer - Use cases and the seams they depend on
pub mod alert_source;
pub mod broadcast_service;
pub mod render_target;
pub mod renderer;
