// Application state for HTTP handlers
use crate::application::broadcast_service::AlertBroadcastService;

#[derive(Clone)]
pub struct AppState {
    pub broadcast_service: AlertBroadcastService,
}
