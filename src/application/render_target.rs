// Render target trait for the dashboard renderer
use crate::domain::alert::AlertItem;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("render container '{0}' not found")]
    MissingContainer(String),

    #[error("failed to present rendered alerts: {0}")]
    Io(#[from] std::io::Error),
}

/// Write access to the element hosting the alert list.
///
/// The renderer only ever clears the container and appends to it, one
/// element per alert, so implementations need no diffing logic.
pub trait RenderTarget {
    /// Remove every rendered alert element
    fn clear(&mut self) -> Result<(), RenderError>;

    /// Append one element showing the alert's timestamp and message
    fn append(&mut self, item: &AlertItem) -> Result<(), RenderError>;

    /// Called after a full re-render; targets backed by a screen or file flush here
    fn present(&mut self) -> Result<(), RenderError> {
        Ok(())
    }
}
