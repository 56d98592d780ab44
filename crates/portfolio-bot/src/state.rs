//! Application State

use std::sync::Arc;

use portfolio_core::Interpreter;

use crate::transport::Transport;

/// Shared state handed to every update task
#[derive(Clone)]
pub struct AppState {
    /// Command interpreter over the process-wide ledger
    pub interpreter: Interpreter,

    /// Where replies are delivered
    pub transport: Arc<dyn Transport>,
}
