use crate::services::TransformService;
use imgflux_core::Config;

/// Shared application state handed to every handler
pub struct AppState {
    pub config: Config,
    pub transforms: TransformService,
}
