//! Build error responder

use super::{ResponseIntent, ServeOptions};
use crate::build::BuildError;
use crate::templates::ErrorContext;

/// Turn a failed build into the diagnostic page intent
pub fn respond(error: &BuildError, options: &ServeOptions) -> ResponseIntent {
    let stack = if error.stack.trim().is_empty() {
        error.message.clone()
    } else {
        error.stack.clone()
    };

    ResponseIntent::ErrorPage(ErrorContext {
        stack,
        live_reload_path: options.live_reload_path.clone(),
        payload: error.payload.clone(),
    })
}
