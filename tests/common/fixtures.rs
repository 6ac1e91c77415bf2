use std::sync::Arc;

use convograph::engine::Canvas;

use super::gateway::ScriptedGateway;

/// A canvas wired to a fresh scripted gateway, auto-run off.
pub fn scripted_canvas() -> (Canvas, Arc<ScriptedGateway>) {
    let gateway = Arc::new(ScriptedGateway::new());
    let canvas = Canvas::builder(gateway.clone()).build();
    (canvas, gateway)
}

/// Same, but with the chain depth bound overridden.
pub fn scripted_canvas_with_depth(bound: Option<u32>) -> (Canvas, Arc<ScriptedGateway>) {
    let gateway = Arc::new(ScriptedGateway::new());
    let canvas = Canvas::builder(gateway.clone())
        .max_chain_depth(bound)
        .build();
    (canvas, gateway)
}
