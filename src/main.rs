/*
 * Shoal Viewer
 *
 * Interactive window for the shoal flocking core. A school of fish swims
 * through a bounded volume around a few reef columns while the controls
 * panel tunes the flocking weights, flock size and physics rate live.
 *
 * Usage: shoal [config.json]
 * Set RUST_LOG (e.g. RUST_LOG=shoal=debug) to see step statistics.
 */

mod app;
mod camera;
mod input;
mod renderer;
mod ui;

const DEFAULT_LOG_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn,naga=warn";

fn main() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(DEFAULT_LOG_FILTER))
        .format_timestamp_secs()
        .try_init();

    nannou::app(app::model).update(app::update).run();
}
