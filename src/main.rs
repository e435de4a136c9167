//! Executable entry point

use relief_engine::{Engine, RuntimeConfig};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = RuntimeConfig::load_or_default("settings.toml")?;
    log::info!(
        "[main] starting: {}x{} field, {}x{} mesh",
        config.terrain.samples[0],
        config.terrain.samples[1],
        config.terrain.mesh_size[0],
        config.terrain.mesh_size[1]
    );

    Engine::new(config)?.run()
}
