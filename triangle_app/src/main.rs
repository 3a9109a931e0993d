//! Triangle bootstrap application
//!
//! Opens an 800x600 window, brings up a Vulkan instance (with validation
//! in debug builds) and waits until the window is closed.
//!
//! Set `TRIANGLE_CONFIG` to a `.toml` or `.ron` file to override the
//! default [`ApplicationConfig`].

use std::process;

use vk_bootstrap::foundation::logging;
use vk_bootstrap::prelude::*;

/// Environment variable naming an optional configuration file
const CONFIG_ENV: &str = "TRIANGLE_CONFIG";

fn load_config() -> Result<ApplicationConfig, BootstrapError> {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) => {
            log::info!("Loading configuration from {:?}", path);
            ApplicationConfig::load_from_file(&path)
                .map_err(|e| BootstrapError::InvalidConfig(e.to_string()))
        }
        None => Ok(ApplicationConfig::default()),
    }
}

fn run() -> Result<(), BootstrapError> {
    let config = load_config()?;
    let driver = VulkanDriver::load().map_err(BootstrapError::Loader)?;
    let mut windows = GlfwWindowSystem::init()?;

    Lifecycle::new(&config).run(&mut windows, &driver)
}

fn main() {
    logging::init(log::LevelFilter::Info);

    if let Err(e) = run() {
        eprintln!("{e}");
        process::exit(e.exit_code());
    }
}
