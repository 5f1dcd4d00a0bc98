//! Minimal Vulkan viewer
//!
//! Brings up the window, the GPU context, and the swap chain, then runs the
//! event loop until the window closes. Reads `prism.toml` from the working
//! directory when present; otherwise runs with defaults.

use std::env;
use std::path::{Path, PathBuf};

use prism_engine::prelude::*;

const CONFIG_FILE: &str = "prism.toml";

/// Extend the dynamic loader search path from the Vulkan SDK install root.
///
/// A missing `VULKAN_SDK` is not an error; the system loader search path is
/// used as-is.
fn extend_loader_search_path() {
    match env::var("VULKAN_SDK") {
        Ok(sdk_root) => {
            let (var, dir): (&str, PathBuf) = if cfg!(windows) {
                ("PATH", Path::new(&sdk_root).join("Bin"))
            } else {
                ("LD_LIBRARY_PATH", Path::new(&sdk_root).join("lib"))
            };

            let mut paths = vec![dir];
            if let Some(existing) = env::var_os(var) {
                paths.extend(env::split_paths(&existing));
            }
            if let Ok(joined) = env::join_paths(paths) {
                env::set_var(var, joined);
            }
            log::info!("using Vulkan SDK at {sdk_root}");
        }
        Err(_) => {
            log::warn!("VULKAN_SDK is not set; relying on the system loader search path");
        }
    }
}

fn run() -> Result<(), AppError> {
    let config = if Path::new(CONFIG_FILE).exists() {
        ApplicationConfig::load_from_file(CONFIG_FILE)?
    } else {
        ApplicationConfig::default()
    };

    let mut app = Application::new(config)?;
    app.run()
}

fn main() {
    prism_engine::foundation::logging::init();
    extend_loader_search_path();

    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
