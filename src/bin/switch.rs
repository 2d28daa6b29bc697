//! **blocks-switch** — move the visible workspaces one output to the right.
//!
//! Talks to i3 (or sway) over its IPC socket. Any IPC failure is logged and
//! the process exits with status 1; steps that already ran are not undone.

use barblocks::i3::wm::I3Wm;
use barblocks::rotate::rotate_workspaces;
use log::{error, info};

fn main() {
    env_logger::init();

    let wm = I3Wm::new();
    match rotate_workspaces(&wm) {
        Ok(()) => info!("workspaces rotated"),
        Err(e) => {
            error!("workspace rotation failed: {}", e);
            std::process::exit(1);
        }
    }
}
