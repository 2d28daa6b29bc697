//! Entry point for **blocks-music**.
//!
//! ```text
//! blocks-music status           print "ARTIST - SONG [MM:SS / MM:SS]" for the bar
//! blocks-music [X Y [BAR]]      open the music popup at a bar click
//! ```
//!
//! The popup needs the `widgets-gtk` feature; `status` works without it.

use barblocks::config::{config_dir, Config};
use barblocks::mpd::cli::MpcCli;
use barblocks::mpd::player::Mpc;
use log::{error, info};

/// Try to load the config from `$XDG_CONFIG_HOME/barblocks/config.json`,
/// falling back to compiled-in defaults.
fn load_config() -> Config {
    let path = config_dir().join("config.json");
    match Config::load(&path) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            cfg
        }
        Err(e) => {
            info!("no config file ({}), using defaults", e);
            Config::default()
        }
    }
}

/// Resolve the CSS stylesheet path.
#[cfg(feature = "widgets-gtk")]
fn css_path() -> std::path::PathBuf {
    config_dir().join("style.css")
}

//  Main

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = load_config();

    if args.first().map(String::as_str) == Some("status") {
        run_status(&config);
    } else {
        run_popup(&args, &config);
    }
}

/// Print the one-line status for an i3blocks-style bar.
fn run_status(config: &Config) {
    let mpc = Mpc::new(MpcCli::new(&config.mpc));
    println!("{}", mpc.name_with_status());
}

#[cfg(feature = "widgets-gtk")]
fn run_popup(args: &[String], config: &Config) {
    use barblocks::popup::LaunchArgs;
    use barblocks::widgets::window::Stylesheet;

    let launch = match LaunchArgs::parse(args) {
        Ok(a) => a,
        Err(e) => {
            error!("usage: blocks-music [status | X Y [BAR_HEIGHT]]: {}", e);
            std::process::exit(2);
        }
    };
    let style = Stylesheet::load(Some(css_path().as_path()));
    let runner = MpcCli::new(&config.mpc);

    if let Err(e) = barblocks::widgets::music::run(runner, &launch, config, &style) {
        error!("music popup failed: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "widgets-gtk"))]
fn run_popup(_args: &[String], _config: &Config) {
    error!("the music popup requires the `widgets-gtk` feature");
    std::process::exit(1);
}
