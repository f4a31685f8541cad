// fn-switcher CLI
// Daemon that switches the macOS input source with the Fn key

#![cfg_attr(not(target_os = "macos"), allow(dead_code))]

use std::path::PathBuf;

use clap::Parser;

use fn_switcher_core::{parse_layout_list, ConfigLayer};

#[cfg(target_os = "macos")]
use fn_switcher_core::{
    run_event_tap, ConfigError, ConfigFile, ConfigResolver, EffectiveConfig,
    InputSourceProvider, Layout, SwitcherEngine, TisInputSource, Trigger,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const COMMIT: Option<&str> = option_env!("FN_SWITCHER_COMMIT");
const BUILD_DATE: Option<&str> = option_env!("FN_SWITCHER_BUILD_DATE");

/// Fast Fn key input source switcher for macOS
#[derive(Parser, Debug)]
#[command(name = "fn-switcher")]
#[command(disable_version_flag = true)]
#[command(
    about = "Fast Fn key input source switcher for macOS",
    after_help = "Configuration layers, highest priority first: CLI flags, \
                  FN_SWITCHER_LAYOUTS / FN_SWITCHER_CYCLE / FN_SWITCHER_SHORTCUT, \
                  ~/.config/fn-switcher/config.toml, auto-detected layouts in MRU mode.\n\
                  Requires Accessibility permissions in System Settings."
)]
struct Args {
    /// Comma-separated layouts to switch between, as short names
    /// without the com.apple.keylayout. prefix (default: all selectable)
    #[arg(long, value_name = "LIST")]
    layouts: Option<String>,

    /// Cycle through layouts in order instead of MRU switching
    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    cycle: Option<bool>,

    /// Additional trigger besides Fn (supported: "shift+option")
    #[arg(long, value_name = "KEY")]
    shortcut: Option<String>,

    /// Config file (default: ~/.config/fn-switcher/config.toml)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// List available keyboard layouts and exit
    #[arg(long)]
    list: bool,

    /// Print the current input source and exit
    #[arg(long)]
    get: bool,

    /// Select an input source by id and exit
    #[arg(long, value_name = "SOURCE_ID")]
    set: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Show version
    #[arg(short = 'V', long)]
    version: bool,
}

impl Args {
    /// Layer holding only the flags that were passed explicitly
    fn cli_layer(&self) -> ConfigLayer {
        ConfigLayer {
            layouts: self.layouts.as_deref().map(parse_layout_list),
            cycle: self.cycle,
            shortcut: self.shortcut.clone(),
        }
    }
}

fn version_text() -> String {
    let mut text = format!("fn-switcher v{}", VERSION);
    if let Some(commit) = COMMIT {
        text.push_str(&format!("\ncommit: {}", commit));
    }
    if let Some(date) = BUILD_DATE {
        text.push_str(&format!("\nbuilt:  {}", date));
    }
    text
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

/// Main application state
#[cfg(target_os = "macos")]
struct Application {
    args: Args,
    config_path: Option<PathBuf>,
    provider: TisInputSource,
}

#[cfg(target_os = "macos")]
impl Application {
    fn new(args: Args) -> Self {
        let config_path = args.config.clone().or_else(ConfigFile::default_path);
        Self {
            args,
            config_path,
            provider: TisInputSource::new(),
        }
    }

    fn list_layouts(&self) -> Result<(), Box<dyn std::error::Error>> {
        for layout in self.provider.selectable_layouts()? {
            println!("{}", layout);
        }
        Ok(())
    }

    fn print_current(&self) -> Result<(), Box<dyn std::error::Error>> {
        println!("{}", self.provider.current_layout()?);
        Ok(())
    }

    fn select(&self, id: &str) -> Result<(), Box<dyn std::error::Error>> {
        self.provider.select_layout(&Layout::new(id))?;
        Ok(())
    }

    fn resolver(&self) -> ConfigResolver {
        let resolver = ConfigResolver::new()
            .with_cli(self.args.cli_layer())
            .with_env(ConfigLayer::from_env());

        let Some(path) = self.config_path.as_ref() else {
            log::warn!("{}", ConfigError::NoHomeDir);
            return resolver.with_invalid_file();
        };
        match ConfigFile::load(path) {
            Ok(file) => resolver.with_file(file.as_ref()),
            Err(e) => {
                log::warn!("{}", e);
                resolver.with_invalid_file()
            }
        }
    }

    fn write_default_file(&self, config: &EffectiveConfig) {
        let Some(path) = self.config_path.as_ref() else {
            return;
        };
        match config.to_file().write(path) {
            Ok(()) => println!("Config created: {}", path.display()),
            Err(e) => log::warn!("Could not create config: {}", e),
        }
    }

    fn print_banner(&self, config: &EffectiveConfig) {
        let mut header = format!("fn-switcher v{}", VERSION);
        if let Some(commit) = COMMIT {
            header.push_str(&format!(" ({})", commit));
        }
        if let Some(date) = BUILD_DATE {
            header.push_str(&format!(" built {}", date));
        }
        println!("{} started", header);

        if let Some(path) = self.config_path.as_ref().filter(|_| config.file_loaded()) {
            println!("Config: {}", path.display());
        }
        println!("Mode: {}", config.mode);
        let shift_option = config.is_enabled(Trigger::ShiftOption);
        if shift_option {
            println!("Shortcut: {}", Trigger::ShiftOption);
        } else {
            println!("Shortcut: Fn only");
        }
        println!("Layouts: {}", config.layouts.chain());
        match self.provider.current_layout() {
            Ok(current) => println!("Current: {}", current),
            Err(e) => println!("Current: unknown ({})", e),
        }
        if shift_option {
            println!("Press Fn or Shift+Option to switch. Ctrl+C to exit.");
        } else {
            println!("Press Fn to switch. Ctrl+C to exit.");
        }
    }

    /// Resolve configuration and run the switcher until interrupted
    fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        let config = match self.resolver().resolve(&self.provider) {
            Ok(config) => config,
            Err(ConfigError::TooFew { available, .. }) => {
                eprintln!("Error: need at least 2 keyboard layouts to switch between.");
                eprintln!("Available layouts:");
                for layout in &available {
                    eprintln!("  {}", layout);
                }
                std::process::exit(1);
            }
            Err(e) => return Err(e.into()),
        };

        if config.should_write_default_file() {
            self.write_default_file(&config);
        }

        self.print_banner(&config);

        let engine = SwitcherEngine::new(&config, self.provider);
        install_signal_handler();
        run_event_tap(move |flags| engine.handle_snapshot(flags))?;
        Ok(())
    }
}

/// Exit cleanly on SIGINT / SIGTERM while the run loop owns the main thread
#[cfg(target_os = "macos")]
fn install_signal_handler() {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    match Signals::new([SIGINT, SIGTERM]) {
        Ok(mut signals) => {
            std::thread::spawn(move || {
                if let Some(signal) = signals.forever().next() {
                    log::info!("Received signal {}, shutting down", signal);
                    std::process::exit(0);
                }
            });
        }
        Err(e) => log::warn!("Could not install signal handler: {}", e),
    }
}

#[cfg(target_os = "macos")]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.version {
        println!("{}", version_text());
        return Ok(());
    }

    init_logging(args.verbose);

    let app = Application::new(args);
    if app.args.list {
        return app.list_layouts();
    }
    if app.args.get {
        return app.print_current();
    }
    if let Some(id) = app.args.set.as_deref() {
        return app.select(id);
    }

    app.run()
}

// Input sources and the event tap exist only on macOS
#[cfg(not(target_os = "macos"))]
fn main() {
    let args = Args::parse();
    if args.version {
        println!("{}", version_text());
        return;
    }
    init_logging(args.verbose);
    log::error!("fn-switcher only runs on macOS");
    std::process::exit(1);
}
