use log::{error, info};
use snafu::{ErrorCompat, ResultExt, Snafu};
use std::path::Path;
use support::{
    app::{AppBuilder, AppHost},
    config::AppConfig,
    sample::{SampleApp, APP_NAME},
    window::{WindowSettings, WinitWindow},
};

#[cfg(feature = "directx12")]
use support::backend::DirectX12Backend;
#[cfg(feature = "vulkan")]
use support::backend::{surface_extension_names, VulkanBackend};

const CONFIG_PATH: &str = "sample.toml";

#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("Failed to load configuration: {}", source))]
    LoadConfig { source: support::config::Error },

    #[snafu(display("Unable to create the window: {}", source))]
    CreateWindow { source: support::window::Error },

    #[snafu(display("Failed to build the app: {}", source))]
    BuildApp { source: support::app::Error },

    #[snafu(display("{}", source))]
    RunApp { source: support::app::Error },
}

fn main() {
    if let Err(code) = console::enable_colors() {
        std::process::exit(code as i32);
    }

    if let Err(error) = run() {
        report(&error);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Error> {
    let config_found = Path::new(CONFIG_PATH).exists();
    let config = AppConfig::load(CONFIG_PATH).context(LoadConfig {})?;

    let mut settings = config.window.clone();
    if settings.title.is_empty() {
        settings.title = APP_NAME.to_string();
    }
    let window = WinitWindow::new(&settings).context(CreateWindow {})?;

    let builder = config
        .logging
        .sinks()
        .into_iter()
        .fold(AppHost::build(SampleApp::new(window, config.adapter_id)), AppBuilder::log_to);

    #[cfg(feature = "vulkan")]
    let builder = builder.use_backend(VulkanBackend::new(surface_extension_names()));

    #[cfg(feature = "directx12")]
    let builder =
        builder.use_backend(DirectX12Backend::new().suppress_missing_root_signature_warning());

    let mut app = builder.build().context(BuildApp {})?;

    // Nothing is logged before the sinks are installed by `build`.
    for line in setup_summary(&settings, config_found) {
        info!("{}", line);
    }

    app.run().context(RunApp {})
}

fn setup_summary(settings: &WindowSettings, config_found: bool) -> Vec<String> {
    let config = if config_found {
        format!("Loaded configuration from '{}'", CONFIG_PATH)
    } else {
        format!("No '{}' found, using the default configuration", CONFIG_PATH)
    };

    vec![
        config,
        format!(
            "Created window '{}' ({}x{})",
            settings.title, settings.width, settings.height
        ),
    ]
}

fn format_report(error: &Error) -> String {
    let backtrace = match error {
        Error::BuildApp { source } | Error::RunApp { source } => {
            ErrorCompat::backtrace(source).map(|backtrace| format!("{:?}", backtrace))
        }
        _ => None,
    };
    let backtrace = backtrace.unwrap_or_else(|| String::from("<unavailable>"));

    format!("Unhandled exception: {}\nat: {}", error, backtrace)
}

fn report(error: &Error) {
    let report = format_report(error);
    error!("{}", report);
    eprintln!("\x1b[3;41;37m{}\x1b[0m", report);
}

#[cfg(target_os = "windows")]
mod console {
    use winapi::{
        shared::minwindef::DWORD,
        um::{
            consoleapi::{GetConsoleMode, SetConsoleMode},
            errhandlingapi::GetLastError,
            handleapi::INVALID_HANDLE_VALUE,
            processenv::GetStdHandle,
            winbase::STD_OUTPUT_HANDLE,
            wincon::ENABLE_VIRTUAL_TERMINAL_PROCESSING,
        },
    };

    /// Turns on ANSI escape handling so colored output renders in the console.
    pub fn enable_colors() -> Result<(), DWORD> {
        unsafe {
            let console = GetStdHandle(STD_OUTPUT_HANDLE);
            let mut mode: DWORD = 0;
            if console == INVALID_HANDLE_VALUE || GetConsoleMode(console, &mut mode) == 0 {
                return Err(GetLastError());
            }
            SetConsoleMode(console, mode | ENABLE_VIRTUAL_TERMINAL_PROCESSING);
        }
        Ok(())
    }
}

#[cfg(not(target_os = "windows"))]
mod console {
    pub fn enable_colors() -> Result<(), u32> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use support::app::{self, App, AppVersion};

    struct FailingApp;

    impl App for FailingApp {
        fn name(&self) -> &str {
            "Failing"
        }

        fn version(&self) -> AppVersion {
            AppVersion::new(0, 0, 1, 0)
        }

        fn on_startup(&mut self) -> app::Result<()> {
            Err(app::Error::application("device lost"))
        }
    }

    #[test]
    fn run_failures_report_message_and_trace() {
        let mut host = AppHost::build(FailingApp).build().unwrap();
        let error = host.run().context(RunApp {}).unwrap_err();

        let report = format_report(&error);
        let mut lines = report.lines();

        assert_eq!(lines.next(), Some("Unhandled exception: device lost"));
        assert!(lines.next().map_or(false, |line| line.starts_with("at: ")));
    }

    #[test]
    fn setup_failures_report_without_a_trace() {
        let error = Error::CreateWindow {
            source: support::window::Error::InitWindowSystem {
                message: String::from("no display"),
            },
        };

        assert_eq!(
            format_report(&error),
            "Unhandled exception: Unable to create the window: \
             Failed to initialize the window system: no display\nat: <unavailable>"
        );
    }

    #[test]
    fn setup_summary_names_the_config_source_and_window() {
        let settings = WindowSettings {
            title: String::from(APP_NAME),
            ..WindowSettings::default()
        };

        let found = setup_summary(&settings, true);
        assert_eq!(found[0], "Loaded configuration from 'sample.toml'");
        assert_eq!(found[1], "Created window 'My LiteFX App' (800x600)");

        let missing = setup_summary(&settings, false);
        assert_eq!(
            missing[0],
            "No 'sample.toml' found, using the default configuration"
        );
    }
}
