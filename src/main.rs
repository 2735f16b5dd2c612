// Release builds are GUI applications without a console of their own.
#![cfg_attr(all(windows, not(debug_assertions)), windows_subsystem = "windows")]

use std::process::ExitCode;

use log::{debug, error, info, warn};

use dalimaster_runner::association::dalimaster_association;
#[cfg(windows)]
use dalimaster_runner::association::verify_association;
use dalimaster_runner::cli::RunnerArgs;
use dalimaster_runner::logging;
use dalimaster_runner::project::{find_project_file, load_import_request};
use win_high::assoc::register_file_association;
#[cfg(windows)]
use win_high::assoc::CurrentUserClasses;
use win_high::cmdline::command_line_arguments;
use win_high::console::{attach_new_console, attach_parent_console, debugger_present, ConsoleAttach};

const PROGRAM: &str = "dalimaster";

fn main() -> ExitCode {
    let args = command_line_arguments();
    let cli = match RunnerArgs::parse(PROGRAM, &args) {
        Ok(cli) => cli,
        Err(early_exit) => match early_exit.status {
            // --help
            Ok(()) => {
                attach_parent_console();
                println!("{}", early_exit.output);
                return ExitCode::SUCCESS;
            }
            Err(()) => {
                eprintln!("{}", early_exit.output);
                RunnerArgs::fallback(&args)
            }
        },
    };

    logging::init(cli.log_level);

    let console = if cli.console || debugger_present() {
        attach_new_console(|| {
            info!("Standard streams redirected to the new console");
            log::logger().flush();
        })
    } else {
        attach_parent_console()
    };
    debug!("Console: {:?}", console);
    if cli.console && console == ConsoleAttach::Unavailable {
        warn!("Debug console was requested, but could not be allocated");
    }
    debug!("Arguments: {:?}", args);

    if cli.no_register {
        info!("Skipping file association");
    } else {
        let registration = register_file_association(&dalimaster_association());
        if registration.failed_steps() > 0 {
            warn!("File association is incomplete, {} step(s) failed", registration.failed_steps());
        }
        #[cfg(windows)]
        verify_association(&registration, |ext| CurrentUserClasses.default_value(ext));
    }

    if let Some(path) = find_project_file(&cli.files) {
        match load_import_request(&path) {
            Ok(request) => info!(
                "Import {} ({} bytes) via {}#{}",
                request.path.display(),
                request.json.len(),
                request.channel,
                request.method,
            ),
            Err(why) => error!("Could not read project {}: {}", path.display(), why),
        }
    }

    ExitCode::SUCCESS
}

