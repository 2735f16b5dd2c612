use argh::{EarlyExit, FromArgs};
use log::LevelFilter;

/// Dalimaster desktop runner
#[derive(Debug, FromArgs, PartialEq)]
pub struct RunnerArgs {
    /// open a debug console window.
    #[argh(switch)]
    pub console: bool,
    /// do not register .daliproj files with this executable.
    #[argh(switch)]
    pub no_register: bool,
    /// log level: off, error, warn, info, debug or trace.
    #[argh(option, from_str_fn(parse_level), default = "LevelFilter::Info")]
    pub log_level: LevelFilter,
    /// project files to open.
    #[argh(positional, greedy)]
    pub files: Vec<String>,
}

fn parse_level(value: &str) -> Result<LevelFilter, String> {
    value
        .parse()
        .map_err(|_| format!("Unknown log level: {}", value))
}

impl RunnerArgs {
    /// Parse already decoded arguments, program path excluded.
    pub fn parse(program: &str, args: &[String]) -> Result<Self, EarlyExit> {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        Self::from_args(&[program], &args)
    }

    /// Options could not be parsed: keep defaults, and treat every argument as a file, the way
    /// the shell would pass them.
    pub fn fallback(args: &[String]) -> Self {
        RunnerArgs {
            console: false,
            no_register: false,
            log_level: LevelFilter::Info,
            files: args.to_vec(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn args(args: &[&str]) -> Vec<String> {
        args.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn test_defaults() {
        let parsed = RunnerArgs::parse("dalimaster", &[]).unwrap();
        assert_eq!(parsed, RunnerArgs::fallback(&[]));
    }

    #[test]
    fn test_shell_open() {
        let parsed = RunnerArgs::parse("dalimaster", &args(&[r"C:\My Projects\hall.daliproj"])).unwrap();
        assert_eq!(parsed.files, vec![r"C:\My Projects\hall.daliproj"]);
        assert!(!parsed.console);
        assert!(!parsed.no_register);
    }

    #[test]
    fn test_options() {
        let parsed = RunnerArgs::parse(
            "dalimaster",
            &args(&["--console", "--no-register", "--log-level", "debug", "a.daliproj"]),
        )
        .unwrap();
        assert!(parsed.console);
        assert!(parsed.no_register);
        assert_eq!(parsed.log_level, LevelFilter::Debug);
        assert_eq!(parsed.files, vec!["a.daliproj"]);
    }

    #[test]
    fn test_bad_level() {
        let early_exit = RunnerArgs::parse("dalimaster", &args(&["--log-level", "loud"])).unwrap_err();
        assert!(early_exit.status.is_err());
    }

    #[test]
    fn test_help() {
        let early_exit = RunnerArgs::parse("dalimaster", &args(&["--help"])).unwrap_err();
        assert!(early_exit.status.is_ok());
        assert!(early_exit.output.contains("--no-register"));
    }

    #[test]
    fn test_fallback_keeps_arguments() {
        let raw = args(&["--unknown", "b.daliproj"]);
        assert!(RunnerArgs::parse("dalimaster", &raw).is_err());
        assert_eq!(RunnerArgs::fallback(&raw).files, raw);
    }
}
