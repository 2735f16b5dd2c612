use fern::Dispatch;
use log::LevelFilter;

/// One `RUST_LOG` entry: either `level` for everything, or `module=level`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Directive {
    pub module: Option<String>,
    pub level: LevelFilter,
}

/// Parse comma separated `RUST_LOG` value, e.g. `warn,win_high::assoc=debug`.
/// Unknown levels are reported on stderr and skipped, since logger is not configured yet.
pub fn parse_directives(value: &str) -> Vec<Directive> {
    let mut directives = Vec::new();
    for entry in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (module, level) = match entry.split_once('=') {
            Some((module, level)) => (Some(module.trim().to_string()), level.trim()),
            None => (None, entry),
        };
        match level.parse::<LevelFilter>() {
            Ok(level) => directives.push(Directive { module, level }),
            Err(_) => eprintln!("RUST_LOG: ignored unknown log level: '{}'", level),
        }
    }
    directives
}

fn apply(dispatch: Dispatch, directives: &[Directive]) -> Dispatch {
    directives.iter().fold(dispatch, |dispatch, directive| match &directive.module {
        // NOTE: dashes in crate names turn into underscores in module paths.
        Some(module) => dispatch.level_for(module.replace('-', "_"), directive.level),
        None => dispatch.level(directive.level),
    })
}

/// Build stderr dispatcher at `level`, overridden by `RUST_LOG` when set.
pub fn dispatch(level: LevelFilter) -> Dispatch {
    let dispatch = Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr());

    match std::env::var("RUST_LOG") {
        Ok(value) => apply(dispatch, &parse_directives(&value)),
        // Not an error if the env var does not exist.
        Err(std::env::VarError::NotPresent) => dispatch,
        Err(std::env::VarError::NotUnicode(value)) => {
            eprintln!("RUST_LOG: ignored invalid unicode value: '{}'", value.to_string_lossy());
            dispatch
        }
    }
}

/// Install global logger. Failure is reported on stderr and otherwise ignored.
pub fn init(level: LevelFilter) {
    if let Err(e) = dispatch(level).apply() {
        eprintln!("Initialising logging failed: {}", e);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_directives() {
        assert_eq!(
            parse_directives("error, win_high::assoc=debug,,dalimaster-runner=off"),
            vec![
                Directive { module: None, level: LevelFilter::Error },
                Directive { module: Some("win_high::assoc".to_string()), level: LevelFilter::Debug },
                Directive { module: Some("dalimaster-runner".to_string()), level: LevelFilter::Off },
            ]
        );
    }

    #[test]
    fn test_unknown_level_skipped() {
        assert_eq!(
            parse_directives("loud,win_high=TRACE"),
            vec![Directive { module: Some("win_high".to_string()), level: LevelFilter::Trace }]
        );
        assert!(parse_directives("").is_empty());
    }
}
