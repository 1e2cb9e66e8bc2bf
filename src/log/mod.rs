#![allow(unused_macros)]
use self::simple_logger::SimpleLogger;
use std::env;
use std::ops::Deref;
use std::sync::Once;

mod simple_logger;

/// Variable selecting the most verbose level that is printed.
pub const LOG_LEVEL_VAR: &str = "HBAC_TEST_LOG";

macro_rules! logger_macro {
    ($name:ident is $rule_level:ident to $target:expr, $d:tt) => {
        macro_rules! $name {
            ($d($d arg:tt)+) => (::log::log!(target: $target, ::log::Level::$rule_level, $d($d arg)+));
        }

        pub(crate) use $name;
    };
    ($name:ident is $rule_level:ident to $target:expr) => {
        logger_macro!($name is $rule_level to $target, $);
    };
}

logger_macro!(rpc_warn is Warn to "hbac::rpc");
logger_macro!(rpc_info is Info to "hbac::rpc");
logger_macro!(rpc_debug is Debug to "hbac::rpc");

logger_macro!(fixture_warn is Warn to "hbac::fixture");
logger_macro!(fixture_info is Info to "hbac::fixture");
logger_macro!(fixture_debug is Debug to "hbac::fixture");

logger_macro!(pam_warn is Warn to "hbac::pam");
logger_macro!(pam_info is Info to "hbac::pam");
logger_macro!(pam_debug is Debug to "hbac::pam");

#[derive(Default)]
pub struct HarnessLogger(Vec<(String, Box<dyn log::Log>)>);

impl HarnessLogger {
    pub fn new() -> Self {
        let mut logger: Self = Default::default();

        logger.add_logger("hbac::rpc", SimpleLogger::to_stderr("[rpc] "));
        logger.add_logger("hbac::fixture", SimpleLogger::to_stderr("[fixture] "));
        logger.add_logger("hbac::pam", SimpleLogger::to_stderr("[pam] "));

        logger
    }

    /// Install as the global logger. Fails if some logger is already set.
    pub fn into_global_logger(self, level: log::LevelFilter) -> Result<(), log::SetLoggerError> {
        log::set_boxed_logger(Box::new(self)).map(|()| log::set_max_level(level))
    }

    /// Add a logger for a specific prefix to the stack
    fn add_logger(
        &mut self,
        prefix: impl ToString + Deref<Target = str>,
        logger: impl log::Log + 'static,
    ) {
        let prefix = if prefix.ends_with("::") {
            prefix.to_string()
        } else {
            // given a prefix `my::prefix`, we want to match `my::prefix::somewhere`
            // but not `my::prefix_to_somewhere`
            format!("{}::", prefix.to_string())
        };
        self.0.push((prefix, Box::new(logger)))
    }
}

impl log::Log for HarnessLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.0.iter().any(|(_, l)| l.enabled(metadata))
    }

    fn log(&self, record: &log::Record) {
        for (prefix, l) in self.0.iter() {
            if record.target() == &prefix[..prefix.len() - 2] || record.target().starts_with(prefix)
            {
                l.log(record);
            }
        }
    }

    fn flush(&self) {
        for (_, l) in self.0.iter() {
            l.flush();
        }
    }
}

/// Install the harness logger once per process, honouring `HBAC_TEST_LOG`.
///
/// Later calls do nothing, so every test can call this first.
pub fn init() {
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        let level = level_from(env::var(LOG_LEVEL_VAR).ok().as_deref());
        // another logger may have been installed by the embedding test binary
        let _ = HarnessLogger::new().into_global_logger(level);
    });
}

fn level_from(value: Option<&str>) -> log::LevelFilter {
    value
        .and_then(|value| value.parse().ok())
        .unwrap_or(log::LevelFilter::Warn)
}
