use std::env;
use std::ffi::{OsStr, OsString};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Serializes every scoped override in the process: only one can be active.
static ENV_SLOT: Mutex<()> = Mutex::new(());

/// Sets a process environment variable for as long as it lives and puts
/// the previous value (or its absence) back on drop, including during
/// unwinding.
///
/// Overrides from other threads wait until this one is dropped. Taking a
/// second override on the same thread deadlocks.
#[must_use]
pub struct EnvOverride {
    name: String,
    previous: Option<OsString>,
    _slot: MutexGuard<'static, ()>,
}

impl EnvOverride {
    pub fn set(name: &str, value: impl AsRef<OsStr>) -> Self {
        // a panicking scenario has already restored its value on the way out
        let slot = ENV_SLOT.lock().unwrap_or_else(PoisonError::into_inner);

        let previous = env::var_os(name);
        env::set_var(name, value);

        EnvOverride {
            name: name.to_string(),
            previous,
            _slot: slot,
        }
    }

    pub fn previous(&self) -> Option<&OsStr> {
        self.previous.as_deref()
    }
}

impl Drop for EnvOverride {
    fn drop(&mut self) {
        match &self.previous {
            Some(value) => env::set_var(&self.name, value),
            None => env::remove_var(&self.name),
        }
    }
}
