//! ULID identifiers for process instances and matching runs.
//!
//! `get()` is fixed for the lifetime of the process and is logged at start-up;
//! `generate()` gives each matching run its own time-ordered id so log lines
//! from one run can be grouped.

use once_cell::sync::Lazy;
use ulid::Ulid;

static PROCESS_RUN_ID: Lazy<String> = Lazy::new(|| Ulid::new().to_string());

/// Process-level id, generated on first access.
#[inline]
pub fn get() -> &'static str {
    &PROCESS_RUN_ID
}

/// Fresh 26-character ULID.
#[inline]
pub fn generate() -> String {
    Ulid::new().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_id_is_stable() {
        assert_eq!(get(), get());
        assert_eq!(get().len(), 26);
    }

    #[test]
    fn generated_ids_are_unique_and_time_ordered() {
        let older = generate();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let newer = generate();

        assert_ne!(older, newer);
        assert!(older < newer);
    }
}
