use tracing::debug;

use crate::model::{Env, LoadReport, Value};

/// Snapshot the process environment as string values.
///
/// Non-UTF-8 names and values are converted lossily.
pub fn process_env() -> Env {
    std::env::vars_os()
        .map(|(key, value)| {
            (
                key.to_string_lossy().into_owned(),
                Value::String(value.to_string_lossy().into_owned()),
            )
        })
        .collect()
}

/// Write every entry of `env` into the process environment.
///
/// Keys already present in the process are left alone unless
/// `override_existing` is set. Entries the platform cannot represent (empty
/// keys, `=` in keys, NUL bytes) are skipped.
///
/// # Safety
///
/// This calls [`std::env::set_var`]. The caller must ensure no other threads
/// read or write the process environment while it runs.
pub unsafe fn apply_to_process(env: &Env, override_existing: bool) -> LoadReport {
    let mut report = LoadReport::default();

    for (key, value) in env {
        let value = value.to_string();
        if !is_portable_entry(key, &value) {
            debug!(key = %key, "skipping entry the process environment cannot hold");
            continue;
        }

        if !override_existing && std::env::var_os(key).is_some() {
            debug!(key = %key, "skipping existing key");
            report.skipped_existing += 1;
            continue;
        }

        unsafe { std::env::set_var(key, &value) };
        report.loaded += 1;
    }

    report
}

fn is_portable_entry(key: &str, value: &str) -> bool {
    !key.is_empty() && !key.contains(['=', '\0']) && !value.contains('\0')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn portable_entries_reject_unrepresentable_keys() {
        assert!(is_portable_entry("A", "1"));
        assert!(is_portable_entry("app.port", ""));
        assert!(!is_portable_entry("", "1"));
        assert!(!is_portable_entry("A=B", "1"));
        assert!(!is_portable_entry("A", "nul\0byte"));
    }

    #[test]
    fn apply_respects_existing_keys() {
        let mut env = Env::new();
        env.insert("ENVC_UNIT_APPLY_NEW".to_owned(), Value::Number(8080.0));
        env.insert("ENVC_UNIT_APPLY_OLD".to_owned(), Value::from("file"));

        let report = unsafe {
            std::env::set_var("ENVC_UNIT_APPLY_OLD", "process");
            apply_to_process(&env, false)
        };

        assert_eq!(report.loaded, 1);
        assert_eq!(report.skipped_existing, 1);
        assert_eq!(
            std::env::var("ENVC_UNIT_APPLY_NEW").expect("new key should be set"),
            "8080"
        );
        assert_eq!(
            std::env::var("ENVC_UNIT_APPLY_OLD").expect("old key should be kept"),
            "process"
        );
    }

    #[test]
    fn snapshot_contains_process_variables() {
        unsafe { std::env::set_var("ENVC_UNIT_SNAPSHOT", "seen") };
        let env = process_env();
        assert_eq!(env.get("ENVC_UNIT_SNAPSHOT"), Some(&Value::from("seen")));
    }
}
