//! Log file location, timestamps and escape-code removal.
use std::fs;
use std::path::PathBuf;

/// Remove terminal escape sequences so the log file stays plain text.
///
/// CSI sequences run from `ESC [` to the first byte in `@..=~`; any other
/// escape drops only the character that follows it.
pub(super) fn plain_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some((before, after)) = rest.split_once('\x1b') {
        out.push_str(before);
        let mut tail = after.chars();
        if tail.next() == Some('[') {
            for c in tail.by_ref() {
                if ('@'..='~').contains(&c) {
                    break;
                }
            }
        }
        rest = tail.as_str();
    }
    out.push_str(rest);
    out
}

/// Directory that holds per-command log files.
///
/// `JUMPSTART_LOG_DIR` wins; otherwise `$XDG_CACHE_HOME/jumpstart` or
/// `~/.cache/jumpstart`. Created on demand.
pub(super) fn log_dir() -> Option<PathBuf> {
    let dir = match std::env::var_os("JUMPSTART_LOG_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => std::env::var_os("XDG_CACHE_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".cache")))?
            .join("jumpstart"),
    };
    fs::create_dir_all(&dir).ok()?;
    Some(dir)
}

/// `<log dir>/<command>.log`.
pub(super) fn log_path(command: &str) -> Option<PathBuf> {
    log_dir().map(|dir| dir.join(format!("{command}.log")))
}

/// Current UTC time using a `chrono` format string.
pub(super) fn utc_now(fmt: &str) -> String {
    chrono::Utc::now().format(fmt).to_string()
}
