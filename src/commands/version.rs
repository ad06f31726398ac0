//! Command: print version information.

/// Version string, overridable at build time with `JUMPSTART_VERSION`.
#[must_use]
pub fn version() -> &'static str {
    option_env!("JUMPSTART_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Print the jumpstart version to stdout.
#[allow(clippy::print_stdout)]
pub fn run() {
    println!("jumpstart {}", version());
}
