//! Companion executable payload.
//!
//! The packaging step compiles the Windows-side proxy and hands its path
//! to the build through the `COMPANION_EXE` environment variable; with the
//! `embedded-companion` feature enabled those bytes are baked into this
//! binary. Builds without the feature rely on `--proxy-exe` instead.

/// The embedded companion executable, if one was built in.
#[cfg(feature = "embedded-companion")]
pub fn embedded() -> Option<&'static [u8]> {
    Some(include_bytes!(env!("COMPANION_EXE")))
}

/// The embedded companion executable, if one was built in.
#[cfg(not(feature = "embedded-companion"))]
pub fn embedded() -> Option<&'static [u8]> {
    None
}
