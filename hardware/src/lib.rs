//! Hardware drivers for the taper pulling bench.
//!
//! Each instrument family gets its own module with a low-level link and a
//! typed driver on top of it. Diagnostic binaries live under `src/bin/`.

pub mod esp300;
