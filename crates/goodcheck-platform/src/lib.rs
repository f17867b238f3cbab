//! GoodCheck Platform Layer
//!
//! This crate runs the external shaper engine as a child process and
//! controls the packet filter driver it loads.
//!
//! ## Supported Platforms
//!
//! - **Windows**: `winws.exe` with the WinDivert driver
//! - **Unix**: any shaper executable; no driver to release

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
pub use error::{PlatformError, Result};

pub mod driver;
pub use driver::FilterDriver;

pub mod shaper;
pub use shaper::{ProcessShaper, DEFAULT_STOP_GRACE};
