//! Native libraries for the Corvid VM.
//!
//! Each library is a static descriptor table plus the host state its
//! bindings expect to find attached to the VM:
//!
//! | Library    | Table              | Host               |
//! |------------|--------------------|--------------------|
//! | sys (`io`) | `SYS_NATIVES`      | `FileTable`        |
//! | graphics   | `GRAPHICS_NATIVES` | `GraphicsContext`  |
//!
//! [`natives`] lays the tables out in that order, so the syscall numbers
//! `sys_open = 0` to `sys_write = 3` are also the native indices.

pub mod graphics;
pub mod headless;
#[cfg(feature = "io")]
pub mod sys;

pub use graphics::{Graphics, GraphicsContext, GRAPHICS_NATIVES};
pub use headless::{DrawCall, HeadlessGraphics, Recording};
#[cfg(feature = "io")]
pub use sys::{FileTable, SYS_NATIVES};

use vm::{NativeRegistry, NativeTable, RuntimeError};

/// Register every library in this crate. sys goes first so its natives
/// keep indices 0 to 3.
pub fn register_all<R: NativeRegistry>(registry: &mut R) -> Result<(), RuntimeError> {
    #[cfg(feature = "io")]
    registry.define_all(SYS_NATIVES)?;
    registry.define_all(GRAPHICS_NATIVES)?;
    Ok(())
}

/// A frozen table holding every library in this crate.
pub fn natives() -> Result<NativeTable, RuntimeError> {
    let mut builder = NativeTable::builder();
    register_all(&mut builder)?;
    Ok(builder.build())
}
