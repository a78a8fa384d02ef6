//! Input module - OS-facing capabilities for the crossing engine
//!
//! This module provides abstractions for:
//! - Enumerating displays and locating the display under a point
//! - Relocating the system pointer
//! - Delivering raw pointer-move events and refresh triggers

mod events;
mod traits;
mod virtual_desk;

#[cfg(target_os = "windows")]
mod windows;

// Re-export common types
pub use events::*;
pub use traits::*;
pub use virtual_desk::VirtualDesktop;

// Re-export platform-specific implementations
#[cfg(target_os = "windows")]
pub use windows::{WindowsCursor, WindowsDisplays, WindowsEventSource};

/// Get the current platform name
pub fn platform_name() -> &'static str {
    #[cfg(target_os = "macos")]
    return "macOS";

    #[cfg(target_os = "linux")]
    return "Linux";

    #[cfg(target_os = "windows")]
    return "Windows";

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    return "Unknown";
}

/// One-time process setup that must precede display enumeration
pub fn init_platform() {
    #[cfg(target_os = "windows")]
    windows::enable_dpi_awareness();
}

/// The display provider for the current platform
pub fn native_display_provider() -> InputResult<Box<dyn DisplayProvider>> {
    #[cfg(target_os = "windows")]
    return Ok(Box::new(WindowsDisplays::new()));

    #[cfg(not(target_os = "windows"))]
    return Err(InputError::NotSupported);
}
