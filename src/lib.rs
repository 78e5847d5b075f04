//! # Particle Field
//!
//! An interactive, pointer-reactive point-particle field rendered with wgpu.
//!
//! ## Features
//!
//! - **Distributions**: area-uniform disc sampling or particles seeded from an image's alpha channel
//! - **GPU Rendering**: one instanced draw per frame, optional additive glow pass, MSAA
//! - **Pointer Interaction**: smoothed pointer with a smoothstep falloff force field
//! - **Explicit Lifecycle**: `FieldSession` with mount / start / tick / dispose
//!
//! ### Example
//!
//! ```ignore
//! use particle_field::config::AppConfig;
//! use particle_field::core::App;
//!
//! let (config, _) = AppConfig::load(None)?;
//! App::new(config).run()?;
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Session, animation loop and host event loop
//! - [`render`]: Colors, force model, distributions and the wgpu pipeline
//! - [`platform`]: Pointer tracking and windowing
//! - [`config`]: Configuration loading and validation

/// Session lifecycle, animation loop and the winit host
pub mod core;
/// Platform abstraction: pointer input and window
pub mod platform;
/// Rendering: host-side math and the wgpu pipeline
pub mod render;
/// Configuration system
pub mod config;
