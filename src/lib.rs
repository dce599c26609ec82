//! # Nitriding Models
//!
//! Phase-equilibrium coupled nitrogen diffusion for steel nitriding, built
//! on [Twine](https://github.com/isentropic-dev/twine).
//!
//! A nitrided layer is simulated as a 1-D profile of nitrogen mass fractions.
//! Wherever nitrogen moves, the local material is split into ferrite and
//! austenite by a common-tangent equilibrium on a CALPHAD Fe–N description,
//! and the phase fractions set the local diffusivity.
//!
//! ## Crate layout
//!
//! - [`models`]: Domain-specific [`twine_core::Model`] implementations.
//! - [`support`]: Supporting utilities used by models, including the
//!   thermodynamic model, the equilibrium solver and the numerical kernels.
//!
//! ## Utility code lifecycle
//!
//! Modules in [`support`] are part of the public API because they're useful,
//! but their APIs are not stable. Breaking changes may occur as needed.
//!
//! Note: Only utilities at the crate-level (in [`support`]) are part of the public API.
//! Model-specific utility code remains private.

pub mod models;
pub mod support;
