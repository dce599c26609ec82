//! Metallurgical process models.
//!
//! This module contains models of heat-treatment processes in which the
//! local phase constitution of a steel controls how species move through it.

pub mod nitriding;
