//! Catalog domain model for albums and photos.
//!
//! # Responsibility
//! - Define the row shapes shared by repositories, services and UI callers.
//! - Keep photo metadata separate from image bytes.
//!
//! # Invariants
//! - Album ids are unique; photo ids are globally unique.
//! - Every photo references exactly one existing album.
//! - Photo rows never carry image bytes.

pub mod album;
pub mod photo;
