//! Use-case services layered over repositories.
//!
//! # Responsibility
//! - Compose repository calls into protocol-facing read models.
//! - Keep adapters decoupled from storage details.

pub mod catalog_service;
