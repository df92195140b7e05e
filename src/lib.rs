//! MARVIN — a personal WhatsApp auto-responder.
//!
//! Single Rust binary. Sits on a WhatsApp number through a browser-automation
//! bridge, decides which incoming messages deserve the owner's attention, and
//! answers the rest itself in persona.
//!
//! See `DESIGN.md` for architecture notes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod logging;
pub mod providers;

pub mod responder;
pub mod whatsapp;
