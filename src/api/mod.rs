//! # API Layer
//!
//! External interfaces of the kernel. Only REST is exposed; readers poll
//! the pull-based state endpoint, and the notification channel is a
//! collaborator port rather than an API surface.

pub mod rest;
