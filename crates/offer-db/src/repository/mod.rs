//! # Repository Module
//!
//! Database repository implementations for the offer form.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  OfferService (CLI)                                                    │
//! │       │                                                                 │
//! │       │  db.forms().load_form(&id)                                     │
//! │       ▼                                                                 │
//! │  FormRepository                                                        │
//! │  ├── load_form / get_meta / get_positions                              │
//! │  ├── update_positions / update_terms / update_general_comment          │
//! │  └── submit ──────────────┐                                            │
//! │                           ▼                                            │
//! │  DocumentOutboxRepository (same transaction)                           │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`FormRepository`](form::FormRepository) - Forms, positions, terms, submission
//! - [`DocumentOutboxRepository`](outbox::DocumentOutboxRepository) - Document webhook queue

pub mod form;
pub mod outbox;
