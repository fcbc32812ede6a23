//! Schema fixtures for tests, loaded at compile time with `include_str!`.
//!
//! ## Available Fixtures
//!
//! - [`CONTACTS`] - References, a collection, constraints, defaults, geometry and passwords
//! - [`CYCLE`] - Three entities referencing each other in a ring, in a named schema

/// Contains:
/// - 4 entities: Phone, Contact, User, Role
/// - `Contact.phone` single reference, `User.roles` collection, `User.manager` self-reference
/// - length, unique, required and srid constraints
/// - a quoted string default, a function-call default and a boolean default
/// - `lastModified` on Contact
pub const CONTACTS: &str = include_str!("contacts.json");

/// Alpha -> Beta -> Gamma -> Alpha, plus a self collection on Gamma.
pub const CYCLE: &str = include_str!("cycle.json");
