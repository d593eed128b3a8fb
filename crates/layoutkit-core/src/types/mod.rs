//! Type system utilities and aliases.
//!
//! - [`aliases`]: Type aliases for `Rc<RefCell<T>>`, callbacks and predicates.

pub mod aliases;

pub use aliases::*;
