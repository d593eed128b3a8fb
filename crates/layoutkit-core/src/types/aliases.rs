//! Type aliases for commonly used complex types.
//!
//! The annotation engine runs on a single UI thread, so shared state and
//! callbacks are `Rc`/`RefCell` based and carry no `Send` bounds.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use layoutkit_core::types::*;
//!
//! let log: Shared<Vec<String>> = shared(Vec::new());
//! let sink = log.clone();
//! let on_select: NodeCallback = Box::new(move |id| sink.borrow_mut().push(id.to_string()));
//! ```

use std::cell::RefCell;
use std::rc::Rc;

/// A reference-counted, interior-mutable wrapper for single-threaded sharing.
pub type Shared<T> = Rc<RefCell<T>>;

/// Wraps a value in a [`Shared`] cell.
pub fn shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}

/// A callback receiving a node id (select, unselect, mode-off notifications).
pub type NodeCallback = Box<dyn FnMut(&str)>;

/// A callback receiving a node id and its new parent id.
pub type ReparentCallback = Box<dyn FnMut(&str, &str)>;

/// A callback notified when invalid text is discarded on unselect.
///
/// Receives the node id and the rejected text.
pub type InvalidTextCallback = Box<dyn FnMut(&str, &str)>;

/// A predicate over some borrowed value.
pub type Predicate<T> = Box<dyn Fn(&T) -> bool>;
