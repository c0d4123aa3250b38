//! Persistence boundary: the generic tree node and ordered keyed lists.

pub mod object_list;
pub mod sexp;

pub use object_list::{ListElement, ListError, ObjectList};
pub use sexp::{SExp, SExpError, SExpParser};
