//! External service integrations.

pub mod identity {
    pub use crate::identity::*;
}
