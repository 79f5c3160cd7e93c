// Domain-layer modules and shared errors/models
pub mod onboarding {
    pub use crate::onboarding::*;
}

pub mod validation {
    pub use crate::validation::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod errors {
    pub use crate::errors::*;
}
