// Domain-layer modules and shared errors/models
pub mod controller {
    pub use crate::controller::*;
}

pub mod form {
    pub use crate::form::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod view {
    pub use crate::view::*;
}

pub mod errors {
    pub use crate::errors::*;
}
