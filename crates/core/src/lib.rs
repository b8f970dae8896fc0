pub mod models;
pub mod settings;
pub mod traits;

pub use models::*;
pub use settings::*;
pub use traits::*;
