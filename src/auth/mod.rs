pub mod context;
pub mod utils;

pub use context::{AuthContext, UserRole};
pub use utils::{require_authenticated, require_role};
