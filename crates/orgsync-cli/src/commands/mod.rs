pub mod dispatch;
pub mod hierarchy;
pub mod prune;
pub mod pull;
pub mod schema;
pub mod sync;
pub mod validate;
