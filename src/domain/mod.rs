// Domain layer - Core editing model

pub mod clock;
pub mod effects;
pub mod errors;
pub mod merge;
pub mod model;
pub mod rules;
pub mod session;
pub mod suggestion;
pub mod timeline;
