// Domain layer: sheet models and the ports the registration core talks through.

pub mod model;
pub mod ports;
