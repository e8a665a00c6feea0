// Domain layer: value types and ports. No browser or filesystem code here.

pub mod model;
pub mod ports;
