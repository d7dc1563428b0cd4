/// Measurement domain: value types and pure logic, no I/O
pub mod domain;
pub mod services;
