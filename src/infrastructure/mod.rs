pub mod komerci;
pub mod simulated;
