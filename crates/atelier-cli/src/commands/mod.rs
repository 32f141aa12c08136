pub mod kinds;
pub mod replay;
