pub mod pid;
pub mod simulation;
