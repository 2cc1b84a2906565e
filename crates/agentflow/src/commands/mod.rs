pub mod compute;
pub mod down;
pub mod register;
pub mod status;
pub mod up;
