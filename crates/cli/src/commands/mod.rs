pub mod ask;
pub mod bootstrap;
pub mod doctor;
pub mod onboard;
pub mod status;
