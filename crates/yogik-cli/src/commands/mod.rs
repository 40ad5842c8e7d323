pub mod history;
pub mod kriyas;
pub mod practice;
pub mod sequence;
pub mod settings;
