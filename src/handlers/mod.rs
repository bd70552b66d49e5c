pub mod editor;
pub mod run;
