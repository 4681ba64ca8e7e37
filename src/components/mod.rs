pub mod dialogs;
pub mod effects_modal;
pub mod elements_picker;
pub mod share;
