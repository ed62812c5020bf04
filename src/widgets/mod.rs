pub mod cell_input;
pub mod controls;
pub mod datatable;
pub mod debug;
