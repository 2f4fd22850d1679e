pub mod init_list;
pub mod type_map;

pub use init_list::{declaration, RenderOptions};
pub use type_map::{element_type, value_type};
