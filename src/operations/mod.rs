pub mod add;
pub mod compose;
pub mod find;
pub mod repair;
pub mod util;

pub use add::add_route;
pub use compose::{register_default, register_group, route_composed, set_default};
pub use find::{allowed_methods, find_route, route_request};
pub use repair::find_case_insensitive_path;
pub use util::clean_path;
