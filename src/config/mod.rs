pub mod backend;
pub mod describe;
pub mod engine;
pub mod env_file;
pub mod location;
pub mod model;
pub mod options;
pub mod path;
pub mod qualified_name;
pub mod redacted;
pub mod result_error;
pub mod selector;
pub mod store;
pub mod validate;

macro_rules! function_path {
    () => {
        concat!(module_path!(), "::", function_name!(), " ", file!(), ":", line!())
    };
}

pub(crate) use function_path;
