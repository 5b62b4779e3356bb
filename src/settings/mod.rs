pub mod store;

pub use store::{
    PreloaderSettings, default_data_dir, load_settings, resolve_settings, save_settings,
};
