use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Praxis";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get the application data directory
/// ~/Praxis/ on all platforms (user-visible)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Praxis")
}

/// Default location of the agenda database
pub fn agenda_db_path() -> PathBuf {
    app_data_dir().join("agenda.db")
}

/// Default tracing filter when RUST_LOG is unset
pub fn default_log_filter() -> String {
    "info,praxis=debug".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_under_home() {
        let dir = app_data_dir();
        let home = dirs::home_dir().unwrap();
        assert!(dir.starts_with(home));
        assert!(dir.ends_with("Praxis"));
    }

    #[test]
    fn db_path_under_app_data() {
        let db = agenda_db_path();
        assert!(db.starts_with(app_data_dir()));
        assert!(db.ends_with("agenda.db"));
    }

    #[test]
    fn app_name_is_praxis() {
        assert_eq!(APP_NAME, "Praxis");
    }

    #[test]
    fn log_filter_names_this_crate() {
        assert!(default_log_filter().contains("praxis"));
    }
}
