#![deny(warnings)]
pub mod belief;
pub mod game;
pub mod inference;
pub mod model;

pub struct AppInfo;

impl AppInfo {
    pub const fn name() -> &'static str {
        "spider"
    }

    pub const fn codename() -> &'static str {
        "Spider of Lore"
    }

    pub const fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}

#[cfg(test)]
mod tests {
    use super::AppInfo;

    #[test]
    fn exposes_static_metadata() {
        assert_eq!(AppInfo::name(), "spider");
        assert_eq!(AppInfo::codename(), "Spider of Lore");
        assert!(!AppInfo::version().is_empty());
    }
}
