/// Build metadata stamped by `build.rs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildInfo {
    pub version: &'static str,
    pub git_hash: &'static str,
    pub git_status: &'static str,
    pub timestamp: &'static str,
    pub target: &'static str,
    pub profile: &'static str,
}

pub fn current() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        git_hash: option_env!("TRIP_LEDGER_BUILD_HASH").unwrap_or("unknown"),
        git_status: option_env!("TRIP_LEDGER_BUILD_TREE").unwrap_or("unknown"),
        timestamp: option_env!("TRIP_LEDGER_BUILD_TIMESTAMP").unwrap_or("unknown"),
        target: option_env!("TRIP_LEDGER_BUILD_TARGET").unwrap_or("unknown"),
        profile: option_env!("TRIP_LEDGER_BUILD_PROFILE").unwrap_or("unknown"),
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn version_matches_package() {
        assert_eq!(super::current().version, env!("CARGO_PKG_VERSION"));
    }
}
