// hinst-core/src/platform.rs
use hinst_common::error::Result;
use hinst_common::model::PlatformTarget;
use tracing::debug;

/// Detects the release target of the running host.
pub fn resolve_platform() -> Result<PlatformTarget> {
    let (os, arch) = (std::env::consts::OS, std::env::consts::ARCH);
    debug!("Host reports os={} arch={}", os, arch);
    let platform = PlatformTarget::from_parts(os, arch)?;
    debug!("Resolved release target {}", platform);
    Ok(platform)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(all(target_os = "linux", target_arch = "x86_64"))]
    fn linux_x86_64_host_is_linux_amd64() {
        assert_eq!(resolve_platform().unwrap().to_string(), "linux/amd64");
    }

    #[test]
    fn host_resolution_matches_manual_mapping() {
        let direct = PlatformTarget::from_parts(std::env::consts::OS, std::env::consts::ARCH);
        match (resolve_platform(), direct) {
            (Ok(a), Ok(b)) => assert_eq!(a, b),
            (Err(_), Err(_)) => {}
            (a, b) => panic!("host resolution disagrees: {a:?} vs {b:?}"),
        }
    }
}
