// hinst-net/src/lib.rs
pub mod http;
pub mod release;
pub mod validation;

pub use http::{build_http_client, download_to_file, fetch_checksum_manifest};
pub use release::{fetch_latest_tag, resolve_release};
pub use validation::validate_url;
