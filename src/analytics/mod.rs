//! Visit enrichment and analytics aggregation.
//!
//! Enrichment derives a best-effort country and device class from
//! untrusted request metadata and never fails the redirect path.
//! Aggregation is a pure transformation of the raw visit log into
//! summarized metrics.

pub mod device;
pub mod enricher;
pub mod geoip;
pub mod ip_extractor;
pub mod summary;

pub use device::DeviceClass;
pub use enricher::Enricher;
pub use geoip::GeoIpService;
pub use ip_extractor::extract_client_ip;
pub use summary::{summarize, AnalyticsSummary};
