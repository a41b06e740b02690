//! Best-effort visit enrichment.

use std::net::IpAddr;
use std::sync::Arc;

use crate::analytics::device::DeviceClass;
use crate::analytics::geoip::GeoIpService;

/// Sentinel country used whenever geolocation cannot resolve.
pub const UNKNOWN_COUNTRY: &str = "Unknown";

/// Enriched fields for one visit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enriched {
    pub country: String,
    pub device: DeviceClass,
}

/// Derives geography and device class from raw request metadata.
///
/// Enrichment is telemetry, not control flow: every failure degrades to
/// a sentinel value and nothing here can fail the redirect path.
#[derive(Clone)]
pub struct Enricher {
    geoip: Option<Arc<GeoIpService>>,
}

impl Enricher {
    pub fn new(geoip: Option<Arc<GeoIpService>>) -> Self {
        Self { geoip }
    }

    pub fn enrich(&self, ip: IpAddr, user_agent: Option<&str>) -> Enriched {
        let country = self
            .geoip
            .as_ref()
            .and_then(|g| g.country(ip))
            .unwrap_or_else(|| UNKNOWN_COUNTRY.to_string());

        Enriched {
            country,
            device: DeviceClass::classify(user_agent),
        }
    }
}
