//! GeoIP lookup service using MaxMind GeoLite2/GeoIP2 MMDB
//!
//! Thread-safe IP-to-country lookups over a memory-mapped MaxMind
//! database. The service is optional: without a database every lookup
//! resolves to `None` and callers fall back to the "Unknown" sentinel.

use anyhow::{Context, Result};
use maxminddb::{geoip2, Mmap, Reader};
use std::net::IpAddr;
use std::sync::Arc;

pub struct GeoIpService {
    reader: Option<Arc<Reader<Mmap>>>,
}

impl GeoIpService {
    /// Create a new GeoIP service from an optional MMDB file path
    /// (GeoLite2-Country or GeoLite2-City both work; only country
    /// fields are read).
    pub fn new(db_path: Option<&str>) -> Result<Self> {
        let reader = if let Some(path) = db_path {
            let reader = unsafe { Reader::open_mmap(path) }
                .with_context(|| format!("Failed to open GeoIP database at {}", path))?;
            Some(Arc::new(reader))
        } else {
            None
        };

        Ok(Self { reader })
    }

    /// Lookup the ISO country code for an IP address. Any failure
    /// (missing database, unknown address, decode error) yields `None`.
    pub fn country(&self, ip: IpAddr) -> Option<String> {
        let reader = self.reader.as_ref()?;

        if let Ok(result) = reader.lookup(ip) {
            if let Ok(Some(country)) = result.decode::<geoip2::Country>() {
                return country.country.iso_code.map(|s| s.to_string());
            }
        }

        None
    }
}

impl Clone for GeoIpService {
    fn clone(&self) -> Self {
        Self {
            reader: self.reader.clone(),
        }
    }
}
