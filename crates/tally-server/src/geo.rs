use std::net::IpAddr;
use std::path::Path;

use maxminddb::{geoip2, Reader};

use tally_core::visit::GeoLocation;

/// Offline IP → (country, city) resolver backed by a MaxMind `.mmdb` file.
///
/// The database is read once at startup. Every failure mode (no database,
/// unparsable or loopback address, dataset miss) resolves to
/// `Unknown/Unknown`; lookups never raise.
pub struct GeoResolver {
    reader: Option<Reader<Vec<u8>>>,
}

impl GeoResolver {
    /// Load the database at `path`. A missing or unreadable file is logged and
    /// leaves the resolver disabled.
    pub fn open(path: &str) -> Self {
        if !Path::new(path).exists() {
            tracing::warn!(
                geoip_path = %path,
                "GeoIP database not found. Visits stored with Unknown country/city. \
                 Download a GeoLite2-City or DB-IP City Lite .mmdb file and set TALLY_GEOIP_PATH."
            );
            return Self::disabled();
        }

        match Reader::open_readfile(path) {
            Ok(reader) => {
                tracing::info!(geoip_path = %path, "GeoIP database loaded");
                Self {
                    reader: Some(reader),
                }
            }
            Err(e) => {
                tracing::warn!(geoip_path = %path, error = %e, "GeoIP database unreadable");
                Self::disabled()
            }
        }
    }

    /// A resolver that answers `Unknown/Unknown` for every address.
    pub fn disabled() -> Self {
        Self { reader: None }
    }

    pub fn lookup(&self, ip: &str) -> GeoLocation {
        let Some(addr) = routable_addr(ip) else {
            return GeoLocation::unknown();
        };
        let Some(reader) = &self.reader else {
            return GeoLocation::unknown();
        };

        let record: geoip2::City = match reader.lookup(addr) {
            Ok(record) => record,
            Err(e) => {
                tracing::debug!(ip = %addr, error = %e, "GeoIP lookup miss");
                return GeoLocation::unknown();
            }
        };

        let unknown = GeoLocation::unknown();
        let country = record
            .country
            .as_ref()
            .and_then(|c| c.iso_code)
            .map(str::to_string)
            .unwrap_or(unknown.country);
        let city = record
            .city
            .as_ref()
            .and_then(|c| c.names.as_ref())
            .and_then(|names| names.get("en"))
            .map(|s| s.to_string())
            .unwrap_or(unknown.city);

        GeoLocation { country, city }
    }
}

/// Parse `ip` and drop addresses that can never resolve (loopback, unspecified).
fn routable_addr(ip: &str) -> Option<IpAddr> {
    let addr: IpAddr = ip.trim().parse().ok()?;
    let addr = addr.to_canonical();
    if addr.is_loopback() || addr.is_unspecified() {
        return None;
    }
    Some(addr)
}
