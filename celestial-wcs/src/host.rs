//! Handle-table boundary for hosts that cannot hold Rust values directly.
//!
//! A host asks for a coordinate system with a raw header buffer and gets an
//! integer handle back. Every later call names that handle. Transform calls
//! return plain `(f64, f64, i32)` triples with the [`WcsStatus`] codes, and an
//! unknown or released handle reports [`WcsStatus::InvalidHandle`] instead of
//! misbehaving.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::config::ParseOptions;
use crate::error::WcsStatus;
use crate::parser::parse;
use crate::validate::{select_first, validate_all};
use crate::wcs::{Transformed, Wcs};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WcsHandle(u64);

impl WcsHandle {
    pub fn id(self) -> u64 {
        self.0
    }
}

/// Owns every coordinate system handed out to the host.
#[derive(Debug)]
pub struct WcsHost {
    options: ParseOptions,
    next: AtomicU64,
    table: RwLock<HashMap<u64, Arc<Wcs>>>,
}

impl Default for WcsHost {
    fn default() -> Self {
        Self::with_options(ParseOptions::default())
    }
}

impl WcsHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ParseOptions) -> Self {
        Self {
            options,
            next: AtomicU64::new(1),
            table: RwLock::new(HashMap::new()),
        }
    }

    fn register(&self, wcs: Wcs) -> WcsHandle {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        self.table
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(wcs));
        debug!(handle = id, "allocated coordinate system handle");
        WcsHandle(id)
    }

    /// Parses `header` and keeps the first two-axis coordinate system.
    /// `None` on a structural parse failure or when no system qualifies.
    pub fn get_wcs(&self, header: &[u8], record_count: i32) -> Option<WcsHandle> {
        match select_first(parse(header, record_count, &self.options)) {
            Ok(wcs) => Some(self.register(wcs)),
            Err(reason) => {
                debug!(%reason, "no coordinate system handle");
                None
            }
        }
    }

    /// One handle per acceptable alternate, in header order.
    pub fn get_wcs_all(&self, header: &[u8], record_count: i32) -> Vec<WcsHandle> {
        match parse(header, record_count, &self.options) {
            Ok(parsed) => validate_all(&parsed).into_iter().map(|w| self.register(w)).collect(),
            Err(e) => {
                debug!(error = %e, "no coordinate system handle");
                Vec::new()
            }
        }
    }

    /// Shared access to the system behind `handle`.
    pub fn get(&self, handle: WcsHandle) -> Option<Arc<Wcs>> {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&handle.0)
            .cloned()
    }

    /// False for an unknown handle as well.
    pub fn has_celestial(&self, handle: WcsHandle) -> bool {
        self.get(handle).is_some_and(|w| w.has_celestial())
    }

    pub fn pix2sky(&self, handle: WcsHandle, x: f64, y: f64) -> (f64, f64, i32) {
        triple(self.get(handle).map(|w| w.pix2sky(x, y)))
    }

    pub fn sky2pix(&self, handle: WcsHandle, c0: f64, c1: f64) -> (f64, f64, i32) {
        triple(self.get(handle).map(|w| w.sky2pix(c0, c1)))
    }

    /// Returns false if the handle was not live.
    pub fn release(&self, handle: WcsHandle) -> bool {
        let removed = self
            .table
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&handle.0)
            .is_some();
        debug!(handle = handle.0, removed, "released coordinate system handle");
        removed
    }

    pub fn len(&self) -> usize {
        self.table.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn triple(result: Option<Transformed>) -> (f64, f64, i32) {
    match result {
        Some(t) => (t.coords[0], t.coords[1], t.status.code()),
        None => (f64::NAN, f64::NAN, WcsStatus::InvalidHandle.code()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn header(cards: &[&str]) -> Vec<u8> {
        cards.iter().flat_map(|c| format!("{c:<80}").into_bytes()).collect()
    }

    const CAR: &[&str] = &[
        "NAXIS   =                    2",
        "CTYPE1  = 'GLON-CAR'",
        "CTYPE2  = 'GLAT-CAR'",
        "CRPIX1  =                  1.0",
        "CRPIX2  =                  1.0",
        "CRVAL1  =                 10.0",
        "CDELT1  =                  0.5",
        "CDELT2  =                  0.5",
    ];

    #[test]
    fn test_handle_lifecycle() {
        let host = WcsHost::new();
        let handle = host.get_wcs(&header(CAR), CAR.len() as i32).unwrap();
        assert!(host.has_celestial(handle));
        assert_eq!(host.len(), 1);

        let (lon, lat, status) = host.pix2sky(handle, 3.0, 1.0);
        assert_eq!(status, 0);
        assert_abs_diff_eq!(lon, 11.0, epsilon = 1e-12);
        assert_abs_diff_eq!(lat, 0.0, epsilon = 1e-12);

        assert!(host.release(handle));
        assert!(!host.release(handle));
        assert!(host.is_empty());
        let (lon, _, status) = host.pix2sky(handle, 3.0, 1.0);
        assert_eq!(status, WcsStatus::InvalidHandle.code());
        assert!(lon.is_nan());
        assert!(!host.has_celestial(handle));
    }

    #[test]
    fn test_handles_are_distinct() {
        let host = WcsHost::new();
        let buf = header(CAR);
        let a = host.get_wcs(&buf, CAR.len() as i32).unwrap();
        let b = host.get_wcs(&buf, CAR.len() as i32).unwrap();
        assert_ne!(a, b);
        host.release(a);
        assert_eq!(host.sky2pix(b, 1.0, 0.0).2, 0);
    }

    #[test]
    fn test_structural_failure_gives_no_handle() {
        let host = WcsHost::new();
        assert!(host.get_wcs(&header(CAR), 0).is_none());
        assert!(host.get_wcs(&header(CAR), 100).is_none());
        assert!(host.get_wcs_all(&header(CAR), -1).is_empty());
    }

    #[test]
    fn test_options_are_applied() {
        let mut cards = CAR.to_vec();
        cards.push("CTYPE1A = 'RA---TAN'");
        cards.push("CTYPE2A = 'DEC--TAN'");
        let buf = header(&cards);

        let host = WcsHost::new();
        assert_eq!(host.get_wcs_all(&buf, cards.len() as i32).len(), 2);

        let primary_only = WcsHost::with_options(
            ParseOptions::default().alternates(crate::config::AltSelection::PrimaryOnly),
        );
        assert_eq!(primary_only.get_wcs_all(&buf, cards.len() as i32).len(), 1);
    }

    #[test]
    fn test_shared_across_threads() {
        let host = Arc::new(WcsHost::new());
        let handle = host.get_wcs(&header(CAR), CAR.len() as i32).unwrap();
        let workers: Vec<_> = (0..4)
            .map(|i| {
                let host = Arc::clone(&host);
                std::thread::spawn(move || host.pix2sky(handle, 1.0 + f64::from(i), 1.0))
            })
            .collect();
        for (i, w) in workers.into_iter().enumerate() {
            let (lon, _, status) = w.join().unwrap();
            assert_eq!(status, 0);
            assert_abs_diff_eq!(lon, 10.0 + 0.5 * i as f64, epsilon = 1e-12);
        }
    }
}
