//! Geographic coordinates.

use crate::ffi::raw::CLLocationCoordinate2D;
use crate::ffi::LocationApi;

/// Latitude/longitude pair in degrees, laid out as `CLLocationCoordinate2D`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Coordinate2D {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate2D {
    /// Create a coordinate.
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Ask the location framework whether the coordinate is valid.
    pub fn is_valid_with(&self, api: &dyn LocationApi) -> bool {
        api.coordinate_is_valid((*self).into())
    }

    /// Ask CoreLocation whether the coordinate is valid.
    #[cfg(target_vendor = "apple")]
    pub fn is_valid(&self) -> bool {
        self.is_valid_with(&crate::ffi::SystemApi)
    }
}

impl From<Coordinate2D> for CLLocationCoordinate2D {
    fn from(c: Coordinate2D) -> Self {
        Self {
            latitude: c.latitude,
            longitude: c.longitude,
        }
    }
}

impl From<CLLocationCoordinate2D> for Coordinate2D {
    fn from(c: CLLocationCoordinate2D) -> Self {
        Self::new(c.latitude, c.longitude)
    }
}
