use crate::types::LatLng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GeoError {
    #[error("permission denied")]
    PermissionDenied,
    #[error("position unavailable")]
    Unavailable,
    #[error("timed out")]
    Timeout,
}

/// One-shot position lookup.
pub trait Geolocator {
    fn current_position(&self) -> Result<LatLng, GeoError>;
}

/// Answers every lookup with the same result.
#[derive(Debug, Clone, Copy)]
pub struct FixedGeolocator(Result<LatLng, GeoError>);

impl FixedGeolocator {
    /// `None` behaves like a device without a position fix.
    pub fn new(home: Option<LatLng>) -> Self {
        Self(home.ok_or(GeoError::Unavailable))
    }

    pub const fn failing(err: GeoError) -> Self {
        Self(Err(err))
    }
}

impl Geolocator for FixedGeolocator {
    fn current_position(&self) -> Result<LatLng, GeoError> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_home_is_unavailable() {
        assert_eq!(
            FixedGeolocator::new(None).current_position(),
            Err(GeoError::Unavailable)
        );
        let home = LatLng::new(48.85, 2.35);
        assert_eq!(FixedGeolocator::new(Some(home)).current_position(), Ok(home));
        assert_eq!(
            FixedGeolocator::failing(GeoError::PermissionDenied).current_position(),
            Err(GeoError::PermissionDenied)
        );
    }
}
