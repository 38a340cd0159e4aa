use crate::messages::HealthRes;

/// Health check shared by every API surface.
#[derive(Clone, Default)]
pub struct HealthService;

impl HealthService {
    pub fn new() -> Self {
        Self
    }

    /// Reports the service as alive.
    ///
    /// This does not contact the appointment store; a store outage shows up on the data
    /// endpoints instead.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "Clinic API is alive".into(),
        }
    }
}
