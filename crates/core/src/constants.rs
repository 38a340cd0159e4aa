//! Constants used throughout the clinic core crate.
//!
//! Table names, environment variable names and the user-facing notification texts live here
//! so the REST surface and the terminal front-end report failures with identical wording.

/// Path prefix of the hosted store's REST interface.
pub const REST_PATH: &str = "rest/v1";

/// Table holding appointment rows.
pub const APPOINTMENTS_TABLE: &str = "appointments";

/// Table holding prescription rows.
pub const PRESCRIPTIONS_TABLE: &str = "prescriptions";

/// Environment variable selecting the store backend (`postgrest` or `memory`).
pub const ENV_STORE_BACKEND: &str = "CLINIC_STORE_BACKEND";

/// Environment variable holding the hosted store's base URL.
pub const ENV_STORE_URL: &str = "CLINIC_STORE_URL";

/// Environment variable holding the hosted store's API key.
pub const ENV_STORE_KEY: &str = "CLINIC_STORE_KEY";

/// Environment variable pointing at a JSON seed file for the memory backend.
pub const ENV_SEED_FILE: &str = "CLINIC_SEED_FILE";

/// Environment variable holding the REST listen address.
pub const ENV_REST_ADDR: &str = "CLINIC_REST_ADDR";

/// Default REST listen address.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";

/// Number of appointments shown in the dashboard's "recent" section.
pub const RECENT_APPOINTMENTS: usize = 3;

pub const MSG_LOAD_FAILED: &str = "Failed to load appointments";
pub const MSG_PRESCRIPTION_FAILED: &str = "Failed to create prescription";
pub const MSG_STATUS_FAILED: &str = "Failed to update appointment";
pub const MSG_PRESCRIPTION_CREATED: &str = "Prescription Created";

pub const EMPTY_LIST_FILTERED: &str = "Try adjusting your search or filter criteria";
pub const EMPTY_LIST_UNFILTERED: &str = "No appointments have been scheduled yet";
pub const NO_PRESCRIPTION_PENDING: &str =
    "No prescription created yet. Use \"Generate Prescription\" to create one.";
pub const NO_PRESCRIPTION_CLOSED: &str = "No prescription was created for this appointment.";
pub const NO_APPOINTMENTS_TODAY: &str = "No appointments scheduled for today";
