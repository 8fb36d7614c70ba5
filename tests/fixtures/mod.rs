//! Report fixtures around Metro Manila for E2E testing

/// A pollution report to submit, with where it should land relative to
/// [`QUERY_POINT`].
#[derive(Debug, Clone)]
pub struct TestReportFixture {
    pub latitude: f64,
    pub longitude: f64,
    pub barangay: &'static str,
    pub pollution_type: &'static str,
    pub severity: &'static str,
    pub description: &'static str,
    pub within_default_radius: bool,
}

/// Manila City Hall.
pub const QUERY_POINT: (f64, f64) = (14.5995, 120.9842);

pub const TEST_REPORTS: &[TestReportFixture] = &[
    TestReportFixture {
        latitude: 14.6095,
        longitude: 120.9842,
        barangay: "Quiapo",
        pollution_type: "gas_emission",
        severity: "critical",
        description: "Thick black smoke from a warehouse fire",
        within_default_radius: true,
    },
    TestReportFixture {
        latitude: 14.5995,
        longitude: 120.9942,
        barangay: "Paco",
        pollution_type: "waste",
        severity: "medium",
        description: "Uncollected garbage piling up beside the creek",
        within_default_radius: true,
    },
    TestReportFixture {
        latitude: 14.6760,
        longitude: 121.0437,
        barangay: "Diliman",
        pollution_type: "air_quality",
        severity: "low",
        description: "Light haze over the campus in the morning",
        within_default_radius: false,
    },
];

/// 1x1 transparent PNG.
pub const TINY_PNG_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

pub const VOICE_TRANSCRIPTIONS: &[&str] = &[
    "There is heavy smoke coming from the factory near the market",
    "Some garbage was dumped along the river bank",
];
