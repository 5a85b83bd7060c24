//! The built-in service stack: the backend API as a background service and
//! the dashboard as the foreground service that owns the container lifetime.

use stackup_core::{ServiceRole, ServiceSpec, SupervisorConfig};

pub const API_PORT: u16 = 8000;
pub const DASHBOARD_PORT: u16 = 8501;

/// The compiled-in two-service stack, matching the container image layout:
/// uvicorn serving the API, streamlit serving the dashboard.
pub fn builtin_stack() -> SupervisorConfig {
    let api = ServiceSpec::builder()
        .name("api")
        .role(ServiceRole::Background)
        .command("uvicorn")
        .args(["api:app", "--host", "0.0.0.0", "--port", "8000"])
        .bind_port(API_PORT)
        .build()
        .expect("builtin api spec is complete");

    let dashboard = ServiceSpec::builder()
        .name("dashboard")
        .role(ServiceRole::Foreground)
        .command("streamlit")
        .args([
            "run",
            "dashboard.py",
            "--server.port",
            "8501",
            "--server.address",
            "0.0.0.0",
        ])
        .bind_port(DASHBOARD_PORT)
        .build()
        .expect("builtin dashboard spec is complete");

    SupervisorConfig::new(vec![api, dashboard])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_stack_is_valid() {
        let config = builtin_stack();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_api_is_declared_before_dashboard() {
        let config = builtin_stack();
        assert_eq!(config.services[0].name, "api");
        assert_eq!(config.services[0].role, ServiceRole::Background);
        assert_eq!(config.services[1].name, "dashboard");
        assert_eq!(config.services[1].role, ServiceRole::Foreground);
    }

    #[test]
    fn test_declared_ports() {
        let config = builtin_stack();
        assert_eq!(config.services[0].bind_port, Some(8000));
        assert_eq!(config.services[1].bind_port, Some(8501));
    }
}
