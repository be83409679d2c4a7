//! Common test data and constants

use uuid::Uuid;

use directory::database::{NewServiceInstance, ServiceDetails};

/// Common test service names
pub mod names {
    pub const ACME: &str = "Acme API";
    pub const WEATHER: &str = "Weather Feed";
}

/// Common test instance addresses
pub mod hosts {
    pub const PRIMARY: &str = "10.0.0.1";
    pub const PRIMARY_PORT: u16 = 9090;
    pub const SECONDARY: &str = "10.0.0.2";
}

pub fn service_details(name: &str) -> ServiceDetails {
    ServiceDetails {
        service_id: None,
        name: name.to_string(),
        description: format!("{} for tests", name),
        owner_info: "platform-team@example.com".to_string(),
        industry_category: "logistics".to_string(),
        client_rating: 4.2,
    }
}

pub fn acme_service() -> ServiceDetails {
    service_details(names::ACME)
}

/// Instance on the primary test host with no URL
pub fn instance_for(service_id: Uuid) -> NewServiceInstance {
    NewServiceInstance {
        service_id,
        version: "1.4.2".to_string(),
        host: hosts::PRIMARY.to_string(),
        port: hosts::PRIMARY_PORT,
        url: String::new(),
        latitude: 42.69,
        longitude: 23.32,
        api_spec: "openapi: 3.0.0".to_string(),
    }
}

/// Instance reachable at `url`
pub fn instance_at(service_id: Uuid, url: &str) -> NewServiceInstance {
    NewServiceInstance {
        url: url.to_string(),
        ..instance_for(service_id)
    }
}
