//! Mock service instance endpoint for probe tests
//!
//! Simulates an instance's health endpoint without running a real service.

use std::time::Duration;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

pub struct MockInstanceServer {
    pub server: MockServer,
    pub base_url: String,
}

impl MockInstanceServer {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let base_url = server.uri();
        Self { server, base_url }
    }

    /// Full URL of `endpoint` on this server
    pub fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Port the mock listens on
    pub fn port(&self) -> u16 {
        self.server.address().port()
    }

    pub async fn mock_healthy(&self, endpoint: &str) {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_unhealthy(&self, endpoint: &str) {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(503))
            .mount(&self.server)
            .await;
    }

    /// Respond only after `delay`, to exercise probe timeouts
    pub async fn mock_slow(&self, endpoint: &str, delay: Duration) {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(200).set_delay(delay))
            .mount(&self.server)
            .await;
    }
}
