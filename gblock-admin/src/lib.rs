pub mod api;

use std::net::SocketAddr;

use anyhow::{Context, Result};
use gblock_common::version::gblock_version;
use gblock_core::Services;
use poem::listener::TcpListener;
use poem::{Endpoint, EndpointExt, Route, Server};
use poem_openapi::{OpenApi, OpenApiService};
use tracing::*;

pub const API_PREFIX: &str = "/api";

pub fn admin_api_service() -> OpenApiService<impl OpenApi, ()> {
    OpenApiService::new(api::get(), "Global Blocking", gblock_version()).server(API_PREFIX)
}

pub struct AdminServer {
    services: Services,
}

impl AdminServer {
    pub fn new(services: &Services) -> Self {
        AdminServer {
            services: services.clone(),
        }
    }

    pub fn app(&self) -> impl Endpoint {
        Route::new()
            .nest(API_PREFIX, admin_api_service())
            .data(self.services.clone())
    }

    pub async fn run(self, address: SocketAddr) -> Result<()> {
        let app = self.app();
        info!(?address, "Listening");
        Server::new(TcpListener::bind(address))
            .run(app)
            .await
            .context("Failed to start admin server")
    }
}

#[cfg(test)]
mod test_helpers;
