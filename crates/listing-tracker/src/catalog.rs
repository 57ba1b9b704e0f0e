//! Routes exposed by the rental-listing API, grouped the way the tracker groups them.

use serde::Serialize;

use crate::tracker::domain::{Endpoint, HttpMethod, Status, TrackerDocument, TrackerRow};

pub const API_PREFIX: &str = "/api/v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Area {
    Auth,
    Rooms,
    Photos,
    Payments,
    Messaging,
    Tenancies,
}

impl Area {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::Auth,
            Self::Rooms,
            Self::Photos,
            Self::Payments,
            Self::Messaging,
            Self::Tenancies,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Auth => "Auth",
            Self::Rooms => "Rooms",
            Self::Photos => "Photos",
            Self::Payments => "Payments",
            Self::Messaging => "Messaging",
            Self::Tenancies => "Tenancies",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogRoute {
    pub area: Area,
    pub endpoint: Endpoint,
    pub screen: &'static str,
}

struct RouteDefinition {
    area: Area,
    method: HttpMethod,
    path: &'static str,
    screen: &'static str,
}

const fn route(
    area: Area,
    method: HttpMethod,
    path: &'static str,
    screen: &'static str,
) -> RouteDefinition {
    RouteDefinition {
        area,
        method,
        path,
        screen,
    }
}

const STANDARD_ROUTES: &[RouteDefinition] = &[
    route(Area::Auth, HttpMethod::Post, "/auth/register/", "Sign up"),
    route(Area::Auth, HttpMethod::Post, "/auth/login/", "Log in"),
    route(Area::Auth, HttpMethod::Post, "/auth/token/refresh/", "Session refresh (background)"),
    route(Area::Auth, HttpMethod::Post, "/auth/logout/", "Account menu"),
    route(Area::Auth, HttpMethod::Post, "/auth/password-reset/", "Forgot password"),
    route(Area::Auth, HttpMethod::Post, "/auth/password-reset/confirm/", "Reset password"),
    route(Area::Rooms, HttpMethod::Get, "/rooms/", "Browse rooms"),
    route(Area::Rooms, HttpMethod::Get, "/rooms/{pk}/", "Room detail"),
    route(Area::Rooms, HttpMethod::Post, "/rooms/", "List a room"),
    route(Area::Rooms, HttpMethod::Patch, "/rooms/{pk}/", "Edit listing"),
    route(Area::Rooms, HttpMethod::Post, "/rooms/{pk}/soft-delete/", "My listings"),
    route(Area::Rooms, HttpMethod::Get, "/search/rooms/", "Search results"),
    route(Area::Rooms, HttpMethod::Get, "/rooms/nearby/", "Map view"),
    route(Area::Photos, HttpMethod::Post, "/rooms/{pk}/photos/", "Listing photos"),
    route(Area::Photos, HttpMethod::Delete, "/rooms/{pk}/photos/{photo_id}/", "Listing photos"),
    route(Area::Payments, HttpMethod::Post, "/payments/checkout/rooms/{pk}/", "Checkout"),
    route(Area::Payments, HttpMethod::Get, "/payments/success/", "Payment success"),
    route(Area::Payments, HttpMethod::Get, "/payments/cancel/", "Payment cancelled"),
    route(Area::Payments, HttpMethod::Post, "/payments/webhook/", "n/a (Stripe webhook)"),
    route(Area::Messaging, HttpMethod::Get, "/messages/threads/", "Inbox"),
    route(Area::Messaging, HttpMethod::Get, "/messages/threads/{thread_id}/messages/", "Thread"),
    route(Area::Messaging, HttpMethod::Post, "/messages/threads/{thread_id}/messages/", "Thread composer"),
    route(Area::Messaging, HttpMethod::Post, "/messages/threads/{thread_id}/read/", "Thread"),
    route(Area::Messaging, HttpMethod::Post, "/rooms/{room_id}/start-thread/", "Room detail (contact)"),
    route(Area::Tenancies, HttpMethod::Get, "/tenancies/mine/", "My tenancies"),
    route(Area::Tenancies, HttpMethod::Post, "/tenancies/propose/", "Propose tenancy"),
];

/// Known API routes. Tracker rows are checked against it and fresh trackers are seeded from it.
#[derive(Debug, Clone)]
pub struct RouteCatalog {
    routes: Vec<CatalogRoute>,
}

impl RouteCatalog {
    pub fn new(routes: Vec<CatalogRoute>) -> Self {
        Self { routes }
    }

    pub fn standard() -> Self {
        let routes = STANDARD_ROUTES
            .iter()
            .map(|definition| CatalogRoute {
                area: definition.area,
                endpoint: Endpoint::new(
                    definition.method,
                    format!("{API_PREFIX}{}", definition.path),
                ),
                screen: definition.screen,
            })
            .collect();
        Self::new(routes)
    }

    pub fn routes(&self) -> &[CatalogRoute] {
        &self.routes
    }

    pub fn by_area(&self, area: Area) -> impl Iterator<Item = &CatalogRoute> {
        self.routes.iter().filter(move |route| route.area == area)
    }

    pub fn contains(&self, endpoint: &Endpoint) -> bool {
        self.routes
            .iter()
            .any(|route| route.endpoint.matches(endpoint))
    }

    /// A tracker with one Todo row per route and one section per area.
    pub fn seed_document(&self, title: &str) -> TrackerDocument {
        let mut document = TrackerDocument::new(title);

        for area in Area::ordered() {
            for route in self.by_area(area) {
                let row = TrackerRow::new(route.endpoint.clone(), route.screen, Status::Todo);
                // Routes are unique, so insertion cannot collide.
                if let Err(err) = document.insert_row(area.label(), row) {
                    tracing::warn!(error = %err, "skipping catalog route");
                }
            }
        }

        document
    }
}

impl Default for RouteCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
