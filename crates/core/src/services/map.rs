//! Map points of interest, routes and the simulated location lookup.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rolapet_common::{AppError, AppResult, IdGenerator, SharedClock, config::MapConfig};
use rolapet_db::entities::{
    Difficulty, GeoPoint, Location, PoiKind, PointOfInterest, Route, RouteKind, Waypoint,
};
use rolapet_db::repositories::{PointOfInterestRepository, RouteRepository};
use serde::Deserialize;
use tracing::{debug, info};
use validator::Validate;

use crate::geo::{Radius, distance_km};

/// Average riding speed used to estimate route durations.
const AVERAGE_SPEED_KMH: f64 = 15.0;

/// Input for creating a point of interest.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePoiInput {
    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: PoiKind,
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub lat: f64,
    #[validate(range(
        min = -180.0,
        max = 180.0,
        message = "Longitude must be between -180 and 180"
    ))]
    pub lng: f64,
    pub address: Option<String>,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
    pub created_by: String,
}

/// Point of interest search. Empty fields do not filter.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoiFilter {
    #[serde(default)]
    pub kinds: Vec<PoiKind>,
    pub min_rating: Option<f64>,
    pub search: Option<String>,
    pub near: Option<Radius>,
}

impl PoiFilter {
    fn matches(&self, poi: &PointOfInterest) -> bool {
        if !self.kinds.is_empty() && !self.kinds.contains(&poi.kind) {
            return false;
        }
        if self.min_rating.is_some_and(|min| poi.rating < min) {
            return false;
        }
        if let Some(term) = &self.search {
            let term = term.to_lowercase();
            if !poi.name.to_lowercase().contains(&term)
                && !poi.description.to_lowercase().contains(&term)
            {
                return false;
            }
        }
        self.near.is_none_or(|near| {
            near.contains(GeoPoint {
                lat: poi.location.lat,
                lng: poi.location.lng,
            })
        })
    }
}

/// Input for creating a route.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRouteInput {
    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub created_by: String,
    pub difficulty: Difficulty,
    #[serde(rename = "type")]
    pub kind: RouteKind,
    #[validate(length(min = 2, message = "A route needs at least two waypoints"))]
    pub waypoints: Vec<Waypoint>,
    #[serde(default)]
    pub points_of_interest: Vec<String>,
    /// Minutes; estimated from the distance when absent.
    pub estimated_duration: Option<u32>,
    #[serde(default = "default_public")]
    pub is_public: bool,
}

const fn default_public() -> bool {
    true
}

/// Route search. Without a visibility filter only public routes are returned.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteFilter {
    pub is_public: Option<bool>,
    pub created_by: Option<String>,
    pub difficulty: Option<Difficulty>,
    #[serde(rename = "type")]
    pub kind: Option<RouteKind>,
    pub min_rating: Option<f64>,
}

impl RouteFilter {
    fn matches(&self, route: &Route) -> bool {
        route.is_public == self.is_public.unwrap_or(true)
            && self.created_by.as_ref().is_none_or(|c| *c == route.created_by)
            && self.difficulty.is_none_or(|d| d == route.difficulty)
            && self.kind.is_none_or(|k| k == route.kind)
            && self.min_rating.is_none_or(|min| route.rating >= min)
    }
}

/// Map service.
#[derive(Clone)]
pub struct MapService {
    poi_repo: PointOfInterestRepository,
    route_repo: RouteRepository,
    clock: SharedClock,
    id_gen: IdGenerator,
    center: GeoPoint,
    location_delay: Duration,
    jitter_deg: f64,
}

impl MapService {
    /// Create a new map service.
    #[must_use]
    pub const fn new(
        poi_repo: PointOfInterestRepository,
        route_repo: RouteRepository,
        clock: SharedClock,
        config: &MapConfig,
    ) -> Self {
        Self {
            poi_repo,
            route_repo,
            clock,
            id_gen: IdGenerator::new(),
            center: GeoPoint {
                lat: config.center_lat,
                lng: config.center_lng,
            },
            location_delay: Duration::from_millis(config.location_delay_ms),
            jitter_deg: config.location_jitter_deg,
        }
    }

    /// Create an unverified point of interest.
    pub async fn create_point_of_interest(
        &self,
        input: CreatePoiInput,
    ) -> AppResult<PointOfInterest> {
        input.validate()?;

        let poi = self
            .poi_repo
            .create(PointOfInterest {
                id: self.id_gen.generate(),
                name: input.name,
                description: input.description,
                kind: input.kind,
                location: Location {
                    lat: input.lat,
                    lng: input.lng,
                    address: input.address,
                },
                icon: input.icon,
                rating: 0.0,
                review_count: 0,
                photos: input.photos,
                amenities: input.amenities,
                is_verified: false,
                created_by: input.created_by,
                created_at: self.clock.now(),
            })
            .await?;

        info!(poi_id = %poi.id, kind = ?poi.kind, "Point of interest created");
        Ok(poi)
    }

    /// Points of interest matching the filter.
    pub async fn points_of_interest(&self, filter: &PoiFilter) -> AppResult<Vec<PointOfInterest>> {
        let pois = self.poi_repo.all().await?;
        Ok(pois.into_iter().filter(|p| filter.matches(p)).collect())
    }

    /// Look up a point of interest by ID.
    pub async fn get_point_of_interest(&self, poi_id: &str) -> AppResult<PointOfInterest> {
        self.poi_repo.get_by_id(poi_id).await
    }

    /// Seed the default points of interest into an empty collection.
    pub async fn seed_defaults(&self) -> AppResult<bool> {
        let seeded = self
            .poi_repo
            .seed_if_empty(default_points_of_interest(self.clock.now()))
            .await?;
        if seeded {
            info!("Default points of interest seeded");
        }
        Ok(seeded)
    }

    /// Create a route. Its distance is the length of the waypoint path.
    pub async fn create_route(&self, input: CreateRouteInput) -> AppResult<Route> {
        input.validate()?;
        if input
            .waypoints
            .iter()
            .any(|w| !(-90.0..=90.0).contains(&w.lat) || !(-180.0..=180.0).contains(&w.lng))
        {
            return Err(AppError::Validation(
                "Waypoint coordinates are out of range".to_string(),
            ));
        }

        let mut waypoints = input.waypoints;
        waypoints.sort_by_key(|w| w.order);
        let distance = path_length_km(&waypoints);
        let estimated_duration = input
            .estimated_duration
            .unwrap_or_else(|| (distance / AVERAGE_SPEED_KMH * 60.0).ceil() as u32);

        let now = self.clock.now();
        let route = self
            .route_repo
            .create(Route {
                id: self.id_gen.generate(),
                name: input.name,
                description: input.description,
                created_by: input.created_by,
                distance,
                estimated_duration,
                difficulty: input.difficulty,
                kind: input.kind,
                waypoints,
                points_of_interest: input.points_of_interest,
                rating: 0.0,
                review_count: 0,
                is_public: input.is_public,
                created_at: now,
                updated_at: now,
            })
            .await?;

        info!(route_id = %route.id, distance_km = route.distance, "Route created");
        Ok(route)
    }

    /// Routes matching the filter. Only public routes unless the filter says otherwise.
    pub async fn routes(&self, filter: &RouteFilter) -> AppResult<Vec<Route>> {
        let routes = self.route_repo.all().await?;
        Ok(routes.into_iter().filter(|r| filter.matches(r)).collect())
    }

    /// Look up a route by ID.
    pub async fn get_route(&self, route_id: &str) -> AppResult<Route> {
        self.route_repo.get_by_id(route_id).await
    }

    /// Simulated device location: resolves after the configured delay with a
    /// point scattered around the configured centre.
    pub async fn current_location(&self) -> GeoPoint {
        tokio::time::sleep(self.location_delay).await;

        let point = GeoPoint {
            lat: self.center.lat + (rand::random::<f64>() - 0.5) * self.jitter_deg,
            lng: self.center.lng + (rand::random::<f64>() - 0.5) * self.jitter_deg,
        };
        debug!(lat = point.lat, lng = point.lng, "Location resolved");
        point
    }
}

fn path_length_km(waypoints: &[Waypoint]) -> f64 {
    waypoints
        .windows(2)
        .map(|pair| {
            distance_km(
                GeoPoint {
                    lat: pair[0].lat,
                    lng: pair[0].lng,
                },
                GeoPoint {
                    lat: pair[1].lat,
                    lng: pair[1].lng,
                },
            )
        })
        .sum()
}

/// Verified Bogotá points of interest present in a fresh install.
#[must_use]
pub fn default_points_of_interest(now: DateTime<Utc>) -> Vec<PointOfInterest> {
    let poi = |id: &str,
               name: &str,
               description: &str,
               kind: PoiKind,
               (lat, lng, address): (f64, f64, &str),
               icon: &str,
               (rating, review_count): (f64, usize),
               amenities: &[&str]| PointOfInterest {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        kind,
        location: Location {
            lat,
            lng,
            address: Some(address.to_string()),
        },
        icon: icon.to_string(),
        rating,
        review_count,
        photos: vec![],
        amenities: amenities.iter().map(|a| (*a).to_string()).collect(),
        is_verified: true,
        created_by: "admin".to_string(),
        created_at: now,
    };

    vec![
        poi(
            "poi-1",
            "Estación de Carga Usaquén",
            "Estación de carga rápida para vehículos eléctricos",
            PoiKind::ChargingStation,
            (4.7010, -74.0304, "Calle 120 #7-20, Usaquén"),
            "⚡",
            (4.5, 23),
            &["Carga rápida", "WiFi", "Cafetería"],
        ),
        poi(
            "poi-2",
            "Taller Motos Eléctricas Chapinero",
            "Especialistas en reparación de motos y patinetas eléctricas",
            PoiKind::RepairShop,
            (4.6333, -74.0640, "Carrera 13 #57-30, Chapinero"),
            "🔧",
            (4.8, 45),
            &["Diagnóstico", "Repuestos", "Garantía"],
        ),
        poi(
            "poi-3",
            "Parqueadero Seguro Centro",
            "Parqueadero vigilado con puntos de carga",
            PoiKind::Parking,
            (4.5981, -74.0758, "Calle 19 #5-14, Centro"),
            "🅿️",
            (4.2, 78),
            &["Vigilancia 24h", "Cubierto", "Carga"],
        ),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rolapet_common::FixedClock;
    use rolapet_db::Store;
    use std::sync::Arc;

    fn service() -> MapService {
        let store = Store::in_memory();
        MapService::new(
            PointOfInterestRepository::new(&store),
            RouteRepository::new(&store),
            Arc::new(FixedClock::new(
                Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            )),
            &MapConfig::default(),
        )
    }

    fn poi_input(lat: f64, lng: f64) -> CreatePoiInput {
        CreatePoiInput {
            name: "Punto".to_string(),
            description: String::new(),
            kind: PoiKind::RestArea,
            lat,
            lng,
            address: None,
            icon: String::new(),
            photos: vec![],
            amenities: vec![],
            created_by: "u1".to_string(),
        }
    }

    fn route_input(waypoints: Vec<Waypoint>, is_public: bool) -> CreateRouteInput {
        CreateRouteInput {
            name: "Séptima".to_string(),
            description: String::new(),
            created_by: "u1".to_string(),
            difficulty: Difficulty::Easy,
            kind: RouteKind::Urban,
            waypoints,
            points_of_interest: vec![],
            estimated_duration: None,
            is_public,
        }
    }

    fn waypoint(lat: f64, lng: f64, order: u32) -> Waypoint {
        Waypoint { lat, lng, order }
    }

    #[tokio::test]
    async fn test_poi_coordinates_validated() {
        let service = service();

        assert!(matches!(
            service.create_point_of_interest(poi_input(91.0, 0.0)).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service.create_point_of_interest(poi_input(0.0, -180.5)).await,
            Err(AppError::Validation(_))
        ));
        let poi = service.create_point_of_interest(poi_input(90.0, 180.0)).await.unwrap();
        assert!(!poi.is_verified);
    }

    #[tokio::test]
    async fn test_seed_defaults_once() {
        let service = service();

        assert!(service.seed_defaults().await.unwrap());
        assert!(!service.seed_defaults().await.unwrap());

        let chargers = service
            .points_of_interest(&PoiFilter {
                kinds: vec![PoiKind::ChargingStation],
                ..PoiFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(chargers.len(), 1);
        assert_eq!(chargers[0].name, "Estación de Carga Usaquén");
    }

    #[tokio::test]
    async fn test_poi_radius_filter() {
        let service = service();
        service.seed_defaults().await.unwrap();

        let near_centro = PoiFilter {
            near: Some(Radius {
                center: GeoPoint {
                    lat: 4.5981,
                    lng: -74.0758,
                },
                radius_km: 2.0,
            }),
            ..PoiFilter::default()
        };
        let found = service.points_of_interest(&near_centro).await.unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, PoiKind::Parking);
    }

    #[tokio::test]
    async fn test_route_needs_two_waypoints() {
        let service = service();

        let result = service
            .create_route(route_input(vec![waypoint(4.6, -74.08, 0)], true))
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_route_distance_and_visibility() {
        let service = service();
        let route = service
            .create_route(route_input(
                vec![waypoint(4.70, -74.03, 1), waypoint(4.60, -74.08, 0)],
                true,
            ))
            .await
            .unwrap();
        service
            .create_route(route_input(
                vec![waypoint(4.60, -74.08, 0), waypoint(4.61, -74.08, 1)],
                false,
            ))
            .await
            .unwrap();

        assert_eq!(route.waypoints[0].order, 0);
        assert!(route.distance > 10.0 && route.distance < 15.0);
        assert!(route.estimated_duration > 0);

        assert_eq!(service.routes(&RouteFilter::default()).await.unwrap().len(), 1);
        let private = RouteFilter {
            is_public: Some(false),
            ..RouteFilter::default()
        };
        assert_eq!(service.routes(&private).await.unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_current_location_near_center() {
        let service = service();
        let config = MapConfig::default();

        let point = service.current_location().await;

        assert!((point.lat - config.center_lat).abs() <= config.location_jitter_deg / 2.0);
        assert!((point.lng - config.center_lng).abs() <= config.location_jitter_deg / 2.0);
    }
}
