use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state, Next},
    routing::{delete, get, patch, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::Role;
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::handlers::{health::health, protected, public};
use crate::middleware::{audited, require_auth, require_roles};
use crate::state::AppState;

const PET_OWNERS: &[Role] = &[Role::PetOwner];

/// Full HTTP surface with shared state applied
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1/auth", auth_routes(&state))
        .nest("/api/v1/pets", pet_routes(&state))
        .nest("/api/v1/medical-records", medical_record_routes(&state))
        .nest("/api/v1/appointments", appointment_routes(&state))
        .fallback(not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_routes(state: &AppState) -> Router<AppState> {
    let session = Router::new()
        .route("/me", get(protected::auth::me))
        .route("/verify-email", post(protected::auth::verify_email))
        .route("/logout", audited(post(protected::auth::logout), &state.audit, "logout"))
        .route_layer(from_fn_with_state(state.gate.clone(), require_auth));

    Router::new()
        .route("/register", post(public::auth::register))
        .route("/login", post(public::auth::login))
        .merge(session)
}

// Layers added later run first: auth, then roles, then the per-route audit
fn pet_routes(state: &AppState) -> Router<AppState> {
    use protected::pets;
    let sink = &state.audit;

    Router::new()
        .route("/", audited(get(pets::list), sink, "list_pets"))
        .route("/", audited(post(pets::create), sink, "create_pet"))
        .route("/:id", audited(get(pets::get), sink, "view_pet"))
        .route("/:id", audited(put(pets::update), sink, "update_pet"))
        .route("/:id", audited(delete(pets::delete), sink, "delete_pet"))
        .route("/:id/lost", audited(post(pets::report_lost), sink, "report_lost_pet"))
        .route_layer(from_fn(|request: Request, next: Next| {
            require_roles(PET_OWNERS, request, next)
        }))
        .route_layer(from_fn_with_state(state.gate.clone(), require_auth))
}

// Any active role; the handlers scope everything to the caller
fn medical_record_routes(state: &AppState) -> Router<AppState> {
    use protected::medical_records as records;
    let sink = &state.audit;

    Router::new()
        .route("/", audited(get(records::list), sink, "list_medical_records"))
        .route("/", audited(post(records::create), sink, "create_medical_record"))
        .route("/:id", audited(get(records::get), sink, "view_medical_record"))
        .route("/:id", audited(put(records::update), sink, "update_medical_record"))
        .route("/:id", audited(delete(records::delete), sink, "delete_medical_record"))
        .route_layer(from_fn_with_state(state.gate.clone(), require_auth))
}

fn appointment_routes(state: &AppState) -> Router<AppState> {
    use protected::appointments;
    let sink = &state.audit;

    Router::new()
        .route("/", audited(get(appointments::list), sink, "list_appointments"))
        .route("/", audited(post(appointments::create), sink, "create_appointment"))
        .route("/:id", audited(get(appointments::get), sink, "view_appointment"))
        .route("/:id", audited(put(appointments::update), sink, "update_appointment"))
        .route("/:id", audited(delete(appointments::delete), sink, "delete_appointment"))
        .route("/:id/cancel", audited(patch(appointments::cancel), sink, "cancel_appointment"))
        .route_layer(from_fn_with_state(state.gate.clone(), require_auth))
}

async fn not_found() -> ApiError {
    ApiError::not_found("Endpoint not found")
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::PATCH])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let origins = &config.security.cors_origins;
    if origins.iter().any(|origin| origin == "*") {
        // Credentials cannot be combined with a wildcard origin
        return base.allow_origin(AllowOrigin::any());
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring unparseable CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    base.allow_origin(AllowOrigin::list(origins)).allow_credentials(true)
}
