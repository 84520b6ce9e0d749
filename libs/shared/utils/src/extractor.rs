use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use shared_config::AppConfig;
use shared_models::auth::{CredentialKind, Participant};
use shared_models::error::AppError;

use crate::jwt::validate_token;

/// Header carrying the clinician-kind credential. The patient-kind credential
/// travels in the standard `Authorization: Bearer` header.
pub const CLINICIAN_TOKEN_HEADER: &str = "x-clinician-token";

/// Resolves a credential pair to a verified participant.
///
/// The patient slot is tried first. A verification failure there falls back
/// to the clinician slot only when one was separately supplied; it never
/// falls through to a default identity.
pub fn resolve_participant(
    patient_token: Option<&str>,
    clinician_token: Option<&str>,
    jwt_secret: &str,
) -> Result<Participant, AppError> {
    if let Some(token) = patient_token {
        match validate_token(token, jwt_secret) {
            Ok(user) => {
                return Ok(Participant {
                    user,
                    kind: CredentialKind::Patient,
                })
            }
            Err(reason) => {
                if let Some(dtoken) = clinician_token {
                    let user = validate_token(dtoken, jwt_secret).map_err(AppError::Auth)?;
                    return Ok(Participant {
                        user,
                        kind: CredentialKind::Clinician,
                    });
                }
                return Err(AppError::Auth(reason));
            }
        }
    }

    if let Some(dtoken) = clinician_token {
        let user = validate_token(dtoken, jwt_secret).map_err(AppError::Auth)?;
        return Ok(Participant {
            user,
            kind: CredentialKind::Clinician,
        });
    }

    Err(AppError::Auth("Missing credentials".to_string()))
}

/// Middleware for dual-credential authentication. On success the verified
/// `Participant` is inserted into the request extensions.
pub async fn dual_auth_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let patient_token = request
        .headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    let clinician_token = request
        .headers()
        .get(CLINICIAN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok());

    let participant =
        resolve_participant(patient_token, clinician_token, &config.supabase_jwt_secret)?;

    request.extensions_mut().insert(participant);

    Ok(next.run(request).await)
}
