use actix_web::HttpResponse;
use serde::Serialize;

/// Error body shared by every non-2xx JSON response.
#[derive(Serialize)]
pub(crate) struct JsonResponse {
    pub(crate) status: String,
    pub(crate) code: u32,
    pub(crate) message: String,
}

impl JsonResponse {
    fn new(code: u32, message: &str) -> Self {
        JsonResponse {
            status: "Error".to_string(),
            code,
            message: message.to_string(),
        }
    }

    pub(crate) fn not_found(message: &str) -> HttpResponse {
        let msg = if !message.trim().is_empty() {
            message
        } else {
            "Object not found"
        };
        HttpResponse::NotFound().json(Self::new(404, msg))
    }

    pub(crate) fn bad_request(message: &str) -> HttpResponse {
        let msg = if !message.trim().is_empty() {
            message
        } else {
            "Bad request"
        };
        HttpResponse::BadRequest().json(Self::new(400, msg))
    }

    pub(crate) fn service_unavailable(message: &str) -> HttpResponse {
        let msg = if !message.trim().is_empty() {
            message
        } else {
            "Service unavailable"
        };
        HttpResponse::ServiceUnavailable().json(Self::new(503, msg))
    }
}
