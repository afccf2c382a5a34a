//! # API del gerente
//!
//! Operaciones del gerente sobre las reservas de su restaurante:
//! - Aprobar reservas pendientes
//! - Rechazar reservas pendientes
//! - Listar reservas con filtros opcionales
//!
//! La identidad llega en `X-Usuario-Id`; debe coincidir con el gerente del
//! restaurante de la ruta.

use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;

use super::reservation::{parse_object_id, validate_date, ReservationResponse};
use super::{usuario_autenticado, AppError, AppResult};
use crate::db::{EstadoReserva, FiltroReservas, MongoRepo};
use crate::services::partner;

/// Parámetros de consulta para listar reservas
#[derive(Deserialize)]
struct ReservationQuery {
    /// Filtrar por fecha específica (formato YYYY-MM-DD)
    fecha: Option<String>,
    /// Filtrar por estado ("pendiente", "confirmada", "cancelada", "completada")
    estado: Option<String>,
}

/// Aprueba una reserva pendiente
///
/// # Errores
/// - `401 Unauthorized`: falta la identidad
/// - `403 Forbidden`: no eres el gerente de este restaurante
/// - `404 Not Found`: reserva no encontrada en este restaurante
/// - `409 Conflict`: reserva ya procesada, en estado final, o franja que otra
///   confirmada ocupó mientras tanto
#[post("/restaurants/{id_restaurante}/reservations/{numero}/approve")]
async fn approve_reservation(
    repo: web::Data<MongoRepo>,
    path: web::Path<(String, i64)>,
    req: HttpRequest,
) -> AppResult<impl Responder> {
    let id_gerente = usuario_autenticado(&req)?;
    let (id_restaurante, numero) = path.into_inner();
    let id_restaurante = parse_object_id(&id_restaurante, "restaurante")?;

    let reserva = partner::approve_reservation(
        repo.get_ref(),
        repo.get_ref(),
        id_restaurante,
        numero,
        &id_gerente,
    )
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Reserva confirmada correctamente",
        "numero": reserva.numero,
        "estado": reserva.estado.as_str(),
    })))
}

/// Rechaza una reserva pendiente
#[post("/restaurants/{id_restaurante}/reservations/{numero}/reject")]
async fn reject_reservation(
    repo: web::Data<MongoRepo>,
    path: web::Path<(String, i64)>,
    req: HttpRequest,
) -> AppResult<impl Responder> {
    let id_gerente = usuario_autenticado(&req)?;
    let (id_restaurante, numero) = path.into_inner();
    let id_restaurante = parse_object_id(&id_restaurante, "restaurante")?;

    let reserva = partner::reject_reservation(
        repo.get_ref(),
        repo.get_ref(),
        id_restaurante,
        numero,
        &id_gerente,
    )
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Reserva rechazada correctamente",
        "numero": reserva.numero,
        "estado": reserva.estado.as_str(),
    })))
}

/// Lista las reservas del restaurante con filtros opcionales
///
/// # Filtros disponibles
/// - `fecha`: filtrar por fecha específica (formato YYYY-MM-DD)
/// - `estado`: filtrar por estado de la reserva
#[get("/restaurants/{id_restaurante}/reservations")]
async fn list_reservations(
    repo: web::Data<MongoRepo>,
    path: web::Path<String>,
    query: web::Query<ReservationQuery>,
    req: HttpRequest,
) -> AppResult<impl Responder> {
    let id_gerente = usuario_autenticado(&req)?;
    let id_restaurante = parse_object_id(&path.into_inner(), "restaurante")?;

    let filtro = FiltroReservas {
        fecha: query
            .fecha
            .as_deref()
            .map(validate_date)
            .transpose()?,
        estado: query
            .estado
            .as_deref()
            .map(|valor| {
                valor.parse::<EstadoReserva>().map_err(|_| {
                    AppError::Validation(format!("Estado de reserva desconocido: {}", valor))
                })
            })
            .transpose()?,
    };

    let reservas = partner::list_reservations(
        repo.get_ref(),
        repo.get_ref(),
        id_restaurante,
        &id_gerente,
        &filtro,
    )
    .await?;

    let results: Vec<ReservationResponse> = reservas
        .into_iter()
        .map(ReservationResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(results))
}

/// Configura las rutas del gerente
///
/// # Rutas disponibles
/// - `POST /restaurants/{id}/reservations/{numero}/approve` - Aprobar reserva
/// - `POST /restaurants/{id}/reservations/{numero}/reject` - Rechazar reserva
/// - `GET /restaurants/{id}/reservations` - Listar reservas del restaurante
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(approve_reservation);
    cfg.service(reject_reservation);
    cfg.service(list_reservations);
}
