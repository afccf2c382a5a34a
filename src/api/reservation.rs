//! # API de Reservas
//!
//! Operaciones del titular sobre sus reservas:
//! - Crear una reserva (queda pendiente de aprobación)
//! - Consultar una reserva propia
//! - Editar mesa, franja o número de personas
//! - Eliminar una reserva
//! - Checkin al llegar al restaurante
//!
//! Todas las operaciones requieren la identidad de la cabecera `X-Usuario-Id`.

use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse, Responder};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use super::{usuario_autenticado, AppError, AppResult};
use crate::config::Config;
use crate::db::{MongoRepo, Reserva};
use crate::services::booking::{self, EdicionReserva, NuevaReserva};

/// Estructura para crear una nueva reserva
#[derive(Deserialize)]
struct MakeReservation {
    /// ID del restaurante (ObjectId como string)
    id_restaurante: String,
    /// ID de la mesa a reservar (ObjectId como string)
    id_mesa: String,
    /// Nombre completo del cliente
    nombre_cliente: String,
    /// Email del cliente (usado para confirmaciones)
    email_cliente: String,
    /// Teléfono del cliente
    telefono_cliente: String,
    /// Número de comensales
    numero_personas: i32,
    /// Fecha de la reserva (formato YYYY-MM-DD)
    fecha: String,
    /// Hora de la reserva (formato HH:MM)
    hora: String,
}

/// Campos editables de una reserva existente
#[derive(Deserialize)]
struct UpdateReservation {
    id_mesa: String,
    numero_personas: i32,
    fecha: String,
    hora: String,
}

/// Versión de la reserva para envío al frontend, con ObjectIds convertidos
/// a strings y la franja desglosada en fecha y hora.
#[derive(Serialize)]
pub(crate) struct ReservationResponse {
    /// Número público de la reserva
    numero: i64,
    id_restaurante: String,
    id_mesa: String,
    nombre_cliente: String,
    email_cliente: String,
    telefono_cliente: String,
    numero_personas: i32,
    fecha: String,
    hora: String,
    /// Estado actual ("pendiente", "confirmada", "cancelada", "completada")
    estado: String,
}

impl From<Reserva> for ReservationResponse {
    fn from(reserva: Reserva) -> Self {
        let inicio = reserva.inicio_utc();
        ReservationResponse {
            numero: reserva.numero,
            id_restaurante: reserva.id_restaurante.to_hex(),
            id_mesa: reserva.id_mesa.to_hex(),
            nombre_cliente: reserva.nombre_cliente,
            email_cliente: reserva.email_cliente,
            telefono_cliente: reserva.telefono_cliente,
            numero_personas: reserva.numero_personas,
            fecha: inicio.format("%Y-%m-%d").to_string(),
            hora: inicio.format("%H:%M").to_string(),
            estado: reserva.estado.as_str().to_string(),
        }
    }
}

/// Valida un email de forma básica
fn validate_email(email: &str) -> bool {
    email.contains('@') && email.contains('.')
}

/// Valida y parsea una fecha en formato YYYY-MM-DD
pub(crate) fn validate_date(date_str: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .map_err(|_| AppError::Validation("Formato de fecha inválido, use YYYY-MM-DD".to_string()))
}

/// Valida y parsea una hora en formato HH:MM
fn validate_time(time_str: &str) -> AppResult<NaiveTime> {
    NaiveTime::parse_from_str(time_str, "%H:%M")
        .map_err(|_| AppError::Validation("Formato de hora inválido, use HH:MM".to_string()))
}

/// Combina fecha y hora de la petición en el inicio de la franja (UTC)
fn parse_inicio(fecha: &str, hora: &str) -> AppResult<DateTime<Utc>> {
    let fecha = validate_date(fecha)?;
    let hora = validate_time(hora)?;
    Ok(fecha.and_time(hora).and_utc())
}

/// Convierte un id textual a ObjectId
pub(crate) fn parse_object_id(valor: &str, campo: &str) -> AppResult<ObjectId> {
    ObjectId::parse_str(valor)
        .map_err(|_| AppError::Validation(format!("ID de {} inválido", campo)))
}

/// Crea una nueva reserva
///
/// # Validaciones
/// - Nombre del cliente no puede estar vacío
/// - Email debe tener formato válido básico
/// - Teléfono no puede estar vacío
/// - Número de personas debe ser mayor a 0
/// - Fecha y hora deben ser válidas y caer en una franja futura alineada
/// - La mesa debe existir, pertenecer al restaurante y tener capacidad
/// - Ninguna reserva confirmada puede ocupar ya la franja
///
/// # Errores
/// - `400 Bad Request`: datos inválidos, hora pasada o fuera de franja
/// - `401 Unauthorized`: falta la identidad
/// - `404 Not Found`: restaurante o mesa no encontrados
/// - `409 Conflict`: franja ya ocupada por una reserva confirmada
#[post("/reservations")]
async fn make_reservation(
    repo: web::Data<MongoRepo>,
    config: web::Data<Config>,
    data: web::Json<MakeReservation>,
    req: HttpRequest,
) -> AppResult<impl Responder> {
    let id_cliente = usuario_autenticado(&req)?;

    // Validaciones de entrada
    if data.nombre_cliente.trim().is_empty() {
        return Err(AppError::Validation(
            "El nombre del cliente es requerido".to_string(),
        ));
    }

    if !validate_email(&data.email_cliente) {
        return Err(AppError::Validation("Email inválido".to_string()));
    }

    if data.telefono_cliente.trim().is_empty() {
        return Err(AppError::Validation(
            "El teléfono del cliente es requerido".to_string(),
        ));
    }

    if data.numero_personas <= 0 {
        return Err(AppError::Validation(
            "El número de personas debe ser mayor a 0".to_string(),
        ));
    }

    let inicio = parse_inicio(&data.fecha, &data.hora)?;
    let id_restaurante = parse_object_id(&data.id_restaurante, "restaurante")?;
    let id_mesa = parse_object_id(&data.id_mesa, "mesa")?;

    let reserva = booking::create_reservation(
        repo.get_ref(),
        repo.get_ref(),
        config.get_ref(),
        NuevaReserva {
            id_restaurante,
            id_mesa,
            id_cliente,
            nombre_cliente: data.nombre_cliente.clone(),
            email_cliente: data.email_cliente.clone(),
            telefono_cliente: data.telefono_cliente.clone(),
            numero_personas: data.numero_personas,
            inicio,
        },
    )
    .await?;

    Ok(HttpResponse::Ok().json(ReservationResponse::from(reserva)))
}

/// Consulta una reserva propia por su número público
///
/// # Errores
/// - `401 Unauthorized`: falta la identidad
/// - `403 Forbidden`: la reserva pertenece a otro titular
/// - `404 Not Found`: reserva no encontrada
#[get("/reservations/{numero}")]
async fn get_reservation(
    repo: web::Data<MongoRepo>,
    path: web::Path<i64>,
    req: HttpRequest,
) -> AppResult<impl Responder> {
    let id_cliente = usuario_autenticado(&req)?;
    let numero = path.into_inner();

    let reserva = booking::get_reservation(repo.get_ref(), numero, &id_cliente).await?;

    Ok(HttpResponse::Ok().json(ReservationResponse::from(reserva)))
}

/// Edita una reserva propia
///
/// La nueva franja se valida igual que al crear (excluyendo la franja actual
/// de la propia reserva). Si la reserva estaba confirmada vuelve a pendiente
/// y requiere nueva aprobación del gerente.
#[put("/reservations/{numero}")]
async fn update_reservation(
    repo: web::Data<MongoRepo>,
    config: web::Data<Config>,
    path: web::Path<i64>,
    data: web::Json<UpdateReservation>,
    req: HttpRequest,
) -> AppResult<impl Responder> {
    let id_cliente = usuario_autenticado(&req)?;
    let numero = path.into_inner();

    if data.numero_personas <= 0 {
        return Err(AppError::Validation(
            "El número de personas debe ser mayor a 0".to_string(),
        ));
    }

    let inicio = parse_inicio(&data.fecha, &data.hora)?;
    let id_mesa = parse_object_id(&data.id_mesa, "mesa")?;

    let reserva = booking::update_reservation(
        repo.get_ref(),
        repo.get_ref(),
        config.get_ref(),
        numero,
        &id_cliente,
        EdicionReserva {
            id_mesa,
            numero_personas: data.numero_personas,
            inicio,
        },
    )
    .await?;

    Ok(HttpResponse::Ok().json(ReservationResponse::from(reserva)))
}

/// Elimina una reserva propia, en cualquier estado
#[delete("/reservations/{numero}")]
async fn delete_reservation(
    repo: web::Data<MongoRepo>,
    path: web::Path<i64>,
    req: HttpRequest,
) -> AppResult<impl Responder> {
    let id_cliente = usuario_autenticado(&req)?;
    let numero = path.into_inner();

    booking::delete_reservation(repo.get_ref(), numero, &id_cliente).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Reserva eliminada correctamente",
        "numero": numero,
    })))
}

/// Checkin de una reserva confirmada dentro de la ventana de llegada
///
/// # Errores
/// - `409 Conflict`: reserva sin confirmar, en estado final o fuera de la
///   ventana de llegada
#[post("/reservations/{numero}/checkin")]
async fn checkin_reservation(
    repo: web::Data<MongoRepo>,
    config: web::Data<Config>,
    path: web::Path<i64>,
    req: HttpRequest,
) -> AppResult<impl Responder> {
    let id_cliente = usuario_autenticado(&req)?;
    let numero = path.into_inner();

    let reserva =
        booking::checkin_reservation(repo.get_ref(), config.get_ref(), numero, &id_cliente).await?;

    Ok(HttpResponse::Ok().json(ReservationResponse::from(reserva)))
}

/// Configura las rutas relacionadas con reservas
///
/// # Rutas disponibles
/// - `POST /reservations` - Crear nueva reserva
/// - `GET /reservations/{numero}` - Consultar reserva propia
/// - `PUT /reservations/{numero}` - Editar reserva propia
/// - `DELETE /reservations/{numero}` - Eliminar reserva propia
/// - `POST /reservations/{numero}/checkin` - Checkin de llegada
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(make_reservation);
    cfg.service(get_reservation);
    cfg.service(update_reservation);
    cfg.service(delete_reservation);
    cfg.service(checkin_reservation);
}
