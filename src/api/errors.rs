//! # Manejo de errores de la aplicación
//!
//! Jerarquía única de errores con thiserror. Cada clase de fallo del motor de
//! reservas tiene su propia variante, de modo que el que llama siempre puede
//! distinguir el motivo del rechazo, y cada variante mapea a un código HTTP.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use std::error::Error;
use thiserror::Error;

/// Tipos de error de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    /// Error de base de datos con contexto de la operación
    #[error("Error de base de datos en operación '{operation}': {source}")]
    Database {
        operation: String,
        #[source]
        source: mongodb::error::Error,
    },

    /// Error de validación de la petición
    #[error("Error de validación: {0}")]
    Validation(String),

    /// Falta la identidad autenticada o es ilegible
    #[error("No autorizado: {0}")]
    Unauthorized(String),

    /// La identidad no es el titular de la reserva ni el gerente del restaurante
    #[error("Operación no permitida: {0}")]
    Forbidden(String),

    /// Error de recurso no encontrado
    #[error("No encontrado: {0}")]
    NotFound(String),

    /// La franja solicitada empieza en una hora ya pasada
    #[error("No se puede reservar en una hora ya pasada")]
    PastTime,

    /// El inicio no cae en un múltiplo de la unidad de franja
    #[error("La hora de la reserva debe ir en franjas de {unidad} minutos")]
    InvalidTimeUnit { unidad: i64 },

    /// Ya hay una reserva confirmada que solapa la franja pedida
    #[error("La mesa ya tiene una reserva confirmada en ese horario")]
    SlotConflict,

    /// El número de personas supera la capacidad de la mesa
    #[error("El número de personas ({pedido}) supera la capacidad de la mesa ({capacidad})")]
    CapacityExceeded { pedido: i32, capacidad: i32 },

    /// La reserva ya fue aprobada o rechazada por el gerente
    #[error("La reserva ya fue procesada")]
    AlreadyProcessed,

    /// La reserva está cancelada o completada y no admite más transiciones
    #[error("La reserva está en un estado final y no admite cambios")]
    TerminalState,

    /// El checkin requiere una reserva confirmada
    #[error("Solo una reserva aprobada permite el checkin")]
    NotConfirmed,

    /// El checkin llegó fuera de la ventana de llegada
    #[error("No es la hora de llegada de la reserva")]
    OutsideCheckinWindow,

    /// Error interno simple
    #[error("Error interno: {0}")]
    Internal(String),
}

impl AppError {
    /// Crea un error de base de datos con contexto de operación
    pub fn database(operation: &str, source: mongodb::error::Error) -> Self {
        Self::Database {
            operation: operation.to_string(),
            source,
        }
    }

    /// Etiqueta corta de la clase de error, para el cuerpo JSON de la respuesta
    fn kind(&self) -> &'static str {
        match self {
            Self::Database { .. } => "base_de_datos",
            Self::Validation(_) => "validacion",
            Self::Unauthorized(_) => "no_autorizado",
            Self::Forbidden(_) => "sin_permiso",
            Self::NotFound(_) => "no_encontrado",
            Self::PastTime => "hora_pasada",
            Self::InvalidTimeUnit { .. } => "franja_invalida",
            Self::SlotConflict => "conflicto_horario",
            Self::CapacityExceeded { .. } => "capacidad_superada",
            Self::AlreadyProcessed => "ya_procesada",
            Self::TerminalState => "estado_final",
            Self::NotConfirmed => "no_confirmada",
            Self::OutsideCheckinWindow => "fuera_de_ventana",
            Self::Internal(_) => "interno",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_)
            | Self::PastTime
            | Self::InvalidTimeUnit { .. }
            | Self::CapacityExceeded { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::SlotConflict
            | Self::AlreadyProcessed
            | Self::TerminalState
            | Self::NotConfirmed
            | Self::OutsideCheckinWindow => StatusCode::CONFLICT,
            Self::Database { .. } | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            Self::Database { operation, source } => {
                tracing::error!(
                    operation = %operation,
                    error = %source,
                    error_chain = ?source.source(),
                    "Error de base de datos"
                );
                // El detalle del driver no sale al cliente
                HttpResponse::InternalServerError().json(ErrorResponse {
                    error: "base_de_datos".to_string(),
                    message: "Error interno del servidor".to_string(),
                })
            }
            error => {
                tracing::warn!(error = %error, "Operación rechazada");
                HttpResponse::build(self.status_code()).json(ErrorResponse {
                    error: error.kind().to_string(),
                    message: error.to_string(),
                })
            }
        }
    }
}

#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

pub type AppResult<T> = Result<T, AppError>;

/// Extension trait para Results que añade logging de la cadena de errores
pub trait ErrorLogExt<T, E> {
    /// Loggea la cadena de errores con contexto adicional
    fn log_error_context(self, context: &str) -> Result<T, E>;
}

impl<T, E> ErrorLogExt<T, E> for Result<T, E>
where
    E: Error + 'static,
{
    fn log_error_context(self, context: &str) -> Result<T, E> {
        if let Err(ref error) = self {
            let mut error_chain = Vec::new();
            let mut current_error: Option<&dyn Error> = Some(error);

            while let Some(err) = current_error {
                error_chain.push(err.to_string());
                current_error = err.source();
            }

            tracing::error!(
                context = %context,
                error_chain = ?error_chain,
                "Error with full chain (with context)"
            );
        }
        self
    }
}
