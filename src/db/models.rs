//! # Modelos de dominio
//!
//! Documentos persistidos (`Reserva`, `Mesa`, `Restaurant`) y el estado de
//! reserva con sus transiciones. Los instantes se guardan como timestamps
//! unix (i64); las operaciones de dominio trabajan con `chrono`.

use chrono::{DateTime, Duration, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::api::AppError;

/// Estado de una reserva.
///
/// Las transiciones (`aprobar`, `rechazar`, `checkin`, `editar`,
/// `expirar_no_show`) son la única vía de mutación: ningún servicio asigna el
/// campo `estado` por su cuenta. `Cancelada` y `Completada` son finales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstadoReserva {
    /// Creada por el cliente, a la espera del gerente
    Pendiente,
    /// Aprobada por el gerente
    Confirmada,
    /// Rechazada, cancelada por edición imposible o vencida por no-show
    Cancelada,
    /// El cliente hizo checkin dentro de la ventana de llegada
    Completada,
}

impl EstadoReserva {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstadoReserva::Pendiente => "pendiente",
            EstadoReserva::Confirmada => "confirmada",
            EstadoReserva::Cancelada => "cancelada",
            EstadoReserva::Completada => "completada",
        }
    }

    fn es_terminal(self) -> bool {
        matches!(self, EstadoReserva::Cancelada | EstadoReserva::Completada)
    }

    /// Aprobación del gerente: solo una reserva pendiente puede confirmarse.
    pub fn aprobar(self) -> Result<EstadoReserva, AppError> {
        match self {
            EstadoReserva::Pendiente => Ok(EstadoReserva::Confirmada),
            EstadoReserva::Confirmada => Err(AppError::AlreadyProcessed),
            _ => Err(AppError::TerminalState),
        }
    }

    /// Rechazo del gerente: solo una reserva pendiente puede rechazarse.
    pub fn rechazar(self) -> Result<EstadoReserva, AppError> {
        match self {
            EstadoReserva::Pendiente => Ok(EstadoReserva::Cancelada),
            EstadoReserva::Confirmada => Err(AppError::AlreadyProcessed),
            _ => Err(AppError::TerminalState),
        }
    }

    /// Checkin del titular. Requiere una reserva confirmada y que `ahora`
    /// caiga dentro de `[inicio - margen, inicio + margen]`.
    pub fn checkin(
        self,
        ahora: DateTime<Utc>,
        inicio: DateTime<Utc>,
        margen: Duration,
    ) -> Result<EstadoReserva, AppError> {
        match self {
            EstadoReserva::Confirmada => {
                if ahora < inicio - margen || ahora > inicio + margen {
                    return Err(AppError::OutsideCheckinWindow);
                }
                Ok(EstadoReserva::Completada)
            }
            EstadoReserva::Pendiente => Err(AppError::NotConfirmed),
            _ => Err(AppError::TerminalState),
        }
    }

    /// Edición del titular. Una reserva confirmada vuelve a pendiente y
    /// requiere nueva aprobación del gerente.
    pub fn editar(self) -> Result<EstadoReserva, AppError> {
        if self.es_terminal() {
            return Err(AppError::TerminalState);
        }
        Ok(EstadoReserva::Pendiente)
    }

    /// Transición de no-show, si corresponde. Solo una reserva confirmada
    /// cuya ventana de llegada ya venció pasa a cancelada; en cualquier otro
    /// caso no hay transición, así que aplicarla repetidas veces es inocuo.
    pub fn expirar_no_show(
        self,
        ahora: DateTime<Utc>,
        inicio: DateTime<Utc>,
        margen: Duration,
    ) -> Option<EstadoReserva> {
        (self == EstadoReserva::Confirmada && ahora > inicio + margen)
            .then_some(EstadoReserva::Cancelada)
    }
}

impl fmt::Display for EstadoReserva {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EstadoReserva {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pendiente" => Ok(EstadoReserva::Pendiente),
            "confirmada" => Ok(EstadoReserva::Confirmada),
            "cancelada" => Ok(EstadoReserva::Cancelada),
            "completada" => Ok(EstadoReserva::Completada),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Reserva {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Número público de la reserva: 63 bits, único, apto para exponer fuera
    pub numero: i64,
    pub id_restaurante: ObjectId,
    pub id_mesa: ObjectId,
    /// Identificador estable del titular, emitido por la pasarela de identidad
    pub id_cliente: String,
    pub nombre_cliente: String,
    pub email_cliente: String,
    pub telefono_cliente: String,
    pub numero_personas: i32,
    pub inicio: i64, // timestamp unix
    pub fin: i64,    // timestamp unix
    pub estado: EstadoReserva,
    pub created_at: i64, // timestamp unix
    pub updated_at: i64, // timestamp unix
}

impl Reserva {
    pub fn inicio_utc(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.inicio, 0).unwrap_or_default()
    }

    pub fn fin_utc(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.fin, 0).unwrap_or_default()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Mesa {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub id_restaurante: ObjectId,
    pub nombre: String,
    pub capacidad: i32,
    pub created_at: i64, // timestamp unix
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Restaurant {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub nombre: String,
    /// Identificador del gerente autorizado a aprobar y rechazar reservas
    pub id_gerente: String,
    pub created_at: i64, // timestamp unix
}

/// Franja validada por el comprobador de disponibilidad, lista para persistir.
#[derive(Debug, Clone)]
pub struct SlotValidado {
    pub id_mesa: ObjectId,
    pub numero_personas: i32,
    pub inicio: DateTime<Utc>,
    pub fin: DateTime<Utc>,
}
