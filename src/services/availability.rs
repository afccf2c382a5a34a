//! # Comprobador de disponibilidad
//!
//! Decide si una mesa está libre para una franja y un número de personas.
//! No tiene efectos secundarios: solo lee y devuelve la franja validada.

use chrono::{DateTime, Timelike, Utc};
use mongodb::bson::oid::ObjectId;

use crate::api::{AppError, AppResult};
use crate::config::Config;
use crate::db::{CatalogoRepo, ReservaRepo, SlotValidado};

/// Valida que la mesa pueda reservarse en `[inicio, inicio + unidad)`.
///
/// Las comprobaciones se aplican en orden y la primera que falla corta:
///
/// 1. La franja no puede empezar en el pasado.
/// 2. El inicio debe caer en un múltiplo de la unidad de franja.
/// 3. Ninguna reserva confirmada de la mesa puede solapar la franja.
/// 4. El número de personas no puede superar la capacidad de la mesa.
///
/// `excluir` deja fuera del conflicto la propia reserva cuando se edita.
pub async fn validate_slot<R, C>(
    reservas: &R,
    catalogo: &C,
    id_mesa: ObjectId,
    inicio: DateTime<Utc>,
    numero_personas: i32,
    ahora: DateTime<Utc>,
    excluir: Option<i64>,
    config: &Config,
) -> AppResult<SlotValidado>
where
    R: ReservaRepo + ?Sized,
    C: CatalogoRepo + ?Sized,
{
    let fin = inicio + config.unidad_slot();

    tracing::debug!(
        mesa = %id_mesa,
        personas = numero_personas,
        inicio = %inicio,
        fin = %fin,
        "Comprobando disponibilidad de la mesa"
    );

    if inicio < ahora {
        tracing::warn!(inicio = %inicio, "Reserva rechazada - hora ya pasada");
        return Err(AppError::PastTime);
    }

    if i64::from(inicio.minute()) % config.unidad_slot_min != 0 {
        tracing::warn!(inicio = %inicio, "Reserva rechazada - fuera de la unidad de franja");
        return Err(AppError::InvalidTimeUnit {
            unidad: config.unidad_slot_min,
        });
    }

    if reservas
        .confirmada_solapada(id_mesa, inicio, fin, excluir)
        .await?
    {
        tracing::warn!(mesa = %id_mesa, inicio = %inicio, "Reserva rechazada - franja ocupada");
        return Err(AppError::SlotConflict);
    }

    let mesa = catalogo
        .find_mesa(id_mesa)
        .await?
        .ok_or_else(|| AppError::NotFound("Mesa no encontrada".to_string()))?;

    if numero_personas > mesa.capacidad {
        tracing::warn!(
            pedido = numero_personas,
            capacidad = mesa.capacidad,
            "Reserva rechazada - capacidad de la mesa superada"
        );
        return Err(AppError::CapacityExceeded {
            pedido: numero_personas,
            capacidad: mesa.capacidad,
        });
    }

    tracing::debug!(mesa = %id_mesa, "Mesa disponible");

    Ok(SlotValidado {
        id_mesa,
        numero_personas,
        inicio,
        fin,
    })
}
