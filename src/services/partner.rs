//! # Aprobación de reservas por el gerente
//!
//! Aprobar, rechazar y listar reservas de un restaurante. Las búsquedas van
//! siempre restringidas al restaurante, y solo su gerente puede operar.

use mongodb::bson::oid::ObjectId;

use crate::api::{AppError, AppResult};
use crate::db::{CatalogoRepo, EstadoReserva, FiltroReservas, Reserva, ReservaRepo};

/// Aprueba una reserva pendiente del restaurante.
pub async fn approve_reservation<R, C>(
    reservas: &R,
    catalogo: &C,
    id_restaurante: ObjectId,
    numero: i64,
    id_gerente: &str,
) -> AppResult<Reserva>
where
    R: ReservaRepo + ?Sized,
    C: CatalogoRepo + ?Sized,
{
    tracing::info!(numero, gerente = %id_gerente, "Procesando aprobación de reserva");

    let reserva = find_del_restaurante(reservas, numero, id_restaurante).await?;
    check_gerente(catalogo, id_restaurante, id_gerente).await?;

    let nuevo_estado = reserva.estado.aprobar()?;

    // La escritura vuelve a comprobar el estado: si otro gerente se adelantó
    // entre la lectura y este punto, la transición no se aplica.
    let actualizada = reservas
        .set_estado_if(numero, EstadoReserva::Pendiente, nuevo_estado)
        .await?
        .ok_or(AppError::AlreadyProcessed)?;

    tracing::info!(numero, "Reserva aprobada");
    Ok(actualizada)
}

/// Rechaza una reserva pendiente del restaurante.
pub async fn reject_reservation<R, C>(
    reservas: &R,
    catalogo: &C,
    id_restaurante: ObjectId,
    numero: i64,
    id_gerente: &str,
) -> AppResult<Reserva>
where
    R: ReservaRepo + ?Sized,
    C: CatalogoRepo + ?Sized,
{
    tracing::info!(numero, gerente = %id_gerente, "Procesando rechazo de reserva");

    let reserva = find_del_restaurante(reservas, numero, id_restaurante).await?;
    check_gerente(catalogo, id_restaurante, id_gerente).await?;

    let nuevo_estado = reserva.estado.rechazar()?;

    let actualizada = reservas
        .set_estado_if(numero, EstadoReserva::Pendiente, nuevo_estado)
        .await?
        .ok_or(AppError::AlreadyProcessed)?;

    tracing::info!(numero, "Reserva rechazada");
    Ok(actualizada)
}

/// Lista las reservas del restaurante con filtros opcionales de fecha y
/// estado, ordenadas por inicio.
pub async fn list_reservations<R, C>(
    reservas: &R,
    catalogo: &C,
    id_restaurante: ObjectId,
    id_gerente: &str,
    filtro: &FiltroReservas,
) -> AppResult<Vec<Reserva>>
where
    R: ReservaRepo + ?Sized,
    C: CatalogoRepo + ?Sized,
{
    check_gerente(catalogo, id_restaurante, id_gerente).await?;
    reservas.list_by_restaurante(id_restaurante, filtro).await
}

async fn find_del_restaurante<R>(
    reservas: &R,
    numero: i64,
    id_restaurante: ObjectId,
) -> AppResult<Reserva>
where
    R: ReservaRepo + ?Sized,
{
    reservas
        .find_by_numero_y_restaurante(numero, id_restaurante)
        .await?
        .ok_or_else(|| {
            tracing::warn!(numero, restaurante = %id_restaurante, "Reserva no encontrada en el restaurante");
            AppError::NotFound("Reserva no encontrada".to_string())
        })
}

async fn check_gerente<C>(
    catalogo: &C,
    id_restaurante: ObjectId,
    id_gerente: &str,
) -> AppResult<()>
where
    C: CatalogoRepo + ?Sized,
{
    let restaurante = catalogo
        .find_restaurante(id_restaurante)
        .await?
        .ok_or_else(|| AppError::NotFound("Restaurante no encontrado".to_string()))?;

    if restaurante.id_gerente != id_gerente {
        tracing::warn!(
            restaurante = %id_restaurante,
            gerente = %restaurante.id_gerente,
            solicitante = %id_gerente,
            "Acceso denegado - no es el gerente del restaurante"
        );
        return Err(AppError::Forbidden(
            "No eres el gerente de este restaurante".to_string(),
        ));
    }

    tracing::debug!(restaurante = %id_restaurante, "Gerente verificado");
    Ok(())
}
