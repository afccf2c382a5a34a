//! # Operaciones del titular sobre sus reservas
//!
//! Crear, consultar, editar, eliminar y checkin. Toda operación comprueba
//! que quien la pide es el titular de la reserva; toda mutación de estado
//! pasa por las transiciones de [`EstadoReserva`].

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use uuid::Uuid;

use super::availability::validate_slot;
use crate::api::{AppError, AppResult};
use crate::config::Config;
use crate::db::{CatalogoRepo, EstadoReserva, Reserva, ReservaRepo};

/// Datos de una nueva reserva, ya con la identidad del titular resuelta.
#[derive(Debug, Clone)]
pub struct NuevaReserva {
    pub id_restaurante: ObjectId,
    pub id_mesa: ObjectId,
    pub id_cliente: String,
    pub nombre_cliente: String,
    pub email_cliente: String,
    pub telefono_cliente: String,
    pub numero_personas: i32,
    pub inicio: DateTime<Utc>,
}

/// Campos que el titular puede cambiar al editar una reserva.
#[derive(Debug, Clone)]
pub struct EdicionReserva {
    pub id_mesa: ObjectId,
    pub numero_personas: i32,
    pub inicio: DateTime<Utc>,
}

/// Crea una reserva en estado pendiente para la franja pedida.
pub async fn create_reservation<R, C>(
    reservas: &R,
    catalogo: &C,
    config: &Config,
    datos: NuevaReserva,
) -> AppResult<Reserva>
where
    R: ReservaRepo + ?Sized,
    C: CatalogoRepo + ?Sized,
{
    tracing::info!(cliente = %datos.id_cliente, "Procesando creación de reserva");

    catalogo
        .find_restaurante(datos.id_restaurante)
        .await?
        .ok_or_else(|| AppError::NotFound("Restaurante no encontrado".to_string()))?;

    mesa_del_restaurante(catalogo, datos.id_mesa, datos.id_restaurante).await?;

    let ahora = Utc::now();
    let slot = validate_slot(
        reservas,
        catalogo,
        datos.id_mesa,
        datos.inicio,
        datos.numero_personas,
        ahora,
        None,
        config,
    )
    .await?;

    let numero = generar_numero();
    tracing::debug!(numero, "Número de reserva generado");

    let ahora_ts = ahora.timestamp();
    let reserva = reservas
        .insert(Reserva {
            id: None,
            numero,
            id_restaurante: datos.id_restaurante,
            id_mesa: slot.id_mesa,
            id_cliente: datos.id_cliente,
            nombre_cliente: datos.nombre_cliente,
            email_cliente: datos.email_cliente,
            telefono_cliente: datos.telefono_cliente,
            numero_personas: slot.numero_personas,
            inicio: slot.inicio.timestamp(),
            fin: slot.fin.timestamp(),
            estado: EstadoReserva::Pendiente,
            created_at: ahora_ts,
            updated_at: ahora_ts,
        })
        .await?;

    tracing::info!(numero, "Reserva creada");
    Ok(reserva)
}

/// Detalle de una reserva; solo el titular puede verla.
pub async fn get_reservation<R>(reservas: &R, numero: i64, id_cliente: &str) -> AppResult<Reserva>
where
    R: ReservaRepo + ?Sized,
{
    tracing::debug!(numero, "Consultando reserva");

    let reserva = find_or_not_found(reservas, numero).await?;
    check_titular(&reserva, id_cliente)?;

    Ok(reserva)
}

/// Edita mesa, franja o número de personas. La nueva franja se revalida
/// (excluyendo la franja actual de la propia reserva) y una reserva
/// confirmada vuelve a pendiente.
pub async fn update_reservation<R, C>(
    reservas: &R,
    catalogo: &C,
    config: &Config,
    numero: i64,
    id_cliente: &str,
    cambios: EdicionReserva,
) -> AppResult<Reserva>
where
    R: ReservaRepo + ?Sized,
    C: CatalogoRepo + ?Sized,
{
    tracing::info!(numero, "Procesando edición de reserva");

    let reserva = find_or_not_found(reservas, numero).await?;
    check_titular(&reserva, id_cliente)?;

    let nuevo_estado = reserva.estado.editar()?;

    mesa_del_restaurante(catalogo, cambios.id_mesa, reserva.id_restaurante).await?;

    let slot = validate_slot(
        reservas,
        catalogo,
        cambios.id_mesa,
        cambios.inicio,
        cambios.numero_personas,
        Utc::now(),
        Some(numero),
        config,
    )
    .await?;

    let actualizada = reservas
        .update_slot(numero, &slot, nuevo_estado)
        .await?
        .ok_or_else(|| AppError::NotFound("Reserva no encontrada".to_string()))?;

    tracing::info!(numero, estado = %actualizada.estado, "Reserva editada");
    Ok(actualizada)
}

/// Elimina la reserva. Solo se comprueba la titularidad: el borrado no mira
/// el estado, así que también elimina reservas confirmadas o completadas.
pub async fn delete_reservation<R>(reservas: &R, numero: i64, id_cliente: &str) -> AppResult<()>
where
    R: ReservaRepo + ?Sized,
{
    tracing::info!(numero, "Procesando eliminación de reserva");

    let reserva = find_or_not_found(reservas, numero).await?;
    check_titular(&reserva, id_cliente)?;

    if !reservas.delete_by_numero(numero).await? {
        return Err(AppError::NotFound("Reserva no encontrada".to_string()));
    }

    tracing::info!(numero, "Reserva eliminada");
    Ok(())
}

/// Checkin del titular dentro de la ventana de llegada.
pub async fn checkin_reservation<R>(
    reservas: &R,
    config: &Config,
    numero: i64,
    id_cliente: &str,
) -> AppResult<Reserva>
where
    R: ReservaRepo + ?Sized,
{
    tracing::info!(numero, "Procesando checkin");

    let reserva = find_or_not_found(reservas, numero).await?;
    check_titular(&reserva, id_cliente)?;

    let nuevo_estado = reserva.estado.checkin(
        Utc::now(),
        reserva.inicio_utc(),
        config.margen_checkin(),
    )?;

    // Si el estado cambió entre la lectura y la escritura, ya no hay
    // confirmada que completar.
    let actualizada = reservas
        .set_estado_if(numero, reserva.estado, nuevo_estado)
        .await?
        .ok_or(AppError::NotConfirmed)?;

    tracing::info!(numero, "Checkin completado");
    Ok(actualizada)
}

/// Mitad alta de un UUID v4 con el bit de signo a cero: identificador
/// público de 63 bits resistente a colisiones.
fn generar_numero() -> i64 {
    let (msb, _) = Uuid::new_v4().as_u64_pair();
    (msb & (i64::MAX as u64)) as i64
}

async fn find_or_not_found<R>(reservas: &R, numero: i64) -> AppResult<Reserva>
where
    R: ReservaRepo + ?Sized,
{
    reservas.find_by_numero(numero).await?.ok_or_else(|| {
        tracing::warn!(numero, "Reserva no encontrada");
        AppError::NotFound("Reserva no encontrada".to_string())
    })
}

fn check_titular(reserva: &Reserva, id_cliente: &str) -> AppResult<()> {
    if reserva.id_cliente != id_cliente {
        tracing::warn!(
            numero = reserva.numero,
            titular = %reserva.id_cliente,
            solicitante = %id_cliente,
            "Titular de la reserva no coincide"
        );
        return Err(AppError::Forbidden(
            "No tienes permiso para operar sobre esta reserva".to_string(),
        ));
    }
    Ok(())
}

async fn mesa_del_restaurante<C>(
    catalogo: &C,
    id_mesa: ObjectId,
    id_restaurante: ObjectId,
) -> AppResult<()>
where
    C: CatalogoRepo + ?Sized,
{
    let mesa = catalogo
        .find_mesa(id_mesa)
        .await?
        .ok_or_else(|| AppError::NotFound("Mesa no encontrada".to_string()))?;

    if mesa.id_restaurante != id_restaurante {
        return Err(AppError::NotFound(
            "La mesa no pertenece al restaurante".to_string(),
        ));
    }

    Ok(())
}
