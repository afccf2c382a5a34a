//! # Contratos de persistencia
//!
//! Los servicios dependen de estos traits y no del driver: `ReservaRepo` es
//! el almacén de reservas y `CatalogoRepo` resuelve restaurantes y mesas
//! (solo lectura). `MongoRepo` implementa ambos.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use mongodb::bson::oid::ObjectId;

use super::models::{EstadoReserva, Mesa, Reserva, Restaurant, SlotValidado};
use crate::api::AppResult;

/// Filtros opcionales del listado de reservas de un restaurante.
#[derive(Debug, Default, Clone)]
pub struct FiltroReservas {
    pub estado: Option<EstadoReserva>,
    /// Día concreto: se listan las reservas cuyo inicio cae en esa fecha.
    pub fecha: Option<NaiveDate>,
}

#[async_trait]
pub trait ReservaRepo: Send + Sync {
    async fn insert(&self, reserva: Reserva) -> AppResult<Reserva>;

    async fn find_by_numero(&self, numero: i64) -> AppResult<Option<Reserva>>;

    /// Búsqueda restringida al restaurante: las operaciones del gerente no
    /// ven reservas de otros locales.
    async fn find_by_numero_y_restaurante(
        &self,
        numero: i64,
        id_restaurante: ObjectId,
    ) -> AppResult<Option<Reserva>>;

    /// ¿Hay una reserva confirmada en la mesa que solape `[inicio, fin)`?
    /// Dos franjas solapan salvo que una termine a la hora (o antes) de que
    /// empiece la otra. `excluir` deja fuera el propio número de la reserva
    /// que se está editando.
    async fn confirmada_solapada(
        &self,
        id_mesa: ObjectId,
        inicio: DateTime<Utc>,
        fin: DateTime<Utc>,
        excluir: Option<i64>,
    ) -> AppResult<bool>;

    /// Reservas confirmadas cuyo inicio es anterior a `limite`.
    async fn confirmadas_antes_de(&self, limite: DateTime<Utc>) -> AppResult<Vec<Reserva>>;

    async fn list_by_restaurante(
        &self,
        id_restaurante: ObjectId,
        filtro: &FiltroReservas,
    ) -> AppResult<Vec<Reserva>>;

    /// Cambio de estado condicionado al estado actual. La comprobación del
    /// estado y la escritura son atómicas en el almacén. Devuelve la reserva
    /// actualizada, o `None` si el estado ya no era `de`.
    async fn set_estado_if(
        &self,
        numero: i64,
        de: EstadoReserva,
        a: EstadoReserva,
    ) -> AppResult<Option<Reserva>>;

    /// Aplica una franja validada (edición del titular) junto al nuevo
    /// estado. Devuelve la reserva actualizada, o `None` si ya no existe.
    async fn update_slot(
        &self,
        numero: i64,
        slot: &SlotValidado,
        estado: EstadoReserva,
    ) -> AppResult<Option<Reserva>>;

    async fn delete_by_numero(&self, numero: i64) -> AppResult<bool>;
}

#[async_trait]
pub trait CatalogoRepo: Send + Sync {
    async fn find_restaurante(&self, id: ObjectId) -> AppResult<Option<Restaurant>>;

    async fn find_mesa(&self, id: ObjectId) -> AppResult<Option<Mesa>>;
}
