//! # Acceso a MongoDB
//!
//! Conexión, colecciones e índices, más las implementaciones de los
//! contratos de persistencia. El índice parcial único sobre
//! `(id_mesa, inicio)` para reservas confirmadas es el que garantiza la
//! no-superposición de confirmadas bajo aprobaciones concurrentes: sin él,
//! el patrón leer-luego-escribir del comprobador de disponibilidad no es
//! atómico.

use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Utc};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::doc;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::ReturnDocument;
use mongodb::{Client, Collection, Database};
use std::env;

use super::models::{EstadoReserva, Mesa, Reserva, Restaurant, SlotValidado};
use super::repository::{CatalogoRepo, FiltroReservas, ReservaRepo};
use crate::api::{AppError, AppResult, ErrorLogExt};

#[derive(Debug, Clone)]
pub struct MongoRepo {
    pub client: Client,
    pub database: Database,
}

impl MongoRepo {
    pub async fn init() -> AppResult<MongoRepo> {
        let mongo_uri =
            env::var("MONGODB_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string());

        let client = Client::with_uri_str(&mongo_uri)
            .await
            .map_err(|e| AppError::Internal(format!("Error conectando a MongoDB: {}", e)))?;

        let database_name =
            env::var("MONGODB_DATABASE").unwrap_or_else(|_| "motor_reservas".to_string());

        let database = client.database(&database_name);

        // Test connection
        database
            .run_command(doc! {"ping": 1})
            .await
            .map_err(|e| AppError::Internal(format!("Error validando conexión MongoDB: {}", e)))?;

        tracing::info!("Conexión a MongoDB establecida exitosamente");

        Ok(MongoRepo { client, database })
    }

    pub fn restaurants(&self) -> Collection<Restaurant> {
        self.database.collection("restaurants")
    }

    pub fn mesas(&self) -> Collection<Mesa> {
        self.database.collection("mesas")
    }

    pub fn reservas(&self) -> Collection<Reserva> {
        self.database.collection("reservas")
    }

    /// Crea los índices de las colecciones. El parcial único de reservas
    /// confirmadas es obligatorio para la corrección bajo concurrencia, así
    /// que un fallo aquí debe abortar el arranque.
    pub async fn create_indexes(&self) -> AppResult<()> {
        use mongodb::options::IndexOptions;
        use mongodb::IndexModel;

        let restaurants = self.restaurants();
        let restaurant_indexes = vec![IndexModel::builder()
            .keys(doc! { "nombre": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build()];

        restaurants
            .create_indexes(restaurant_indexes)
            .await
            .map_err(|e| AppError::Internal(format!("Error creando índices: {}", e)))?;

        let mesas = self.mesas();
        let mesa_indexes = vec![
            IndexModel::builder()
                .keys(doc! { "id_restaurante": 1 })
                .build(),
            IndexModel::builder()
                .keys(doc! { "id_restaurante": 1, "nombre": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
        ];

        mesas
            .create_indexes(mesa_indexes)
            .await
            .map_err(|e| AppError::Internal(format!("Error creando índices mesas: {}", e)))?;

        let reservas = self.reservas();
        let reservation_indexes = vec![
            IndexModel::builder()
                .keys(doc! { "numero": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
            IndexModel::builder()
                .keys(doc! { "id_restaurante": 1 })
                .build(),
            // Consulta del barrido de no-shows
            IndexModel::builder()
                .keys(doc! { "estado": 1, "inicio": 1 })
                .build(),
            // Con franjas de duración fija alineadas a la unidad, dos
            // reservas solapan si y solo si comparten inicio: este índice
            // impide que dos confirmadas ocupen la misma mesa y franja,
            // aunque las aprueben dos gerentes a la vez.
            IndexModel::builder()
                .keys(doc! { "id_mesa": 1, "inicio": 1 })
                .options(
                    IndexOptions::builder()
                        .unique(true)
                        .partial_filter_expression(doc! {
                            "estado": EstadoReserva::Confirmada.as_str()
                        })
                        .build(),
                )
                .build(),
        ];

        reservas
            .create_indexes(reservation_indexes)
            .await
            .map_err(|e| AppError::Internal(format!("Error creando índices reservas: {}", e)))?;

        tracing::info!("Índices MongoDB creados exitosamente");
        Ok(())
    }

    // Función auxiliar para obtener timestamp actual
    pub fn current_timestamp() -> i64 {
        Utc::now().timestamp()
    }
}

/// Violación de índice único (E11000)
fn es_clave_duplicada(error: &mongodb::error::Error) -> bool {
    match *error.kind {
        ErrorKind::Write(WriteFailure::WriteError(ref e)) => e.code == 11000,
        ErrorKind::Command(ref e) => e.code == 11000,
        _ => false,
    }
}

async fn drenar_cursor(mut cursor: mongodb::Cursor<Reserva>) -> AppResult<Vec<Reserva>> {
    let mut results = Vec::new();

    while cursor
        .advance()
        .await
        .map_err(|e| AppError::database("avanzar_cursor", e))?
    {
        let reserva = cursor
            .deserialize_current()
            .map_err(|e| AppError::Internal(format!("Error deserializando reserva: {}", e)))?;
        results.push(reserva);
    }

    Ok(results)
}

#[async_trait]
impl ReservaRepo for MongoRepo {
    async fn insert(&self, mut reserva: Reserva) -> AppResult<Reserva> {
        let result = self
            .reservas()
            .insert_one(&reserva)
            .await
            .log_error_context("inserting new reservation")
            .map_err(|e| {
                if es_clave_duplicada(&e) {
                    // Colisión del número público de 63 bits
                    AppError::Internal("Colisión de número de reserva".to_string())
                } else {
                    AppError::database("insert_reserva", e)
                }
            })?;

        reserva.id = result.inserted_id.as_object_id();
        Ok(reserva)
    }

    async fn find_by_numero(&self, numero: i64) -> AppResult<Option<Reserva>> {
        self.reservas()
            .find_one(doc! { "numero": numero })
            .await
            .log_error_context("finding reservation by number")
            .map_err(|e| AppError::database("find_reserva", e))
    }

    async fn find_by_numero_y_restaurante(
        &self,
        numero: i64,
        id_restaurante: ObjectId,
    ) -> AppResult<Option<Reserva>> {
        self.reservas()
            .find_one(doc! { "numero": numero, "id_restaurante": id_restaurante })
            .await
            .log_error_context("finding reservation scoped to restaurant")
            .map_err(|e| AppError::database("find_reserva_restaurante", e))
    }

    async fn confirmada_solapada(
        &self,
        id_mesa: ObjectId,
        inicio: DateTime<Utc>,
        fin: DateTime<Utc>,
        excluir: Option<i64>,
    ) -> AppResult<bool> {
        let mut filter = doc! {
            "id_mesa": id_mesa,
            "estado": EstadoReserva::Confirmada.as_str(),
            "inicio": { "$lt": fin.timestamp() },
            "fin": { "$gt": inicio.timestamp() },
        };

        if let Some(numero) = excluir {
            filter.insert("numero", doc! { "$ne": numero });
        }

        let existing = self
            .reservas()
            .find_one(filter)
            .await
            .log_error_context("checking confirmed overlap")
            .map_err(|e| AppError::database("confirmada_solapada", e))?;

        Ok(existing.is_some())
    }

    async fn confirmadas_antes_de(&self, limite: DateTime<Utc>) -> AppResult<Vec<Reserva>> {
        let cursor = self
            .reservas()
            .find(doc! {
                "estado": EstadoReserva::Confirmada.as_str(),
                "inicio": { "$lt": limite.timestamp() },
            })
            .await
            .log_error_context("querying expired confirmed reservations")
            .map_err(|e| AppError::database("confirmadas_antes_de", e))?;

        drenar_cursor(cursor).await
    }

    async fn list_by_restaurante(
        &self,
        id_restaurante: ObjectId,
        filtro: &FiltroReservas,
    ) -> AppResult<Vec<Reserva>> {
        // Construir filtro dinámico basado en parámetros
        let mut filter = doc! { "id_restaurante": id_restaurante };

        if let Some(estado) = filtro.estado {
            filter.insert("estado", estado.as_str());
        }

        if let Some(fecha) = filtro.fecha {
            let desde = fecha.and_time(NaiveTime::MIN).and_utc().timestamp();
            let hasta = desde + 86_400;
            filter.insert("inicio", doc! { "$gte": desde, "$lt": hasta });
        }

        let cursor = self
            .reservas()
            .find(filter)
            .sort(doc! { "inicio": 1 })
            .await
            .log_error_context("listing restaurant reservations")
            .map_err(|e| AppError::database("list_reservas", e))?;

        drenar_cursor(cursor).await
    }

    async fn set_estado_if(
        &self,
        numero: i64,
        de: EstadoReserva,
        a: EstadoReserva,
    ) -> AppResult<Option<Reserva>> {
        self.reservas()
            .find_one_and_update(
                doc! { "numero": numero, "estado": de.as_str() },
                doc! {
                    "$set": {
                        "estado": a.as_str(),
                        "updated_at": MongoRepo::current_timestamp(),
                    }
                },
            )
            .return_document(ReturnDocument::After)
            .await
            .log_error_context("transitioning reservation status")
            .map_err(|e| {
                if es_clave_duplicada(&e) {
                    // El índice parcial único vetó una segunda confirmada en
                    // la misma mesa y franja
                    AppError::SlotConflict
                } else {
                    AppError::database("set_estado", e)
                }
            })
    }

    async fn update_slot(
        &self,
        numero: i64,
        slot: &SlotValidado,
        estado: EstadoReserva,
    ) -> AppResult<Option<Reserva>> {
        self.reservas()
            .find_one_and_update(
                doc! { "numero": numero },
                doc! {
                    "$set": {
                        "id_mesa": slot.id_mesa,
                        "numero_personas": slot.numero_personas,
                        "inicio": slot.inicio.timestamp(),
                        "fin": slot.fin.timestamp(),
                        "estado": estado.as_str(),
                        "updated_at": MongoRepo::current_timestamp(),
                    }
                },
            )
            .return_document(ReturnDocument::After)
            .await
            .log_error_context("updating reservation slot")
            .map_err(|e| AppError::database("update_slot", e))
    }

    async fn delete_by_numero(&self, numero: i64) -> AppResult<bool> {
        let result = self
            .reservas()
            .delete_one(doc! { "numero": numero })
            .await
            .log_error_context("deleting reservation")
            .map_err(|e| AppError::database("delete_reserva", e))?;

        Ok(result.deleted_count > 0)
    }
}

#[async_trait]
impl CatalogoRepo for MongoRepo {
    async fn find_restaurante(&self, id: ObjectId) -> AppResult<Option<Restaurant>> {
        self.restaurants()
            .find_one(doc! { "_id": id })
            .await
            .log_error_context("finding restaurant")
            .map_err(|e| AppError::database("find_restaurante", e))
    }

    async fn find_mesa(&self, id: ObjectId) -> AppResult<Option<Mesa>> {
        self.mesas()
            .find_one(doc! { "_id": id })
            .await
            .log_error_context("finding table")
            .map_err(|e| AppError::database("find_mesa", e))
    }
}
