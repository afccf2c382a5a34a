//! Almacén en memoria para los tests del motor.
//!
//! Ofrece las mismas garantías que el almacén de MongoDB: las transiciones
//! de estado son atómicas bajo el lock, y una transición a confirmada se
//! rechaza con `SlotConflict` si otra confirmada ya solapa la franja en la
//! misma mesa (el equivalente del índice parcial único).

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use mongodb::bson::oid::ObjectId;
use std::sync::Mutex;

use motor_reservas::api::{AppError, AppResult};
use motor_reservas::db::{
    CatalogoRepo, EstadoReserva, FiltroReservas, Mesa, Reserva, ReservaRepo, Restaurant,
    SlotValidado,
};

pub struct MemRepo {
    reservas: Mutex<Vec<Reserva>>,
    mesas: Mutex<Vec<Mesa>>,
    restaurantes: Mutex<Vec<Restaurant>>,
}

#[allow(dead_code)]
impl MemRepo {
    pub fn new() -> MemRepo {
        MemRepo {
            reservas: Mutex::new(Vec::new()),
            mesas: Mutex::new(Vec::new()),
            restaurantes: Mutex::new(Vec::new()),
        }
    }

    pub fn alta_restaurante(&self, nombre: &str, id_gerente: &str) -> ObjectId {
        let id = ObjectId::new();
        self.restaurantes.lock().unwrap().push(Restaurant {
            id: Some(id),
            nombre: nombre.to_string(),
            id_gerente: id_gerente.to_string(),
            created_at: 0,
        });
        id
    }

    pub fn alta_mesa(&self, id_restaurante: ObjectId, capacidad: i32) -> ObjectId {
        let id = ObjectId::new();
        self.mesas.lock().unwrap().push(Mesa {
            id: Some(id),
            id_restaurante,
            nombre: format!("Mesa {}", capacidad),
            capacidad,
            created_at: 0,
        });
        id
    }

    pub fn alta_reserva(&self, reserva: Reserva) {
        self.reservas.lock().unwrap().push(reserva);
    }

    pub fn estado_de(&self, numero: i64) -> Option<EstadoReserva> {
        self.reservas
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.numero == numero)
            .map(|r| r.estado)
    }
}

#[async_trait]
impl ReservaRepo for MemRepo {
    async fn insert(&self, mut reserva: Reserva) -> AppResult<Reserva> {
        reserva.id = Some(ObjectId::new());
        self.reservas.lock().unwrap().push(reserva.clone());
        Ok(reserva)
    }

    async fn find_by_numero(&self, numero: i64) -> AppResult<Option<Reserva>> {
        Ok(self
            .reservas
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.numero == numero)
            .cloned())
    }

    async fn find_by_numero_y_restaurante(
        &self,
        numero: i64,
        id_restaurante: ObjectId,
    ) -> AppResult<Option<Reserva>> {
        Ok(self
            .reservas
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.numero == numero && r.id_restaurante == id_restaurante)
            .cloned())
    }

    async fn confirmada_solapada(
        &self,
        id_mesa: ObjectId,
        inicio: DateTime<Utc>,
        fin: DateTime<Utc>,
        excluir: Option<i64>,
    ) -> AppResult<bool> {
        let inicio = inicio.timestamp();
        let fin = fin.timestamp();
        Ok(self.reservas.lock().unwrap().iter().any(|r| {
            r.id_mesa == id_mesa
                && r.estado == EstadoReserva::Confirmada
                && r.inicio < fin
                && r.fin > inicio
                && excluir != Some(r.numero)
        }))
    }

    async fn confirmadas_antes_de(&self, limite: DateTime<Utc>) -> AppResult<Vec<Reserva>> {
        let limite = limite.timestamp();
        Ok(self
            .reservas
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.estado == EstadoReserva::Confirmada && r.inicio < limite)
            .cloned()
            .collect())
    }

    async fn list_by_restaurante(
        &self,
        id_restaurante: ObjectId,
        filtro: &FiltroReservas,
    ) -> AppResult<Vec<Reserva>> {
        let rango = filtro.fecha.map(|fecha| {
            let desde = fecha.and_time(NaiveTime::MIN).and_utc().timestamp();
            (desde, desde + 86_400)
        });

        let mut reservas: Vec<Reserva> = self
            .reservas
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.id_restaurante == id_restaurante)
            .filter(|r| filtro.estado.map_or(true, |estado| r.estado == estado))
            .filter(|r| rango.map_or(true, |(desde, hasta)| r.inicio >= desde && r.inicio < hasta))
            .cloned()
            .collect();

        reservas.sort_by_key(|r| r.inicio);
        Ok(reservas)
    }

    async fn set_estado_if(
        &self,
        numero: i64,
        de: EstadoReserva,
        a: EstadoReserva,
    ) -> AppResult<Option<Reserva>> {
        let mut reservas = self.reservas.lock().unwrap();

        let Some(idx) = reservas
            .iter()
            .position(|r| r.numero == numero && r.estado == de)
        else {
            return Ok(None);
        };

        if a == EstadoReserva::Confirmada {
            let (id_mesa, inicio, fin) = {
                let r = &reservas[idx];
                (r.id_mesa, r.inicio, r.fin)
            };
            let ocupada = reservas.iter().any(|r| {
                r.numero != numero
                    && r.id_mesa == id_mesa
                    && r.estado == EstadoReserva::Confirmada
                    && r.inicio < fin
                    && r.fin > inicio
            });
            if ocupada {
                return Err(AppError::SlotConflict);
            }
        }

        reservas[idx].estado = a;
        reservas[idx].updated_at = Utc::now().timestamp();
        Ok(Some(reservas[idx].clone()))
    }

    async fn update_slot(
        &self,
        numero: i64,
        slot: &SlotValidado,
        estado: EstadoReserva,
    ) -> AppResult<Option<Reserva>> {
        let mut reservas = self.reservas.lock().unwrap();

        let Some(reserva) = reservas.iter_mut().find(|r| r.numero == numero) else {
            return Ok(None);
        };

        reserva.id_mesa = slot.id_mesa;
        reserva.numero_personas = slot.numero_personas;
        reserva.inicio = slot.inicio.timestamp();
        reserva.fin = slot.fin.timestamp();
        reserva.estado = estado;
        reserva.updated_at = Utc::now().timestamp();
        Ok(Some(reserva.clone()))
    }

    async fn delete_by_numero(&self, numero: i64) -> AppResult<bool> {
        let mut reservas = self.reservas.lock().unwrap();
        let antes = reservas.len();
        reservas.retain(|r| r.numero != numero);
        Ok(reservas.len() < antes)
    }
}

#[async_trait]
impl CatalogoRepo for MemRepo {
    async fn find_restaurante(&self, id: ObjectId) -> AppResult<Option<Restaurant>> {
        Ok(self
            .restaurantes
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == Some(id))
            .cloned())
    }

    async fn find_mesa(&self, id: ObjectId) -> AppResult<Option<Mesa>> {
        Ok(self
            .mesas
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.id == Some(id))
            .cloned())
    }
}

/// Inicio de franja alineado a la media hora, al menos dos horas en el futuro.
#[allow(dead_code)]
pub fn franja_futura() -> DateTime<Utc> {
    alinear(Utc::now() + Duration::hours(2))
}

/// Redondea hacia arriba al siguiente múltiplo de 30 minutos.
#[allow(dead_code)]
pub fn alinear(instante: DateTime<Utc>) -> DateTime<Utc> {
    let ts = instante.timestamp();
    let resto = ts % 1800;
    DateTime::from_timestamp(ts - resto + 1800, 0).unwrap()
}

/// Reserva lista para sembrar en el almacén.
#[allow(dead_code)]
pub fn reserva_de_prueba(
    numero: i64,
    id_restaurante: ObjectId,
    id_mesa: ObjectId,
    id_cliente: &str,
    inicio: DateTime<Utc>,
    estado: EstadoReserva,
) -> Reserva {
    let fin = inicio + Duration::minutes(30);
    Reserva {
        id: Some(ObjectId::new()),
        numero,
        id_restaurante,
        id_mesa,
        id_cliente: id_cliente.to_string(),
        nombre_cliente: "Juan Pérez".to_string(),
        email_cliente: "juan@email.com".to_string(),
        telefono_cliente: "+34 123 456 789".to_string(),
        numero_personas: 2,
        inicio: inicio.timestamp(),
        fin: fin.timestamp(),
        estado,
        created_at: inicio.timestamp() - 3600,
        updated_at: inicio.timestamp() - 3600,
    }
}
