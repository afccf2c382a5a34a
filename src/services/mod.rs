//! # Servicios del motor de reservas
//!
//! - [`availability`] - comprobador de disponibilidad de mesas
//! - [`booking`] - operaciones del titular (crear, editar, eliminar, checkin)
//! - [`partner`] - aprobación y rechazo por el gerente
//! - [`noshow`] - barrido periódico de no-shows

pub mod availability;
pub mod booking;
pub mod noshow;
pub mod partner;
