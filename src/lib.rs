//! # Motor de reservas de mesas
//!
//! Núcleo de disponibilidad y ciclo de vida de reservas: decide si una
//! franja puede reservarse, gobierna las transiciones de estado
//! (pendiente → confirmada/cancelada → completada), impone la ventana de
//! llegada del checkin y recupera periódicamente las franjas abandonadas
//! por no-shows.
//!
//! ## Arquitectura
//!
//! ```text
//! API REST (Actix Web)
//!     ↓ servicios (booking / partner / noshow)
//!     ↓ contratos de persistencia (ReservaRepo / CatalogoRepo)
//! MongoDB
//! ```
//!
//! La identidad del usuario llega resuelta desde la pasarela (cabecera
//! `X-Usuario-Id`); el alta de restaurantes y mesas ocurre en otro sistema
//! y aquí solo se leen.

pub mod api;
pub mod config;
pub mod db;
pub mod services;
