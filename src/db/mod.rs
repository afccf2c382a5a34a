pub mod models;
pub mod mongodb;
pub mod repository;

pub use models::{EstadoReserva, Mesa, Reserva, Restaurant, SlotValidado};
pub use mongodb::MongoRepo;
pub use repository::{CatalogoRepo, FiltroReservas, ReservaRepo};
