//! # Configuración del motor de reservas
//!
//! Los valores se leen de variables de entorno (archivo `.env`) con valores
//! por defecto y se pasan explícitamente a los componentes que los usan.
//! Ningún componente consulta el entorno por su cuenta.

use chrono::Duration;
use std::env;
use std::str::FromStr;

/// Parámetros temporales del motor de reservas.
///
/// # Variables de entorno
///
/// - `RESERVA_UNIDAD_SLOT_MIN`: duración de cada franja en minutos (default: 30)
/// - `RESERVA_MARGEN_CHECKIN_MIN`: margen de llegada alrededor del inicio (default: 10)
/// - `RESERVA_INTERVALO_NOSHOW_SEG`: intervalo del barrido de no-shows (default: 300)
#[derive(Debug, Clone)]
pub struct Config {
    /// Duración de cada franja de reserva, en minutos. El inicio de toda
    /// reserva debe caer en un múltiplo de este valor.
    pub unidad_slot_min: i64,
    /// Margen del checkin alrededor del inicio de la reserva, en minutos.
    pub margen_checkin_min: i64,
    /// Segundos entre pasadas del barrido de no-shows.
    pub intervalo_noshow_seg: u64,
}

impl Config {
    pub fn from_env() -> Config {
        Config {
            unidad_slot_min: env_or("RESERVA_UNIDAD_SLOT_MIN", 30),
            margen_checkin_min: env_or("RESERVA_MARGEN_CHECKIN_MIN", 10),
            intervalo_noshow_seg: env_or("RESERVA_INTERVALO_NOSHOW_SEG", 300),
        }
    }

    /// Duración de una franja de reserva.
    pub fn unidad_slot(&self) -> Duration {
        Duration::minutes(self.unidad_slot_min)
    }

    /// Ventana de llegada: `[inicio - margen, inicio + margen]`.
    pub fn margen_checkin(&self) -> Duration {
        Duration::minutes(self.margen_checkin_min)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            unidad_slot_min: 30,
            margen_checkin_min: 10,
            intervalo_noshow_seg: 300,
        }
    }
}

fn env_or<T: FromStr>(nombre: &str, defecto: T) -> T {
    env::var(nombre)
        .ok()
        .and_then(|valor| valor.parse().ok())
        .unwrap_or(defecto)
}
