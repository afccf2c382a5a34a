//! # Módulo API
//!
//! Rutas y controladores de la API REST.
//!
//! ## Módulos principales
//!
//! - [`reservation`] - Operaciones del titular (crear, consultar, editar, eliminar, checkin)
//! - [`partner`] - Aprobación y rechazo por el gerente, listado del restaurante
//! - [`errors`] - Manejo de errores de la aplicación
//!
//! La autenticación ocurre aguas arriba: la pasarela valida la sesión y
//! propaga la identidad en la cabecera `X-Usuario-Id`. Este servicio confía
//! en ese identificador para la titularidad y los permisos de gerente.

pub mod errors;
pub mod partner;
pub mod reservation;

// Re-exportar tipos comunes para facilitar su uso
pub use errors::{AppError, AppResult, ErrorLogExt, ErrorResponse};

use actix_web::{web, HttpRequest};

/// Cabecera con la identidad autenticada, inyectada por la pasarela
const CABECERA_USUARIO: &str = "x-usuario-id";

/// Extrae la identidad autenticada de la petición
///
/// # Errores
/// - `Unauthorized`: si falta la cabecera, es ilegible o viene vacía
pub(crate) fn usuario_autenticado(req: &HttpRequest) -> AppResult<String> {
    let valor = req
        .headers()
        .get(CABECERA_USUARIO)
        .ok_or_else(|| AppError::Unauthorized("Falta la cabecera X-Usuario-Id".to_string()))?;

    let id = valor
        .to_str()
        .map_err(|_| AppError::Unauthorized("Cabecera X-Usuario-Id ilegible".to_string()))?;

    if id.trim().is_empty() {
        return Err(AppError::Unauthorized(
            "Cabecera X-Usuario-Id vacía".to_string(),
        ));
    }

    Ok(id.to_string())
}

/// Configura todas las rutas de la API
///
/// ## Rutas configuradas
///
/// - `/reservations/*` - Ver [`reservation::routes`]
/// - `/restaurants/{id}/reservations/*` - Ver [`partner::routes`]
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    reservation::routes(cfg);
    partner::routes(cfg);
}
