//! # Motor de Reservas Server
//!
//! Servidor del motor de reservas de mesas construido con Rust, Actix Web y
//! MongoDB.
//!
//! ## Configuración
//!
//! El servidor se configura mediante variables de entorno (archivo `.env`):
//!
//! ```env
//! # Base de datos MongoDB
//! MONGODB_URI=mongodb://localhost:27017
//! MONGODB_DATABASE=motor_reservas
//!
//! # Servidor
//! BIND_ADDRESS=0.0.0.0:8080
//!
//! # Motor de reservas
//! RESERVA_UNIDAD_SLOT_MIN=30
//! RESERVA_MARGEN_CHECKIN_MIN=10
//! RESERVA_INTERVALO_NOSHOW_SEG=300
//!
//! # Logging
//! RUST_LOG=debug,mongodb=info
//! ```

use actix_web::{middleware::Logger, web, App, HttpServer};
use std::env;

use motor_reservas::config::Config;
use motor_reservas::services::noshow;
use motor_reservas::{api, db};

/// Arranca el servidor
///
/// 1. Carga variables de entorno desde `.env`
/// 2. Configura el sistema de logging con tracing
/// 3. Establece conexión con MongoDB y crea los índices
/// 4. Lanza el barrido periódico de no-shows
/// 5. Inicia el servidor HTTP con las rutas de la API
///
/// # Errores
///
/// Retorna `std::io::Error` si no se puede conectar a MongoDB, si fallan
/// los índices o si no se puede bindear al puerto especificado. Los índices
/// son fatales en el arranque: el parcial único de reservas confirmadas es
/// el que impide confirmadas solapadas bajo concurrencia.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    // Configurar sistema de logging con tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("motor_reservas=debug".parse().unwrap())
                .add_directive("mongodb=info".parse().unwrap()),
        )
        .init();

    tracing::info!("Iniciando Motor de Reservas Server con MongoDB...");

    let config = Config::from_env();
    tracing::info!(
        unidad_slot_min = config.unidad_slot_min,
        margen_checkin_min = config.margen_checkin_min,
        intervalo_noshow_seg = config.intervalo_noshow_seg,
        "Configuración del motor cargada"
    );

    // Inicializar conexión a MongoDB
    let mongo_repo = match db::MongoRepo::init().await {
        Ok(repo) => {
            tracing::info!("Conexión a MongoDB establecida exitosamente");

            if let Err(e) = repo.create_indexes().await {
                tracing::error!("Error creando índices: {}", e);
                return Err(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("Error de MongoDB: {}", e),
                ));
            }

            repo
        }
        Err(e) => {
            tracing::error!("Error conectando a MongoDB: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Error de MongoDB: {}", e),
            ));
        }
    };

    // Barrido periódico de no-shows
    noshow::spawn_sweeper(mongo_repo.clone(), config.clone());

    // Obtener dirección de bind desde variables de entorno
    let bind_address = env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    tracing::info!("Servidor iniciando en {}", bind_address);

    let config = web::Data::new(config);

    // Crear y configurar el servidor HTTP
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(mongo_repo.clone()))
            .app_data(config.clone())
            .wrap(Logger::default())
            .configure(api::init_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
