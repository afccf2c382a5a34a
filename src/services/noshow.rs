//! # Barrido de no-shows
//!
//! Tarea periódica que cancela las reservas confirmadas cuya ventana de
//! llegada venció sin checkin. El fallo de un registro se registra y no
//! interrumpe la pasada.

use chrono::{DateTime, Utc};
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::api::AppResult;
use crate::config::Config;
use crate::db::{EstadoReserva, ReservaRepo};

/// Una pasada del barrido: cancela cada reserva confirmada con
/// `inicio < ahora - margen`. Devuelve cuántas canceló. Una pasada repetida
/// no encuentra las ya canceladas, así que el barrido es idempotente.
pub async fn run_sweep<R>(reservas: &R, config: &Config, ahora: DateTime<Utc>) -> AppResult<u32>
where
    R: ReservaRepo + ?Sized,
{
    let limite = ahora - config.margen_checkin();
    let vencidas = reservas.confirmadas_antes_de(limite).await?;

    let mut canceladas = 0u32;
    for reserva in vencidas {
        // Se reevalúa sobre el registro leído: la consulta puede traer
        // reservas que otro proceso ya movió de estado.
        let Some(nuevo_estado) =
            reserva
                .estado
                .expirar_no_show(ahora, reserva.inicio_utc(), config.margen_checkin())
        else {
            continue;
        };

        match reservas
            .set_estado_if(reserva.numero, EstadoReserva::Confirmada, nuevo_estado)
            .await
        {
            Ok(Some(_)) => {
                tracing::info!(numero = reserva.numero, "Reserva cancelada por no-show");
                canceladas += 1;
            }
            Ok(None) => {
                tracing::debug!(
                    numero = reserva.numero,
                    "La reserva cambió de estado durante el barrido"
                );
            }
            Err(error) => {
                tracing::error!(
                    numero = reserva.numero,
                    error = %error,
                    "Fallo cancelando no-show; se continúa con el resto"
                );
            }
        }
    }

    Ok(canceladas)
}

/// Lanza el barrido periódico. Una única tarea ejecuta las pasadas en
/// secuencia, así que nunca hay dos barridos en curso a la vez.
pub fn spawn_sweeper<R>(reservas: R, config: Config) -> tokio::task::JoinHandle<()>
where
    R: ReservaRepo + 'static,
{
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(config.intervalo_noshow_seg));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            intervalo_seg = config.intervalo_noshow_seg,
            "Barrido de no-shows iniciado"
        );

        loop {
            ticker.tick().await;

            match run_sweep(&reservas, &config, Utc::now()).await {
                Ok(0) => {}
                Ok(canceladas) => {
                    tracing::info!(canceladas, "Barrido de no-shows completado");
                }
                Err(error) => {
                    tracing::error!(error = %error, "Fallo en el barrido de no-shows");
                }
            }
        }
    })
}
